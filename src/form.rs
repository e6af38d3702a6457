//! A keyboard driven form of named fields.
//!
//! Fields are either free text ([`TextField`]) or a choice among fixed
//! options ([`ChoiceField`]). `tab` moves between fields and `enter` submits,
//! emitting a [`SubmitMsg`]; the owner reads the values through
//! [`Model::data`] and usually calls [`Model::reset`] afterwards.
//!
//! ```rust
//! use countdown_widgets::form::Model;
//!
//! let form = Model::new()
//!     .with_text("delay", "Delay (ms)", true)
//!     .with_choice("state", "State", &["fulfilled", "rejected"]);
//!
//! let data = form.data();
//! assert_eq!(data.get("delay"), Some(""));
//! assert_eq!(data.get("state"), None);
//! ```

use crate::key::{self, Binding};
use crate::Component;
use bubbletea_rs::{Cmd, KeyMsg, Msg};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Sent when the form is submitted.
#[derive(Debug, Clone)]
pub struct SubmitMsg {
    /// Identifier of the submitted form.
    pub id: i64,
}

/// Single-line text input.
#[derive(Debug, Clone)]
pub struct TextField {
    /// Name under which the value appears in [`FormData`].
    pub name: String,
    /// Label shown before the input.
    pub label: String,
    /// Accept only ASCII digits.
    pub numeric: bool,
    value: String,
}

/// One option out of a fixed set, unset until chosen.
#[derive(Debug, Clone)]
pub struct ChoiceField {
    /// Name under which the value appears in [`FormData`].
    pub name: String,
    /// Label shown before the options.
    pub label: String,
    options: Vec<String>,
    selected: Option<usize>,
}

/// A form field.
#[derive(Debug, Clone)]
pub enum Field {
    /// Free text.
    Text(TextField),
    /// Fixed options.
    Choice(ChoiceField),
}

impl Field {
    fn name(&self) -> &str {
        match self {
            Field::Text(f) => &f.name,
            Field::Choice(f) => &f.name,
        }
    }

    fn value(&self) -> Option<&str> {
        match self {
            Field::Text(f) => Some(&f.value),
            Field::Choice(f) => f.selected.map(|i| f.options[i].as_str()),
        }
    }

    fn reset(&mut self) {
        match self {
            Field::Text(f) => f.value.clear(),
            Field::Choice(f) => f.selected = None,
        }
    }
}

/// Values of a submitted form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    /// The value of the field called `name`. Unset choices and unknown names
    /// are `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Key bindings of the form.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Submits the form.
    pub submit: Binding,
    /// Focuses the next field.
    pub next_field: Binding,
    /// Focuses the previous field.
    pub prev_field: Binding,
    /// Selects the next option of a choice.
    pub next_option: Binding,
    /// Selects the previous option of a choice.
    pub prev_option: Binding,
    /// Deletes the last character of a text field.
    pub delete: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            submit: Binding::new(vec![KeyCode::Enter]).with_help("enter", "submit"),
            next_field: Binding::new(vec![KeyCode::Tab, KeyCode::Down])
                .with_help("tab", "next field"),
            prev_field: Binding::new(vec![KeyCode::BackTab, KeyCode::Up])
                .with_help("shift+tab", "prev field"),
            next_option: Binding::new(vec![KeyCode::Right, KeyCode::Char(' ')])
                .with_help("→/space", "next option"),
            prev_option: Binding::new(vec![KeyCode::Left]).with_help("←", "prev option"),
            delete: Binding::new(vec![KeyCode::Backspace]).with_help("backspace", "delete"),
        }
    }
}

impl key::KeyMap for KeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.submit, &self.next_field, &self.next_option]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![
            vec![&self.submit, &self.next_field, &self.prev_field],
            vec![&self.next_option, &self.prev_option, &self.delete],
        ]
    }
}

/// A form of named fields.
#[derive(Debug, Clone)]
pub struct Model {
    id: i64,
    fields: Vec<Field>,
    focus_index: usize,
    focus: bool,
    /// Key bindings.
    pub keymap: KeyMap,
    /// Style of the focused field's label.
    pub focused_style: Style,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self {
            id: next_id(),
            fields: Vec::new(),
            focus_index: 0,
            focus: false,
            keymap: KeyMap::default(),
            focused_style: Style::new().bold(true),
        }
    }

    /// Appends a text field.
    pub fn with_text(mut self, name: &str, label: &str, numeric: bool) -> Self {
        self.fields.push(Field::Text(TextField {
            name: name.to_string(),
            label: label.to_string(),
            numeric,
            value: String::new(),
        }));
        self
    }

    /// Appends a choice field with `options`, initially unset.
    pub fn with_choice(mut self, name: &str, label: &str, options: &[&str]) -> Self {
        self.fields.push(Field::Choice(ChoiceField {
            name: name.to_string(),
            label: label.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            selected: None,
        }));
        self
    }

    /// Identifier carried by this form's [`SubmitMsg`].
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The fields, in order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Sets the value of the field called `name`. Text fields take `value`
    /// as is; choice fields select the matching option, or unset on no match.
    /// Returns `false` if no field has that name.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| f.name() == name) else {
            return false;
        };
        match field {
            Field::Text(f) => f.value = value.to_string(),
            Field::Choice(f) => f.selected = f.options.iter().position(|o| o == value),
        }
        true
    }

    /// Snapshot of the current values.
    pub fn data(&self) -> FormData {
        FormData {
            entries: self
                .fields
                .iter()
                .filter_map(|f| f.value().map(|v| (f.name().to_string(), v.to_string())))
                .collect(),
        }
    }

    /// Restores every field to its initial, empty state and focuses the
    /// first field.
    pub fn reset(&mut self) {
        self.fields.iter_mut().for_each(Field::reset);
        self.focus_index = 0;
    }

    fn submit(&self) -> Cmd {
        let msg = SubmitMsg { id: self.id };
        Box::pin(async move { Some(Box::new(msg) as Msg) })
    }

    /// Handles key input while focused. Returns a command emitting
    /// [`SubmitMsg`] on submit.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if !self.focus || self.fields.is_empty() {
            return None;
        }
        let key_msg = msg.downcast_ref::<KeyMsg>()?;

        if self.keymap.submit.matches(key_msg) {
            return Some(self.submit());
        }
        if self.keymap.next_field.matches(key_msg) {
            self.focus_index = (self.focus_index + 1) % self.fields.len();
            return None;
        }
        if self.keymap.prev_field.matches(key_msg) {
            self.focus_index = (self.focus_index + self.fields.len() - 1) % self.fields.len();
            return None;
        }

        match &mut self.fields[self.focus_index] {
            Field::Text(f) => {
                if self.keymap.delete.matches(key_msg) {
                    f.value.pop();
                } else if let KeyCode::Char(c) = key_msg.key {
                    if !f.numeric || c.is_ascii_digit() {
                        f.value.push(c);
                    }
                }
            }
            Field::Choice(f) => {
                let len = f.options.len();
                if len == 0 {
                    return None;
                }
                if self.keymap.next_option.matches(key_msg) {
                    f.selected = Some(f.selected.map_or(0, |i| (i + 1) % len));
                } else if self.keymap.prev_option.matches(key_msg) {
                    f.selected = Some(f.selected.map_or(len - 1, |i| (i + len - 1) % len));
                }
            }
        }
        None
    }

    /// Renders one line per field.
    pub fn view(&self) -> String {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let active = self.focus && i == self.focus_index;
                let (label, body) = match field {
                    Field::Text(f) => (&f.label, format!("[{}]", f.value)),
                    Field::Choice(f) => (
                        &f.label,
                        f.options
                            .iter()
                            .enumerate()
                            .map(|(j, o)| {
                                let mark = if f.selected == Some(j) { "(•)" } else { "( )" };
                                format!("{} {}", mark, o)
                            })
                            .collect::<Vec<_>>()
                            .join("  "),
                    ),
                };
                let label = if active {
                    self.focused_style.clone().render(label)
                } else {
                    label.clone()
                };
                format!("{}: {}", label, body)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Component for Model {
    fn focus(&mut self) -> Option<Cmd> {
        self.focus = true;
        None
    }

    fn blur(&mut self) {
        self.focus = false;
    }

    fn focused(&self) -> bool {
        self.focus
    }
}
