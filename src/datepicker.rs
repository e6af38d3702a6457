//! Date and time picker component for Bubble Tea applications.
//!
//! The picker is an input showing a date (and optionally a clock time). When
//! focused and enabled it can be opened; while open, the arrow keys move
//! between the year, month, day, hour and minute fields and step the focused
//! field. Selecting or cancelling closes the picker and emits a [`CloseMsg`]
//! carrying the selected dates, which the owning widget validates.
//!
//! # Basic Usage
//!
//! ```rust
//! use countdown_widgets::datepicker::{new, Options};
//! use chrono::{Local, TimeZone};
//!
//! let default_date = Local.with_ymd_and_hms(2030, 1, 15, 9, 30, 0).unwrap();
//! let picker = new(Options {
//!     default_date: Some(default_date),
//!     ..Options::default()
//! });
//!
//! assert_eq!(picker.value(), default_date);
//! assert!(picker.selected_dates().is_empty());
//! assert_eq!(picker.view(), "2030-01-15 09:30");
//! ```
//!
//! # Handling Close
//!
//! ```rust
//! use bubbletea_rs::Msg;
//! use countdown_widgets::datepicker::{CloseMsg, Model};
//!
//! fn on_msg(picker: &Model, msg: &Msg) {
//!     if let Some(close) = msg.downcast_ref::<CloseMsg>() {
//!         if close.id == picker.id() {
//!             let _first = close.selected_dates.first();
//!         }
//!     }
//! }
//! ```

use crate::key::{self, Binding};
use crate::Component;
use bubbletea_rs::{Cmd, KeyMsg, Msg};
use chrono::{DateTime, Days, Local, Months, NaiveTime, TimeDelta, Timelike};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Picker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Whether hours and minutes can be picked.
    pub enable_time: bool,
    /// Display the clock in 24-hour format instead of AM/PM.
    pub time_24hr: bool,
    /// Initially shown value. `None` means the current instant.
    pub default_date: Option<DateTime<Local>>,
    /// Step applied to the minute field.
    pub minute_increment: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            enable_time: true,
            time_24hr: true,
            default_date: None,
            minute_increment: 1,
        }
    }
}

/// The field a stepping key acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Calendar year.
    Year,
    /// Month of the year.
    Month,
    /// Day of the month.
    Day,
    /// Hour of the day.
    Hour,
    /// Minute of the hour.
    Minute,
}

/// Sent when the picker closes, whether a date was selected or not.
#[derive(Debug, Clone)]
pub struct CloseMsg {
    /// Identifier of the picker that closed.
    pub id: i64,
    /// The selected dates, in selection order. Empty if nothing was ever
    /// selected.
    pub selected_dates: Vec<DateTime<Local>>,
}

/// Key bindings of the picker.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Opens a closed picker.
    pub open: Binding,
    /// Selects the shown value and closes.
    pub select: Binding,
    /// Closes without changing the selection.
    pub cancel: Binding,
    /// Moves to the next field.
    pub next_field: Binding,
    /// Moves to the previous field.
    pub prev_field: Binding,
    /// Steps the focused field up.
    pub increment: Binding,
    /// Steps the focused field down.
    pub decrement: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            open: Binding::new(vec![KeyCode::Enter, KeyCode::Char(' ')])
                .with_help("enter", "open picker"),
            select: Binding::new(vec![KeyCode::Enter]).with_help("enter", "select"),
            cancel: Binding::new(vec![KeyCode::Esc]).with_help("esc", "close"),
            next_field: Binding::new(vec![KeyCode::Right, KeyCode::Tab, KeyCode::Char('l')])
                .with_help("→", "next field"),
            prev_field: Binding::new(vec![KeyCode::Left, KeyCode::BackTab, KeyCode::Char('h')])
                .with_help("←", "prev field"),
            increment: Binding::new(vec![KeyCode::Up, KeyCode::Char('k')]).with_help("↑", "increase"),
            decrement: Binding::new(vec![KeyCode::Down, KeyCode::Char('j')])
                .with_help("↓", "decrease"),
        }
    }
}

impl key::KeyMap for KeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.select, &self.increment, &self.decrement, &self.cancel]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![
            vec![&self.open, &self.select, &self.cancel],
            vec![
                &self.next_field,
                &self.prev_field,
                &self.increment,
                &self.decrement,
            ],
        ]
    }
}

/// A date/time picker bound to one input.
#[derive(Debug, Clone)]
pub struct Model {
    id: i64,
    options: Options,
    value: DateTime<Local>,
    selected: Vec<DateTime<Local>>,
    field: Field,
    open: bool,
    disabled: bool,
    focus: bool,
    /// Key bindings.
    pub keymap: KeyMap,
    /// Style of the field being edited while open.
    pub active_style: Style,
    /// Style of the whole input while disabled.
    pub disabled_style: Style,
}

/// Creates a picker configured by `options`.
pub fn new(options: Options) -> Model {
    let value = truncate_seconds(options.default_date.unwrap_or_else(Local::now));
    Model {
        id: next_id(),
        options,
        value,
        selected: Vec::new(),
        field: Field::Day,
        open: false,
        disabled: false,
        focus: false,
        keymap: KeyMap::default(),
        active_style: Style::new().reverse(true),
        disabled_style: Style::new().faint(true),
    }
}

fn truncate_seconds(value: DateTime<Local>) -> DateTime<Local> {
    value
        .with_nanosecond(0)
        .and_then(|v| v.with_second(0))
        .unwrap_or(value)
}

impl Default for Model {
    fn default() -> Self {
        new(Options::default())
    }
}

impl Model {
    /// Identifier carried by this picker's [`CloseMsg`].
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The configuration.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The value currently shown.
    pub fn value(&self) -> DateTime<Local> {
        self.value
    }

    /// Sets the shown value.
    pub fn set_value(&mut self, value: DateTime<Local>) {
        self.value = truncate_seconds(value);
    }

    /// Dates selected so far, in selection order.
    pub fn selected_dates(&self) -> &[DateTime<Local>] {
        &self.selected
    }

    /// The field stepping keys act on.
    pub fn field(&self) -> Field {
        self.field
    }

    /// Whether the picker is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether the picker ignores input.
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Enables or disables the picker. Disabling closes it without emitting
    /// a [`CloseMsg`].
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.open = false;
        }
    }

    fn fields(&self) -> &'static [Field] {
        if self.options.enable_time {
            &[
                Field::Year,
                Field::Month,
                Field::Day,
                Field::Hour,
                Field::Minute,
            ]
        } else {
            &[Field::Year, Field::Month, Field::Day]
        }
    }

    fn move_field(&mut self, forward: bool) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.field).unwrap_or(0);
        let next = if forward {
            (pos + 1) % fields.len()
        } else {
            (pos + fields.len() - 1) % fields.len()
        };
        self.field = fields[next];
    }

    fn step(&mut self, up: bool) {
        let v = self.value;
        let minutes = TimeDelta::minutes(i64::from(self.options.minute_increment.max(1)));
        let stepped = match (self.field, up) {
            (Field::Year, true) => v.checked_add_months(Months::new(12)),
            (Field::Year, false) => v.checked_sub_months(Months::new(12)),
            (Field::Month, true) => v.checked_add_months(Months::new(1)),
            (Field::Month, false) => v.checked_sub_months(Months::new(1)),
            (Field::Day, true) => v.checked_add_days(Days::new(1)),
            (Field::Day, false) => v.checked_sub_days(Days::new(1)),
            (Field::Hour, true) => v.checked_add_signed(TimeDelta::hours(1)),
            (Field::Hour, false) => v.checked_sub_signed(TimeDelta::hours(1)),
            (Field::Minute, true) => v.checked_add_signed(minutes),
            (Field::Minute, false) => v.checked_sub_signed(minutes),
        };
        if let Some(value) = stepped {
            self.value = value;
        }
    }

    fn select_current(&mut self) {
        let value = if self.options.enable_time {
            self.value
        } else {
            self.value
                .date_naive()
                .and_time(NaiveTime::MIN)
                .and_local_timezone(Local)
                .earliest()
                .unwrap_or(self.value)
        };
        self.selected = vec![value];
    }

    fn close(&mut self) -> Cmd {
        self.open = false;
        let msg = CloseMsg {
            id: self.id,
            selected_dates: self.selected.clone(),
        };
        tracing::debug!(id = msg.id, selected = msg.selected_dates.len(), "picker closed");
        Box::pin(async move { Some(Box::new(msg) as Msg) })
    }

    /// Handles key input. Returns a command emitting [`CloseMsg`] when the
    /// picker closes.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if self.disabled || !self.focus {
            return None;
        }
        let key_msg = msg.downcast_ref::<KeyMsg>()?;

        if !self.open {
            if self.keymap.open.matches(key_msg) {
                self.open = true;
            }
            return None;
        }

        if self.keymap.select.matches(key_msg) {
            self.select_current();
            return Some(self.close());
        }
        if self.keymap.cancel.matches(key_msg) {
            return Some(self.close());
        }
        if self.keymap.next_field.matches(key_msg) {
            self.move_field(true);
        } else if self.keymap.prev_field.matches(key_msg) {
            self.move_field(false);
        } else if self.keymap.increment.matches(key_msg) {
            self.step(true);
        } else if self.keymap.decrement.matches(key_msg) {
            self.step(false);
        }
        None
    }

    fn segments(&self) -> Vec<(Option<Field>, String)> {
        let v = self.value;
        let mut out = vec![
            (Some(Field::Year), v.format("%Y").to_string()),
            (None, "-".to_string()),
            (Some(Field::Month), v.format("%m").to_string()),
            (None, "-".to_string()),
            (Some(Field::Day), v.format("%d").to_string()),
        ];
        if self.options.enable_time {
            let hour = if self.options.time_24hr {
                v.format("%H")
            } else {
                v.format("%I")
            };
            out.push((None, " ".to_string()));
            out.push((Some(Field::Hour), hour.to_string()));
            out.push((None, ":".to_string()));
            out.push((Some(Field::Minute), v.format("%M").to_string()));
            if !self.options.time_24hr {
                out.push((None, v.format(" %p").to_string()));
            }
        }
        out
    }

    /// Renders the shown value. While open, the focused field is highlighted.
    pub fn view(&self) -> String {
        let segments = self.segments();
        if self.disabled {
            let text: String = segments.into_iter().map(|(_, s)| s).collect();
            return self.disabled_style.clone().render(&text);
        }
        segments
            .into_iter()
            .map(|(field, text)| match field {
                Some(f) if self.open && f == self.field => self.active_style.clone().render(&text),
                _ => text,
            })
            .collect()
    }
}

impl Component for Model {
    fn focus(&mut self) -> Option<Cmd> {
        self.focus = true;
        None
    }

    fn blur(&mut self) {
        self.focus = false;
        self.open = false;
    }

    fn focused(&self) -> bool {
        self.focus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crossterm::event::KeyModifiers;

    fn date(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn press(code: KeyCode) -> Msg {
        Box::new(KeyMsg {
            key: code,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn picker_at(value: DateTime<Local>) -> Model {
        let mut p = new(Options {
            default_date: Some(value),
            ..Options::default()
        });
        p.focus();
        p
    }

    async fn close_msg(cmd: Cmd) -> CloseMsg {
        let msg = cmd.await.expect("close command yields a message");
        *msg.downcast::<CloseMsg>().expect("message is a CloseMsg")
    }

    #[test]
    fn test_defaults() {
        let opts = Options::default();
        assert!(opts.enable_time);
        assert!(opts.time_24hr);
        assert_eq!(opts.minute_increment, 1);
        assert!(opts.default_date.is_none());
    }

    #[test]
    fn test_default_value_drops_seconds() {
        let with_secs = Local.with_ymd_and_hms(2030, 5, 1, 10, 20, 45).unwrap();
        let p = picker_at(with_secs);
        assert_eq!(p.value(), date(2030, 5, 1, 10, 20));
    }

    #[test]
    fn test_unique_ids() {
        assert_ne!(Model::default().id(), Model::default().id());
    }

    #[test]
    fn test_ignores_input_unless_focused_and_enabled() {
        let mut p = new(Options::default());
        assert!(p.update(press(KeyCode::Enter)).is_none());
        assert!(!p.is_open());

        p.focus();
        p.set_disabled(true);
        assert!(p.update(press(KeyCode::Enter)).is_none());
        assert!(!p.is_open());
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut p = picker_at(date(2030, 1, 1, 0, 0));
        p.update(press(KeyCode::Enter));
        assert_eq!(p.field(), Field::Day);
        p.update(press(KeyCode::Right));
        assert_eq!(p.field(), Field::Hour);
        p.update(press(KeyCode::Right));
        p.update(press(KeyCode::Right));
        assert_eq!(p.field(), Field::Year);
        p.update(press(KeyCode::Left));
        assert_eq!(p.field(), Field::Minute);
    }

    #[test]
    fn test_stepping_fields() {
        let mut p = picker_at(date(2030, 1, 31, 23, 59));
        p.update(press(KeyCode::Enter));

        p.update(press(KeyCode::Up)); // day
        assert_eq!(p.value(), date(2030, 2, 1, 23, 59));

        p.update(press(KeyCode::Left)); // month
        p.update(press(KeyCode::Down));
        assert_eq!(p.value(), date(2030, 1, 1, 23, 59));

        p.update(press(KeyCode::Left)); // year
        p.update(press(KeyCode::Up));
        assert_eq!(p.value(), date(2031, 1, 1, 23, 59));
    }

    #[test]
    fn test_minute_increment() {
        let mut p = new(Options {
            default_date: Some(date(2030, 1, 1, 10, 0)),
            minute_increment: 15,
            ..Options::default()
        });
        p.focus();
        p.update(press(KeyCode::Enter));
        p.update(press(KeyCode::Left)); // Month
        p.update(press(KeyCode::Right)); // back to Day
        p.update(press(KeyCode::Right)); // Hour
        p.update(press(KeyCode::Right)); // Minute
        p.update(press(KeyCode::Up));
        assert_eq!(p.value(), date(2030, 1, 1, 10, 15));
        p.update(press(KeyCode::Down));
        p.update(press(KeyCode::Down));
        assert_eq!(p.value(), date(2030, 1, 1, 9, 45));
    }

    #[tokio::test]
    async fn test_select_emits_close_with_selection() {
        let mut p = picker_at(date(2030, 6, 1, 12, 0));
        p.update(press(KeyCode::Enter));
        p.update(press(KeyCode::Up));
        let cmd = p.update(press(KeyCode::Enter)).expect("select closes");
        assert!(!p.is_open());

        let close = close_msg(cmd).await;
        assert_eq!(close.id, p.id());
        assert_eq!(close.selected_dates, vec![date(2030, 6, 2, 12, 0)]);
        assert_eq!(p.selected_dates(), &[date(2030, 6, 2, 12, 0)]);
    }

    #[tokio::test]
    async fn test_cancel_keeps_previous_selection() {
        let mut p = picker_at(date(2030, 6, 1, 12, 0));
        p.update(press(KeyCode::Enter));
        let close = close_msg(p.update(press(KeyCode::Esc)).unwrap()).await;
        assert!(close.selected_dates.is_empty());

        p.update(press(KeyCode::Enter));
        p.update(press(KeyCode::Enter));
        p.update(press(KeyCode::Enter));
        p.update(press(KeyCode::Up));
        let close = close_msg(p.update(press(KeyCode::Esc)).unwrap()).await;
        assert_eq!(close.selected_dates, vec![date(2030, 6, 1, 12, 0)]);
    }

    #[tokio::test]
    async fn test_date_only_selects_midnight() {
        let mut p = new(Options {
            enable_time: false,
            default_date: Some(date(2030, 3, 4, 15, 30)),
            ..Options::default()
        });
        p.focus();
        assert_eq!(p.view(), "2030-03-04");
        p.update(press(KeyCode::Enter));
        let close = close_msg(p.update(press(KeyCode::Enter)).unwrap()).await;
        assert_eq!(close.selected_dates, vec![date(2030, 3, 4, 0, 0)]);
    }

    #[test]
    fn test_view_formats() {
        let p = picker_at(date(2030, 3, 4, 15, 5));
        assert_eq!(p.view(), "2030-03-04 15:05");

        let twelve = new(Options {
            time_24hr: false,
            default_date: Some(date(2030, 3, 4, 15, 5)),
            ..Options::default()
        });
        assert_eq!(twelve.view(), "2030-03-04 03:05 PM");
    }

    #[test]
    fn test_disable_closes() {
        let mut p = picker_at(date(2030, 3, 4, 15, 5));
        p.update(press(KeyCode::Enter));
        assert!(p.is_open());
        p.set_disabled(true);
        assert!(!p.is_open());
        assert!(p.disabled());
    }
}
