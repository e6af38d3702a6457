//! Countdown timer component for Bubble Tea applications.
//!
//! The countdown lets the user pick a future date and time, then counts the
//! remaining days, hours, minutes and seconds down to zero, once per tick.
//! It owns a [`datepicker`](crate::datepicker) input, a start [`Button`] and
//! four display [`Slot`]s, all located in a [`Document`] at initialization.
//!
//! # Lifecycle
//!
//! The timer is always in one [`Phase`]:
//!
//! - `Idle`: no valid target. The start button is disabled.
//! - `Armed`: a future target was picked. The start button is enabled.
//! - `Running`: a tick is live and the picker and start button are disabled.
//!   When the remaining time reaches zero the tick stops, the picker is
//!   enabled again and the timer returns to `Idle`.
//!
//! # Basic Usage
//!
//! ```rust
//! use countdown_widgets::clock::ManualClock;
//! use countdown_widgets::countdown::{CountdownTimer, Markup, Options, Phase};
//! use countdown_widgets::document::Document;
//! use countdown_widgets::toast::Toasts;
//! use chrono::{Local, TimeDelta};
//! use std::sync::Arc;
//!
//! let clock = ManualClock::new(Local::now());
//! let toasts = Toasts::default();
//! let mut doc = Document::new().mount("div.timer-wrapper", Markup::default());
//!
//! let mut timer = CountdownTimer::initialize(
//!     &mut doc,
//!     "div.timer-wrapper",
//!     Arc::new(clock.clone()),
//!     Arc::new(toasts.clone()),
//!     Options::default(),
//! );
//! assert!(!timer.start_enabled());
//!
//! let target = Local::now() + TimeDelta::hours(2);
//! timer.choose(Some(target));
//! assert_eq!(timer.phase(), Phase::Armed { target });
//! assert!(timer.start_enabled());
//!
//! let tick = timer.start();
//! assert!(tick.is_some());
//! assert!(timer.is_running());
//! ```
//!
//! # bubbletea-rs Integration
//!
//! ```rust
//! use bubbletea_rs::{Cmd, Model as BubbleTeaModel, Msg};
//! use countdown_widgets::clock::SystemClock;
//! use countdown_widgets::countdown::{CountdownTimer, FinishedMsg, Markup, Options};
//! use countdown_widgets::document::Document;
//! use countdown_widgets::toast::Toasts;
//! use countdown_widgets::Component;
//! use std::sync::Arc;
//!
//! struct App {
//!     timer: CountdownTimer,
//! }
//!
//! impl BubbleTeaModel for App {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let mut doc = Document::new().mount("div.timer-wrapper", Markup::default());
//!         let mut timer = CountdownTimer::initialize(
//!             &mut doc,
//!             "div.timer-wrapper",
//!             Arc::new(SystemClock),
//!             Arc::new(Toasts::default()),
//!             Options::default(),
//!         );
//!         let cmd = timer.focus();
//!         (Self { timer }, cmd)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         if let Some(done) = msg.downcast_ref::<FinishedMsg>() {
//!             if done.id == self.timer.id() {
//!                 // Countdown reached zero.
//!             }
//!         }
//!         self.timer.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.timer.view()
//!     }
//! }
//! ```

use crate::clock::Clock;
use crate::datepicker::{self, CloseMsg};
use crate::document::Document;
use crate::key::{self, Binding};
use crate::remaining::convert_ms;
use crate::toast::{Color, Notifier, Toast};
use crate::Component;
use bubbletea_rs::{tick as bubbletea_tick, Cmd, KeyMsg, Msg};
use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Text of the notification raised when the chosen date is not in the future.
pub const FUTURE_DATE_REQUIRED: &str = "Please choose a date in the future";

// Internal ID management for countdown instances
static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Start control of a countdown.
#[derive(Debug, Clone)]
pub struct Button {
    /// Text shown on the button.
    pub label: String,
    disabled: bool,
    focus: bool,
}

impl Button {
    /// Creates an enabled button.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: false,
            focus: false,
        }
    }

    /// Whether clicks are ignored.
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Enables or disables the button.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Renders the button; faint while disabled, reversed while focused.
    pub fn view(&self) -> String {
        let text = format!("[ {} ]", self.label);
        let style = if self.disabled {
            Style::new().faint(true)
        } else if self.focus {
            Style::new().reverse(true)
        } else {
            Style::new()
        };
        style.render(&text)
    }
}

impl Component for Button {
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

/// A display slot receiving one zero-padded unit of the remaining time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Data attribute marking which unit the slot shows, e.g. `data-days`.
    pub marker: &'static str,
    /// Label rendered under the value.
    pub label: String,
    /// Current text.
    pub text: String,
}

impl Slot {
    fn new(marker: &'static str, label: &str) -> Self {
        Self {
            marker,
            label: label.to_string(),
            text: "00".to_string(),
        }
    }
}

/// The elements of a countdown container.
#[derive(Debug, Clone)]
pub struct Markup {
    /// Button marked `data-start`.
    pub start: Button,
    /// Slot marked `data-days`.
    pub days: Slot,
    /// Slot marked `data-hours`.
    pub hours: Slot,
    /// Slot marked `data-minutes`.
    pub minutes: Slot,
    /// Slot marked `data-seconds`.
    pub seconds: Slot,
}

impl Default for Markup {
    fn default() -> Self {
        Self {
            start: Button::new("Start"),
            days: Slot::new("data-days", "Days"),
            hours: Slot::new("data-hours", "Hours"),
            minutes: Slot::new("data-minutes", "Minutes"),
            seconds: Slot::new("data-seconds", "Seconds"),
        }
    }
}

impl Markup {
    fn slots_mut(&mut self) -> [&mut Slot; 4] {
        [
            &mut self.days,
            &mut self.hours,
            &mut self.minutes,
            &mut self.seconds,
        ]
    }

    fn slots(&self) -> [&Slot; 4] {
        [&self.days, &self.hours, &self.minutes, &self.seconds]
    }

    fn write(&mut self, ms: u64) {
        let values = convert_ms(ms).padded();
        for (slot, text) in self.slots_mut().into_iter().zip(values) {
            slot.text = text;
        }
    }
}

/// Phase of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No valid target; start disabled.
    Idle,
    /// A future target is set; start enabled.
    Armed {
        /// The chosen instant.
        target: DateTime<Local>,
    },
    /// Counting down.
    Running {
        /// The instant counted down to.
        target: DateTime<Local>,
        /// Tag of the live tick. Ticks carrying another tag are stale.
        tag: i64,
    },
}

/// Countdown configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Time between ticks.
    pub interval: Duration,
    /// Picker configuration. A `None` default date is replaced with the
    /// clock's current instant.
    pub picker: datepicker::Options,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            picker: datepicker::Options::default(),
        }
    }
}

/// Clicks the start control of the countdown with the matching ID.
#[derive(Debug, Clone)]
pub struct StartMsg {
    /// Target countdown.
    pub id: i64,
}

/// Periodic tick of a running countdown.
#[derive(Debug, Clone)]
pub struct TickMsg {
    /// The countdown that scheduled the tick.
    pub id: i64,
    tag: i64,
}

/// Sent once when a running countdown reaches zero.
#[derive(Debug, Clone)]
pub struct FinishedMsg {
    /// The countdown that finished.
    pub id: i64,
}

/// Key bindings of the countdown.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Presses the focused start button.
    pub press: Binding,
    /// Starts from anywhere in the widget.
    pub start: Binding,
    /// Moves focus between the picker and the start button.
    pub switch_focus: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            press: Binding::new(vec![KeyCode::Enter, KeyCode::Char(' ')])
                .with_help("enter", "press"),
            start: Binding::new(vec![KeyCode::Char('s')]).with_help("s", "start"),
            switch_focus: Binding::new(vec![KeyCode::Tab, KeyCode::BackTab])
                .with_help("tab", "picker/start"),
        }
    }
}

impl key::KeyMap for KeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.start, &self.switch_focus]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![vec![&self.press, &self.start, &self.switch_focus]]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Picker,
    Start,
}

struct Widget {
    markup: Markup,
    picker: datepicker::Model,
    phase: Phase,
    tag: i64,
    interval: Duration,
    focus: Focus,
}

/// A countdown to a user-chosen instant.
///
/// A countdown whose container was not found at initialization is inert: it
/// renders nothing and ignores every message.
pub struct CountdownTimer {
    id: i64,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    widget: Option<Widget>,
    focused: bool,
    /// Key bindings.
    pub keymap: KeyMap,
}

impl CountdownTimer {
    /// Attaches a countdown to the container at `selector`.
    ///
    /// The picker is created with `options.picker` (its default date set to
    /// `clock.now()` when unset) and the start button is disabled until a
    /// future date is picked. If no container is mounted at `selector` the
    /// error is logged and the returned countdown is inert.
    ///
    /// # Arguments
    ///
    /// * `doc` - The page; the container is moved out of it.
    /// * `selector` - Selector of the container, usually `div.timer-wrapper`.
    /// * `clock` - Source of the current instant.
    /// * `notifier` - Receives validation errors.
    /// * `options` - Tick interval and picker configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use countdown_widgets::clock::SystemClock;
    /// use countdown_widgets::countdown::{CountdownTimer, Options};
    /// use countdown_widgets::document::Document;
    /// use countdown_widgets::toast::Toasts;
    /// use std::sync::Arc;
    ///
    /// let mut empty = Document::new();
    /// let timer = CountdownTimer::initialize(
    ///     &mut empty,
    ///     "div.timer-wrapper",
    ///     Arc::new(SystemClock),
    ///     Arc::new(Toasts::default()),
    ///     Options::default(),
    /// );
    /// assert!(!timer.is_attached());
    /// assert_eq!(timer.view(), "");
    /// ```
    pub fn initialize(
        doc: &mut Document,
        selector: &str,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        options: Options,
    ) -> Self {
        let id = next_id();
        let widget = match doc.take_timer(selector) {
            Ok(mut markup) => {
                let mut picker_options = options.picker;
                if picker_options.default_date.is_none() {
                    picker_options.default_date = Some(clock.now());
                }
                markup.start.set_disabled(true);
                tracing::debug!(id, selector, "countdown attached");
                Some(Widget {
                    markup,
                    picker: datepicker::new(picker_options),
                    phase: Phase::Idle,
                    tag: 0,
                    interval: options.interval,
                    focus: Focus::Picker,
                })
            }
            Err(err) => {
                tracing::error!(selector, error = %err, "countdown container not found");
                None
            }
        };
        Self {
            id,
            clock,
            notifier,
            widget,
            focused: false,
            keymap: KeyMap::default(),
        }
    }

    /// Unique identifier of this countdown.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the countdown found its container.
    pub fn is_attached(&self) -> bool {
        self.widget.is_some()
    }

    /// The current phase. Inert countdowns are always `Idle`.
    pub fn phase(&self) -> Phase {
        self.widget.as_ref().map_or(Phase::Idle, |w| w.phase)
    }

    /// Whether a tick is live.
    pub fn is_running(&self) -> bool {
        matches!(self.phase(), Phase::Running { .. })
    }

    /// Whether the start button accepts clicks.
    pub fn start_enabled(&self) -> bool {
        self.widget
            .as_ref()
            .is_some_and(|w| !w.markup.start.disabled())
    }

    /// The attached picker.
    pub fn picker(&self) -> Option<&datepicker::Model> {
        self.widget.as_ref().map(|w| &w.picker)
    }

    /// Text of the days, hours, minutes and seconds slots.
    pub fn slots(&self) -> Option<[&str; 4]> {
        self.widget
            .as_ref()
            .map(|w| w.markup.slots().map(|s| s.text.as_str()))
    }

    /// Returns a command that clicks this countdown's start button.
    pub fn click_start(&self) -> Cmd {
        let id = self.id;
        Box::pin(async move { Some(Box::new(StartMsg { id }) as Msg) })
    }

    /// Validates the first date chosen in the picker.
    ///
    /// A date strictly after the current instant arms the countdown and
    /// enables the start button. Anything else raises an error notification
    /// and leaves the countdown `Idle`. Ignored while running.
    ///
    /// # Arguments
    ///
    /// * `selected` - The first selected date, or `None` when the picker was
    ///   closed without a selection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use countdown_widgets::clock::ManualClock;
    /// use countdown_widgets::countdown::{CountdownTimer, Markup, Options, Phase};
    /// use countdown_widgets::document::Document;
    /// use countdown_widgets::toast::Toasts;
    /// use chrono::{Local, TimeDelta};
    /// use std::sync::Arc;
    ///
    /// let now = Local::now();
    /// let toasts = Toasts::default();
    /// let mut doc = Document::new().mount("div.timer-wrapper", Markup::default());
    /// let mut timer = CountdownTimer::initialize(
    ///     &mut doc,
    ///     "div.timer-wrapper",
    ///     Arc::new(ManualClock::new(now)),
    ///     Arc::new(toasts.clone()),
    ///     Options::default(),
    /// );
    ///
    /// timer.choose(Some(now - TimeDelta::minutes(1)));
    /// assert_eq!(timer.phase(), Phase::Idle);
    /// assert_eq!(toasts.snapshot()[0].message, "Please choose a date in the future");
    ///
    /// let target = now + TimeDelta::minutes(1);
    /// timer.choose(Some(target));
    /// assert_eq!(timer.phase(), Phase::Armed { target });
    /// ```
    pub fn choose(&mut self, selected: Option<DateTime<Local>>) {
        let now = self.clock.now();
        let Some(w) = self.widget.as_mut() else {
            return;
        };
        if matches!(w.phase, Phase::Running { .. }) {
            return;
        }
        match selected {
            Some(target) if target > now => {
                tracing::debug!(id = self.id, %target, "countdown armed");
                w.phase = Phase::Armed { target };
                w.markup.start.set_disabled(false);
            }
            _ => {
                tracing::warn!(id = self.id, ?selected, "rejected countdown target");
                w.phase = Phase::Idle;
                w.markup.start.set_disabled(true);
                self.notifier.show(Toast::error(FUTURE_DATE_REQUIRED));
            }
        }
    }

    /// Starts counting down to the armed target.
    ///
    /// The first frame is rendered immediately, the picker and the start
    /// button are disabled, and the returned command delivers the first
    /// [`TickMsg`] after the configured interval.
    ///
    /// Returns `None` when nothing was started:
    ///
    /// - the countdown is `Idle` (the start control is disabled, so this is
    ///   a no-op without notification);
    /// - the countdown is already running;
    /// - the armed target is not in the future any more. An error
    ///   notification is raised and the countdown returns to `Idle` with the
    ///   picker enabled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use countdown_widgets::clock::ManualClock;
    /// use countdown_widgets::countdown::{CountdownTimer, Markup, Options};
    /// use countdown_widgets::document::Document;
    /// use countdown_widgets::toast::Toasts;
    /// use chrono::{Local, TimeDelta};
    /// use std::sync::Arc;
    ///
    /// let now = Local::now();
    /// let toasts = Toasts::default();
    /// let mut doc = Document::new().mount("div.timer-wrapper", Markup::default());
    /// let mut timer = CountdownTimer::initialize(
    ///     &mut doc,
    ///     "div.timer-wrapper",
    ///     Arc::new(ManualClock::new(now)),
    ///     Arc::new(toasts.clone()),
    ///     Options::default(),
    /// );
    ///
    /// // Nothing is armed yet.
    /// assert!(timer.start().is_none());
    /// assert!(toasts.is_empty());
    ///
    /// timer.choose(Some(now + TimeDelta::seconds(61)));
    /// assert!(timer.start().is_some());
    /// assert_eq!(timer.slots(), Some(["00", "00", "01", "01"]));
    /// ```
    pub fn start(&mut self) -> Option<Cmd> {
        let now = self.clock.now();
        let w = self.widget.as_mut()?;
        let target = match w.phase {
            Phase::Idle => return None,
            Phase::Running { .. } => {
                tracing::debug!(id = self.id, "countdown already running");
                return None;
            }
            Phase::Armed { target } => target,
        };

        let delta = (target - now).num_milliseconds();
        if delta <= 0 {
            tracing::warn!(id = self.id, "countdown target already passed");
            w.phase = Phase::Idle;
            w.markup.start.set_disabled(true);
            w.picker.set_disabled(false);
            self.notifier.show(
                Toast::new(FUTURE_DATE_REQUIRED)
                    .with_title("Error")
                    .with_color(Color::Red),
            );
            return None;
        }

        w.tag += 1;
        w.phase = Phase::Running { target, tag: w.tag };
        w.markup.start.set_disabled(true);
        w.picker.set_disabled(true);
        w.markup.write(delta.unsigned_abs());
        tracing::info!(id = self.id, %target, "countdown started");
        Some(tick(self.id, w.tag, w.interval))
    }

    fn on_tick(&mut self, msg: &TickMsg) -> Option<Cmd> {
        if msg.id != self.id {
            return None;
        }
        let now = self.clock.now();
        let w = self.widget.as_mut()?;
        let Phase::Running { target, tag } = w.phase else {
            return None;
        };
        // A tick from an earlier run must not drive the current one.
        if msg.tag != tag {
            return None;
        }

        let delta = (target - now).num_milliseconds();
        if delta <= 0 {
            w.phase = Phase::Idle;
            w.picker.set_disabled(false);
            w.markup.write(0);
            tracing::info!(id = self.id, "countdown finished");
            return Some(finished(self.id));
        }

        w.markup.write(delta.unsigned_abs());
        Some(tick(self.id, tag, w.interval))
    }

    fn switch_focus(&mut self) {
        let Some(w) = self.widget.as_mut() else {
            return;
        };
        w.focus = match w.focus {
            Focus::Picker => Focus::Start,
            Focus::Start => Focus::Picker,
        };
        if self.focused {
            apply_focus(w);
        }
    }

    /// Handles picker close, start clicks, ticks and key input.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let picker_id = self.widget.as_ref()?.picker.id();

        if let Some(close) = msg.downcast_ref::<CloseMsg>() {
            if close.id == picker_id {
                let first = close.selected_dates.first().copied();
                self.choose(first);
            }
            return None;
        }

        if let Some(start) = msg.downcast_ref::<StartMsg>() {
            if start.id == self.id && self.start_enabled() {
                return self.start();
            }
            return None;
        }

        if let Some(tick_msg) = msg.downcast_ref::<TickMsg>() {
            return self.on_tick(tick_msg);
        }

        if !self.focused {
            return None;
        }

        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            let w = self.widget.as_ref()?;
            let picker_open = w.picker.is_open();
            if !picker_open {
                if self.keymap.start.matches(key_msg)
                    || (w.focus == Focus::Start && self.keymap.press.matches(key_msg))
                {
                    return if self.start_enabled() {
                        Some(self.click_start())
                    } else {
                        None
                    };
                }
                if self.keymap.switch_focus.matches(key_msg) {
                    self.switch_focus();
                    return None;
                }
            }
            if w.focus == Focus::Start {
                return None;
            }
        }

        self.widget.as_mut()?.picker.update(msg)
    }

    /// Renders the picker, the start button and the four slots.
    pub fn view(&self) -> String {
        let Some(w) = self.widget.as_ref() else {
            return String::new();
        };
        let slots = w
            .markup
            .slots()
            .iter()
            .map(|s| format!("{} {}", s.text, s.label))
            .collect::<Vec<_>>()
            .join(" : ");
        format!(
            "{}  {}\n\n{}",
            w.picker.view(),
            w.markup.start.view(),
            slots
        )
    }
}

fn tick(id: i64, tag: i64, interval: Duration) -> Cmd {
    bubbletea_tick(interval, move |_| Box::new(TickMsg { id, tag }) as Msg)
}

fn finished(id: i64) -> Cmd {
    Box::pin(async move { Some(Box::new(FinishedMsg { id }) as Msg) })
}

fn apply_focus(w: &mut Widget) {
    match w.focus {
        Focus::Picker => {
            w.markup.start.blur();
            w.picker.focus();
        }
        Focus::Start => {
            w.picker.blur();
            w.markup.start.focus();
        }
    }
}

impl Component for CountdownTimer {
    fn focus(&mut self) -> Option<Cmd> {
        self.focused = true;
        if let Some(w) = self.widget.as_mut() {
            apply_focus(w);
        }
        None
    }

    fn blur(&mut self) {
        self.focused = false;
        if let Some(w) = self.widget.as_mut() {
            w.picker.blur();
            w.markup.start.blur();
        }
    }

    fn focused(&self) -> bool {
        self.focused
    }
}
