#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/countdown-widgets/")]

//! # countdown-widgets
//!
//! Terminal widgets for a small countdown page, built on
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs).
//!
//! ## Overview
//!
//! The crate provides two independent widgets that attach to elements of a
//! [`Document`](document::Document):
//!
//! - [`CountdownTimer`](countdown::CountdownTimer): pick a future date and
//!   time, press start, and watch the remaining days, hours, minutes and
//!   seconds count down to zero.
//! - [`DelayedOutcomeForm`](outcome::DelayedOutcomeForm): submit a delay and
//!   a desired state, and get a success or failure notification once the
//!   delay has elapsed.
//!
//! Both raise notifications through the [`Notifier`](toast::Notifier) trait.
//! The [`toast`] module provides a shared queue and a component that renders
//! it. Like the other components, each widget follows the Elm Architecture
//! with `update()` and `view()` methods.
//!
//! ## Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | `CountdownTimer` | Countdown to a picked instant |
//! | `DatePicker` | Date and time input |
//! | `DelayedOutcomeForm` | Form whose submissions settle after a delay |
//! | `Form` | Text and choice fields with submit |
//! | `ToastModel` | Stack of expiring notifications |
//!
//! ## Focus Management
//!
//! Interactive components implement the [`Component`] trait:
//!
//! ```rust
//! use countdown_widgets::prelude::*;
//! use bubbletea_rs::Cmd;
//!
//! fn handle_focus<T: Component>(component: &mut T) {
//!     let _cmd: Option<Cmd> = component.focus();
//!     assert!(component.focused());
//!     component.blur();
//!     assert!(!component.focused());
//! }
//!
//! let mut picker = DatePicker::default();
//! handle_focus(&mut picker);
//! ```
//!
//! ## Key Bindings
//!
//! ```rust
//! use countdown_widgets::key::{Binding, KeyMap};
//! use crossterm::event::{KeyCode, KeyModifiers};
//!
//! let start = Binding::new(vec![KeyCode::Char('s')]).with_help("s", "start");
//! let quit = Binding::new(vec![(KeyCode::Char('c'), KeyModifiers::CONTROL)])
//!     .with_help("ctrl+c", "quit");
//!
//! struct AppKeyMap {
//!     start: Binding,
//!     quit: Binding,
//! }
//!
//! impl KeyMap for AppKeyMap {
//!     fn short_help(&self) -> Vec<&Binding> {
//!         vec![&self.start, &self.quit]
//!     }
//!
//!     fn full_help(&self) -> Vec<Vec<&Binding>> {
//!         vec![vec![&self.start], vec![&self.quit]]
//!     }
//! }
//! ```

pub mod clock;
pub mod config;
pub mod countdown;
pub mod datepicker;
pub mod document;
pub mod form;
pub mod key;
pub mod outcome;
pub mod remaining;
pub mod toast;

use bubbletea_rs::Cmd;

/// Core trait for components that support focus management.
///
/// A focused component receives keyboard input and renders its active
/// state. A blurred one ignores keys.
///
/// ```rust
/// use countdown_widgets::prelude::*;
///
/// let mut form = Form::new().with_text("delay", "Delay", true);
/// assert!(!form.focused());
///
/// form.focus();
/// assert!(form.focused());
///
/// form.blur();
/// assert!(!form.focused());
/// ```
pub trait Component {
    /// Sets the component to focused state.
    ///
    /// May return a command for work that should start with focus.
    fn focus(&mut self) -> Option<Cmd>;

    /// Sets the component to blurred state.
    fn blur(&mut self);

    /// Returns the current focus state of the component.
    fn focused(&self) -> bool;
}

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use countdown::{CountdownTimer, FinishedMsg as CountdownFinishedMsg, Phase};
pub use datepicker::Model as DatePicker;
pub use document::{Document, Element};
pub use form::Model as Form;
pub use key::{matches, Binding, Help as KeyHelp, KeyMap, KeyPress};
pub use outcome::{DelayedOutcomeForm, Rejected};
pub use remaining::{convert_ms, Remaining};
pub use toast::{Model as ToastModel, Notifier, Toast, Toasts};

/// Prelude module for convenient imports.
///
/// ```rust
/// use countdown_widgets::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::countdown::{
        CountdownTimer, FinishedMsg as CountdownFinishedMsg, Markup as CountdownMarkup, Phase,
    };
    pub use crate::datepicker::{CloseMsg as DatePickerCloseMsg, Model as DatePicker};
    pub use crate::document::{Document, Element};
    pub use crate::form::{Model as Form, SubmitMsg as FormSubmitMsg};
    pub use crate::key::{matches, Binding, Help as KeyHelp, KeyMap, KeyPress};
    pub use crate::outcome::{DelayedOutcomeForm, Rejected, SettledMsg};
    pub use crate::toast::{Color as ToastColor, Model as ToastModel, Notifier, Position, Toast, Toasts};
    pub use crate::Component;
}
