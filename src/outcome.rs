//! Form that settles a delayed outcome and reports it as a toast.
//!
//! Every submission reads a `delay` in milliseconds and a desired `state`
//! from the form, resets the form, and schedules a task that succeeds after
//! the delay when the state is `fulfilled` and fails otherwise. The result
//! is shown as a green or red toast. Submissions are independent: several
//! may be pending at once and each settles on its own timer.
//!
//! ```rust
//! use countdown_widgets::outcome::settle;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! assert_eq!(settle(true, 0).await.as_deref(), Ok("Fulfilled promise in 0ms"));
//! assert_eq!(
//!     settle(false, 0).await.unwrap_err().to_string(),
//!     "Rejected promise in 0ms"
//! );
//! # }
//! ```

use crate::document::Document;
use crate::form::{self, SubmitMsg};
use crate::toast::{Color, Notifier, Position, Toast};
use crate::Component;
use bubbletea_rs::{Cmd, Msg};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// `state` value that makes an outcome succeed.
pub const FULFILLED: &str = "fulfilled";

/// Text of the notification raised when `delay` is not a number.
pub const DELAY_REQUIRED: &str = "Please enter a delay in milliseconds";

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// The failure branch of a delayed outcome.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Rejected promise in {delay_ms}ms")]
pub struct Rejected {
    /// The delay the outcome waited.
    pub delay_ms: u64,
}

/// Waits `delay_ms` milliseconds, then succeeds with
/// `"Fulfilled promise in {delay_ms}ms"` if `should_resolve`, or fails with
/// [`Rejected`] otherwise.
pub async fn settle(should_resolve: bool, delay_ms: u64) -> Result<String, Rejected> {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    if should_resolve {
        Ok(format!("Fulfilled promise in {}ms", delay_ms))
    } else {
        Err(Rejected { delay_ms })
    }
}

/// Parses the leading decimal digits of `input`, ignoring leading
/// whitespace. Returns `None` if there are none.
///
/// ```rust
/// use countdown_widgets::outcome::parse_delay;
///
/// assert_eq!(parse_delay("500"), Some(500));
/// assert_eq!(parse_delay(" 12ms"), Some(12));
/// assert_eq!(parse_delay(""), None);
/// assert_eq!(parse_delay("-5"), None);
/// ```
pub fn parse_delay(input: &str) -> Option<u64> {
    let trimmed = input.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// Delivered when a scheduled outcome settles.
#[derive(Debug, Clone)]
pub struct SettledMsg {
    /// The form widget that scheduled the outcome.
    pub id: i64,
    /// The outcome.
    pub result: Result<String, Rejected>,
}

/// A form whose submissions settle after a delay.
///
/// A widget whose form was not found at initialization is inert.
pub struct DelayedOutcomeForm {
    id: i64,
    notifier: Arc<dyn Notifier>,
    form: Option<form::Model>,
}

impl DelayedOutcomeForm {
    /// Attaches to the form at `selector`. If there is none, logs an error
    /// and returns an inert widget.
    ///
    /// # Arguments
    ///
    /// * `doc` - The page; the form is moved out of it.
    /// * `selector` - Selector of a form with `delay` and `state` fields.
    /// * `notifier` - Receives outcome and validation notifications.
    pub fn initialize(doc: &mut Document, selector: &str, notifier: Arc<dyn Notifier>) -> Self {
        let form = match doc.take_form(selector) {
            Ok(form) => Some(form),
            Err(err) => {
                tracing::error!(error = %err, "Form with selector \"{}\" not found.", selector);
                None
            }
        };
        Self {
            id: next_id(),
            notifier,
            form,
        }
    }

    /// Unique identifier carried by this widget's [`SettledMsg`].
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the widget found its form.
    pub fn is_attached(&self) -> bool {
        self.form.is_some()
    }

    /// The attached form.
    pub fn form(&self) -> Option<&form::Model> {
        self.form.as_ref()
    }

    /// The attached form, for filling fields programmatically.
    pub fn form_mut(&mut self) -> Option<&mut form::Model> {
        self.form.as_mut()
    }

    /// Handles one submission: reads `delay` and `state`, resets the form
    /// and returns the command that settles the outcome. The reset happens
    /// before the command runs.
    ///
    /// When `delay` has no leading digits an error notification is raised
    /// and `None` is returned. Any `state` other than `fulfilled`, including
    /// an unset one, makes the outcome fail.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use countdown_widgets::document::Document;
    /// use countdown_widgets::form;
    /// use countdown_widgets::outcome::{DelayedOutcomeForm, SettledMsg};
    /// use countdown_widgets::toast::Toasts;
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let form = form::Model::new()
    ///     .with_text("delay", "Delay (ms)", true)
    ///     .with_choice("state", "State", &["fulfilled", "rejected"]);
    /// let mut doc = Document::new().mount("form", form);
    /// let toasts = Toasts::default();
    /// let mut widget = DelayedOutcomeForm::initialize(&mut doc, "form", Arc::new(toasts.clone()));
    ///
    /// let fields = widget.form_mut().unwrap();
    /// fields.set_value("delay", "10");
    /// fields.set_value("state", "fulfilled");
    ///
    /// let cmd = widget.submit().unwrap();
    /// assert_eq!(widget.form().unwrap().data().get("delay"), Some(""));
    ///
    /// let msg = cmd.await.unwrap();
    /// let settled = msg.downcast_ref::<SettledMsg>().unwrap();
    /// assert_eq!(settled.result.as_deref(), Ok("Fulfilled promise in 10ms"));
    /// # }
    /// ```
    pub fn submit(&mut self) -> Option<Cmd> {
        let form = self.form.as_mut()?;
        let data = form.data();
        form.reset();

        let Some(delay_ms) = data.get("delay").and_then(parse_delay) else {
            tracing::warn!(delay = ?data.get("delay"), "submission without a valid delay");
            self.notifier.show(Toast::error(DELAY_REQUIRED));
            return None;
        };
        let should_resolve = data.get("state") == Some(FULFILLED);
        tracing::debug!(delay_ms, should_resolve, "scheduling outcome");

        let id = self.id;
        let cmd: Cmd = Box::pin(async move {
            let result = settle(should_resolve, delay_ms).await;
            Some(Box::new(SettledMsg { id, result }) as Msg)
        });
        Some(cmd)
    }

    fn report(&self, result: &Result<String, Rejected>) {
        let toast = match result {
            Ok(message) => Toast::new(message.as_str())
                .with_title("✅")
                .with_color(Color::Green),
            Err(rejected) => Toast::new(rejected.to_string())
                .with_title("❌")
                .with_color(Color::Red),
        };
        self.notifier.show(toast.with_position(Position::TopRight));
    }

    /// Handles submissions of the attached form, settled outcomes and key
    /// input for the form.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let form_id = self.form.as_ref()?.id();

        if let Some(submit) = msg.downcast_ref::<SubmitMsg>() {
            if submit.id == form_id {
                return self.submit();
            }
            return None;
        }

        if let Some(settled) = msg.downcast_ref::<SettledMsg>() {
            if settled.id == self.id {
                tracing::debug!(ok = settled.result.is_ok(), "outcome settled");
                self.report(&settled.result);
            }
            return None;
        }

        self.form.as_mut()?.update(msg)
    }

    /// Renders the form.
    pub fn view(&self) -> String {
        self.form.as_ref().map(form::Model::view).unwrap_or_default()
    }
}

impl Component for DelayedOutcomeForm {
    fn focus(&mut self) -> Option<Cmd> {
        self.form.as_mut().and_then(|form| form.focus())
    }

    fn blur(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.blur();
        }
    }

    fn focused(&self) -> bool {
        self.form.as_ref().is_some_and(|form| form.focused())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toast::Toasts;
    use tokio::sync::mpsc;

    fn promise_form() -> form::Model {
        form::Model::new()
            .with_text("delay", "Delay (ms)", true)
            .with_choice("state", "State", &["fulfilled", "rejected"])
    }

    fn widget() -> (DelayedOutcomeForm, Toasts) {
        let toasts = Toasts::default();
        let mut doc = Document::new().mount("form", promise_form());
        let widget = DelayedOutcomeForm::initialize(&mut doc, "form", Arc::new(toasts.clone()));
        (widget, toasts)
    }

    fn fill(widget: &mut DelayedOutcomeForm, delay: &str, state: &str) {
        let form = widget.form_mut().unwrap();
        form.set_value("delay", delay);
        form.set_value("state", state);
    }

    async fn run(widget: &mut DelayedOutcomeForm, cmd: Cmd) {
        let msg = cmd.await.expect("settled message");
        assert!(widget.update(msg).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_for_delay() {
        let start = tokio::time::Instant::now();
        let result = settle(true, 500).await;
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(result, Ok("Fulfilled promise in 500ms".to_string()));

        let err = settle(false, 250).await.unwrap_err();
        assert_eq!(err, Rejected { delay_ms: 250 });
        assert_eq!(err.to_string(), "Rejected promise in 250ms");
    }

    #[test]
    fn test_missing_form_is_inert() {
        let mut doc = Document::new();
        let mut widget = DelayedOutcomeForm::initialize(&mut doc, "form", Arc::new(Toasts::default()));
        assert!(!widget.is_attached());
        assert!(widget.submit().is_none());
        assert!(widget.update(Box::new(SubmitMsg { id: 1 })).is_none());
        assert_eq!(widget.view(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fulfilled_shows_green_toast() {
        let (mut widget, toasts) = widget();
        fill(&mut widget, "500", "fulfilled");
        let cmd = widget.submit().expect("scheduled");
        assert!(toasts.is_empty());

        run(&mut widget, cmd).await;
        let shown = toasts.snapshot();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].message, "Fulfilled promise in 500ms");
        assert_eq!(shown[0].title.as_deref(), Some("✅"));
        assert_eq!(shown[0].color, Color::Green);
        assert_eq!(shown[0].position, Position::TopRight);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_fulfilled_states_reject() {
        for state in ["rejected", "anything", ""] {
            let (mut widget, toasts) = widget();
            fill(&mut widget, "300", state);
            let cmd = widget.submit().expect("scheduled");
            run(&mut widget, cmd).await;

            let shown = toasts.snapshot();
            assert_eq!(shown.len(), 1);
            assert_eq!(shown[0].message, "Rejected promise in 300ms");
            assert_eq!(shown[0].title.as_deref(), Some("❌"));
            assert_eq!(shown[0].color, Color::Red);
            assert_eq!(shown[0].position, Position::TopRight);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_happens_before_outcome() {
        let (mut widget, toasts) = widget();
        fill(&mut widget, "1000", "fulfilled");
        let cmd = widget.submit().expect("scheduled");

        let data = widget.form().unwrap().data();
        assert_eq!(data.get("delay"), Some(""));
        assert_eq!(data.get("state"), None);
        assert!(toasts.is_empty());

        run(&mut widget, cmd).await;
        assert_eq!(toasts.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_delay_notifies_and_schedules_nothing() {
        let (mut widget, toasts) = widget();
        fill(&mut widget, "", "fulfilled");
        assert!(widget.submit().is_none());
        let shown = toasts.snapshot();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].message, DELAY_REQUIRED);
        assert_eq!(widget.form().unwrap().data().get("state"), None);
    }

    #[tokio::test]
    async fn test_submit_msg_from_own_form() {
        let (mut widget, _toasts) = widget();
        let form_id = widget.form().unwrap().id();
        fill(&mut widget, "0", "fulfilled");

        assert!(widget.update(Box::new(SubmitMsg { id: form_id + 1000 })).is_none());
        assert_eq!(widget.form().unwrap().data().get("delay"), Some("0"));

        assert!(widget.update(Box::new(SubmitMsg { id: form_id })).is_some());
        assert_eq!(widget.form().unwrap().data().get("delay"), Some(""));
    }

    #[tokio::test]
    async fn test_settled_from_other_widget_ignored() {
        let (mut widget, toasts) = widget();
        widget.update(Box::new(SettledMsg {
            id: widget.id() + 1000,
            result: Ok("Fulfilled promise in 1ms".to_string()),
        }));
        assert!(toasts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_submissions_settle_in_completion_order() {
        let (mut widget, toasts) = widget();

        fill(&mut widget, "2000", "fulfilled");
        let slow = widget.submit().expect("slow scheduled");
        fill(&mut widget, "500", "rejected");
        let fast = widget.submit().expect("fast scheduled");

        let (tx, mut rx) = mpsc::unbounded_channel();
        for cmd in [slow, fast] {
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(msg) = cmd.await {
                    let _ = tx.send(msg);
                }
            });
        }
        drop(tx);

        while let Some(msg) = rx.recv().await {
            widget.update(msg);
        }

        let messages: Vec<_> = toasts.snapshot().into_iter().map(|t| t.message).collect();
        assert_eq!(
            messages,
            vec!["Rejected promise in 500ms", "Fulfilled promise in 2000ms"]
        );
    }
}
