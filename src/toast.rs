//! Toast notifications for Bubble Tea applications.
//!
//! A [`Toast`] is a short, transient message with an optional title, a color
//! and a screen position. Widgets raise toasts through the [`Notifier`]
//! capability; the cloneable [`Toasts`] handle implements it by queueing
//! entries, and the toast [`Model`] renders the queue and expires entries
//! once their timeout passes.
//!
//! # Basic Usage
//!
//! ```rust
//! use countdown_widgets::toast::{Color, Notifier, Position, Toast, Toasts};
//!
//! let toasts = Toasts::default();
//! toasts.show(
//!     Toast::new("Fulfilled promise in 500ms")
//!         .with_title("✅")
//!         .with_color(Color::Green)
//!         .with_position(Position::TopRight),
//! );
//!
//! let shown = toasts.snapshot();
//! assert_eq!(shown.len(), 1);
//! assert_eq!(shown[0].message, "Fulfilled promise in 500ms");
//! ```
//!
//! # bubbletea-rs Integration
//!
//! ```rust
//! use bubbletea_rs::{Cmd, Model as BubbleTeaModel, Msg};
//! use countdown_widgets::toast::{self, Toasts};
//!
//! struct App {
//!     toasts: toast::Model,
//! }
//!
//! impl BubbleTeaModel for App {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let toasts = toast::Model::new(Toasts::default());
//!         let cmd = toasts.init();
//!         (Self { toasts }, Some(cmd))
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.toasts.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.toasts.view()
//!     }
//! }
//! ```

use crate::key::{self, Binding};
use bubbletea_rs::{tick as bubbletea_tick, Cmd, KeyMsg, Msg};
use crossterm::event::{KeyCode, KeyModifiers};
use lipgloss_extras::lipgloss;
use lipgloss_extras::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_VISIBLE: usize = 5;
const EXPIRE_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_WIDTH: usize = 80;

/// Accent color of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// No accent.
    #[default]
    Default,
    /// Success.
    Green,
    /// Failure.
    Red,
    /// Warning.
    Yellow,
    /// Information.
    Blue,
}

impl Color {
    fn style(self) -> Style {
        match self {
            Color::Default => Style::new(),
            Color::Green => Style::new().foreground(lipgloss::Color::from("#04B575")),
            Color::Red => Style::new().foreground(lipgloss::Color::from("#FF5F87")),
            Color::Yellow => Style::new().foreground(lipgloss::Color::from("#FFD75F")),
            Color::Blue => Style::new().foreground(lipgloss::Color::from("#5FAFFF")),
        }
    }
}

/// Where on screen a toast is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// Top edge, right aligned.
    TopRight,
    /// Top edge, left aligned.
    TopLeft,
    /// Top edge, centered.
    TopCenter,
    /// Bottom edge, right aligned.
    #[default]
    BottomRight,
    /// Bottom edge, left aligned.
    BottomLeft,
    /// Bottom edge, centered.
    BottomCenter,
}

impl Position {
    fn is_top(self) -> bool {
        matches!(
            self,
            Position::TopRight | Position::TopLeft | Position::TopCenter
        )
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Optional title rendered before the message.
    pub title: Option<String>,
    /// Message text.
    pub message: String,
    /// Accent color.
    pub color: Color,
    /// Screen position.
    pub position: Position,
    /// How long the toast stays visible. `None` uses the queue default.
    pub timeout: Option<Duration>,
}

impl Toast {
    /// Creates an untitled toast with default color and position.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: None,
            message: message.into(),
            color: Color::Default,
            position: Position::default(),
            timeout: None,
        }
    }

    /// The error preset: an untitled red toast at the default position.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message).with_color(Color::Red)
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the accent color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the screen position.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Sets the display timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn text(&self) -> String {
        match &self.title {
            Some(title) => format!("{} {}", title, self.message),
            None => self.message.clone(),
        }
    }
}

/// The capability of showing a notification.
pub trait Notifier: Send + Sync {
    /// Queues `toast` for display.
    fn show(&self, toast: Toast);
}

#[derive(Debug)]
struct Entry {
    toast: Toast,
    expires_at: Instant,
}

#[derive(Debug)]
struct Queue {
    entries: Vec<Entry>,
    default_timeout: Duration,
    max_visible: usize,
}

/// Shared queue of visible toasts.
///
/// Clones refer to the same queue, so one handle can be given to every
/// widget that raises notifications and another to the toast [`Model`].
#[derive(Debug, Clone)]
pub struct Toasts {
    queue: Arc<Mutex<Queue>>,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_MAX_VISIBLE)
    }
}

impl Toasts {
    /// Creates a queue whose toasts last `default_timeout` unless they set
    /// their own, holding at most `max_visible` entries (at least one).
    pub fn new(default_timeout: Duration, max_visible: usize) -> Self {
        Self {
            queue: Arc::new(Mutex::new(Queue {
                entries: Vec::new(),
                default_timeout,
                max_visible: max_visible.max(1),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The visible toasts, oldest first.
    pub fn snapshot(&self) -> Vec<Toast> {
        self.lock().entries.iter().map(|e| e.toast.clone()).collect()
    }

    /// Number of visible toasts.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no toast is visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes the most recent toast, returning it.
    pub fn dismiss_newest(&self) -> Option<Toast> {
        self.lock().entries.pop().map(|e| e.toast)
    }

    /// Removes every toast whose timeout has passed at `now`. Returns how
    /// many were removed.
    pub fn expire(&self, now: Instant) -> usize {
        let mut queue = self.lock();
        let before = queue.entries.len();
        queue.entries.retain(|e| e.expires_at > now);
        before - queue.entries.len()
    }

    /// Removes all toasts.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl Notifier for Toasts {
    fn show(&self, toast: Toast) {
        tracing::debug!(message = %toast.message, color = ?toast.color, "toast");
        let mut queue = self.lock();
        let timeout = toast.timeout.unwrap_or(queue.default_timeout);
        queue.entries.push(Entry {
            toast,
            expires_at: Instant::now() + timeout,
        });
        let overflow = queue.entries.len().saturating_sub(queue.max_visible);
        queue.entries.drain(..overflow);
    }
}

/// Periodic message that expires old toasts.
#[derive(Debug, Clone)]
pub struct ExpireMsg;

/// Key bindings of the toast model.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Dismisses the newest toast.
    pub dismiss: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            dismiss: Binding::new(vec![(KeyCode::Char('x'), KeyModifiers::CONTROL)])
                .with_help("ctrl+x", "dismiss toast"),
        }
    }
}

impl key::KeyMap for KeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.dismiss]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![vec![&self.dismiss]]
    }
}

/// Renders a [`Toasts`] queue and expires its entries.
#[derive(Debug, Clone)]
pub struct Model {
    toasts: Toasts,
    /// Key bindings.
    pub keymap: KeyMap,
    width: usize,
}

impl Model {
    /// Creates a model rendering `toasts`.
    pub fn new(toasts: Toasts) -> Self {
        Self {
            toasts,
            keymap: KeyMap::default(),
            width: DEFAULT_WIDTH,
        }
    }

    /// A handle to the rendered queue.
    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    /// Starts the expiry tick.
    pub fn init(&self) -> Cmd {
        expire_tick()
    }

    /// Handles expiry ticks, dismissal keys and window resizes.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if msg.downcast_ref::<ExpireMsg>().is_some() {
            let removed = self.toasts.expire(Instant::now());
            if removed > 0 {
                tracing::trace!(removed, "expired toasts");
            }
            return Some(expire_tick());
        }

        if let Some(size) = msg.downcast_ref::<bubbletea_rs::WindowSizeMsg>() {
            self.width = size.width as usize;
            return None;
        }

        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            if self.keymap.dismiss.matches(key_msg) {
                self.toasts.dismiss_newest();
            }
        }
        None
    }

    /// Renders the top toasts followed by the bottom toasts, one per line,
    /// aligned according to their position.
    pub fn view(&self) -> String {
        let shown = self.toasts.snapshot();
        let (top, bottom): (Vec<_>, Vec<_>) = shown.iter().partition(|t| t.position.is_top());
        top.into_iter()
            .chain(bottom)
            .map(|t| self.render(t))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(&self, toast: &Toast) -> String {
        let text = toast.text();
        let free = self.width.saturating_sub(text.width());
        let indent = match toast.position {
            Position::TopRight | Position::BottomRight => free,
            Position::TopCenter | Position::BottomCenter => free / 2,
            Position::TopLeft | Position::BottomLeft => 0,
        };
        format!(
            "{}{}",
            " ".repeat(indent),
            toast.color.style().render(&text)
        )
    }
}

fn expire_tick() -> Cmd {
    bubbletea_tick(EXPIRE_INTERVAL, |_| Box::new(ExpireMsg) as Msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_preset() {
        let t = Toast::error("Please choose a date in the future");
        assert_eq!(t.color, Color::Red);
        assert_eq!(t.position, Position::BottomRight);
        assert!(t.title.is_none());
    }

    #[test]
    fn test_show_and_snapshot_share_queue() {
        let toasts = Toasts::default();
        let handle = toasts.clone();
        handle.show(Toast::new("one"));
        handle.show(Toast::new("two"));
        let shown = toasts.snapshot();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].message, "one");
        assert_eq!(shown[1].message, "two");
    }

    #[test]
    fn test_max_visible_drops_oldest() {
        let toasts = Toasts::new(DEFAULT_TIMEOUT, 2);
        toasts.show(Toast::new("a"));
        toasts.show(Toast::new("b"));
        toasts.show(Toast::new("c"));
        let messages: Vec<_> = toasts.snapshot().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn test_expire_respects_timeouts() {
        let toasts = Toasts::new(Duration::from_secs(10), 5);
        toasts.show(Toast::new("short").with_timeout(Duration::from_millis(10)));
        toasts.show(Toast::new("long"));

        let removed = toasts.expire(Instant::now() + Duration::from_secs(1));
        assert_eq!(removed, 1);
        assert_eq!(toasts.snapshot()[0].message, "long");

        let removed = toasts.expire(Instant::now() + Duration::from_secs(11));
        assert_eq!(removed, 1);
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_dismiss_key() {
        let toasts = Toasts::default();
        toasts.show(Toast::new("old"));
        toasts.show(Toast::new("new"));
        let mut model = Model::new(toasts.clone());

        // Plain esc and x belong to the picker and to text input.
        for code in [KeyCode::Esc, KeyCode::Char('x')] {
            model.update(Box::new(KeyMsg {
                key: code,
                modifiers: KeyModifiers::NONE,
            }));
        }
        assert_eq!(toasts.len(), 2);

        let cmd = model.update(Box::new(KeyMsg {
            key: KeyCode::Char('x'),
            modifiers: KeyModifiers::CONTROL,
        }));
        assert!(cmd.is_none());
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.snapshot()[0].message, "old");
    }

    #[test]
    fn test_expire_msg_reschedules() {
        let mut model = Model::new(Toasts::default());
        assert!(model.update(Box::new(ExpireMsg)).is_some());
    }

    #[test]
    fn test_view_places_top_first_and_aligns_right() {
        let toasts = Toasts::default();
        toasts.show(Toast::new("bottom").with_position(Position::BottomLeft));
        toasts.show(
            Toast::new("Rejected promise in 10ms")
                .with_title("❌")
                .with_position(Position::TopRight),
        );
        let model = Model::new(toasts);
        let view = model.view();
        let lines: Vec<_> = view.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("❌ Rejected promise in 10ms"));
        assert!(lines[0].starts_with(' '));
        assert!(lines[1].contains("bottom"));
    }
}
