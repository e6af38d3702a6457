//! The page surface widgets attach to.
//!
//! A [`Document`] holds the elements of a page keyed by selector. Widgets
//! locate their element once, at initialization, and take ownership of it.
//!
//! ```rust
//! use countdown_widgets::countdown::Markup;
//! use countdown_widgets::document::{Document, Error};
//! use countdown_widgets::form;
//!
//! let mut doc = Document::new()
//!     .mount("div.timer-wrapper", Markup::default())
//!     .mount("form", form::Model::new());
//!
//! assert!(doc.take_timer("div.timer-wrapper").is_ok());
//! assert!(matches!(doc.take_form("div.timer-wrapper"), Err(Error::NotFound { .. })));
//! assert!(matches!(doc.take_timer("form"), Err(Error::Mismatch { .. })));
//! assert!(doc.take_form("form").is_ok());
//! ```

use crate::countdown::Markup;
use crate::form;
use thiserror::Error;

/// Lookup failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Nothing is mounted at the selector.
    #[error("no element matches selector \"{selector}\"")]
    NotFound {
        /// The selector looked up.
        selector: String,
    },
    /// The element at the selector is of another kind. It stays mounted.
    #[error("element at \"{selector}\" is not a {expected}")]
    Mismatch {
        /// The selector looked up.
        selector: String,
        /// The kind that was asked for.
        expected: &'static str,
    },
}

/// Anything that can be mounted in a [`Document`].
#[derive(Debug, Clone)]
pub enum Element {
    /// A countdown container.
    Timer(Markup),
    /// A form.
    Form(form::Model),
}

impl From<Markup> for Element {
    fn from(markup: Markup) -> Self {
        Element::Timer(markup)
    }
}

impl From<form::Model> for Element {
    fn from(form: form::Model) -> Self {
        Element::Form(form)
    }
}

/// Elements of a page, keyed by selector.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<(String, Element)>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `element` at `selector`, replacing any element already there.
    pub fn mount(mut self, selector: impl Into<String>, element: impl Into<Element>) -> Self {
        let selector = selector.into();
        self.elements.retain(|(s, _)| *s != selector);
        self.elements.push((selector, element.into()));
        self
    }

    /// Whether an element is mounted at `selector`.
    pub fn contains(&self, selector: &str) -> bool {
        self.elements.iter().any(|(s, _)| s == selector)
    }

    fn position(&self, selector: &str) -> Result<usize, Error> {
        self.elements
            .iter()
            .position(|(s, _)| s == selector)
            .ok_or_else(|| Error::NotFound {
                selector: selector.to_string(),
            })
    }

    fn mismatch(selector: &str, expected: &'static str) -> Error {
        Error::Mismatch {
            selector: selector.to_string(),
            expected,
        }
    }

    /// Removes and returns the countdown container at `selector`.
    pub fn take_timer(&mut self, selector: &str) -> Result<Markup, Error> {
        let pos = self.position(selector)?;
        match self.elements.remove(pos) {
            (_, Element::Timer(markup)) => Ok(markup),
            other => {
                self.elements.insert(pos, other);
                Err(Self::mismatch(selector, "timer container"))
            }
        }
    }

    /// Removes and returns the form at `selector`.
    pub fn take_form(&mut self, selector: &str) -> Result<form::Model, Error> {
        let pos = self.position(selector)?;
        match self.elements.remove(pos) {
            (_, Element::Form(form)) => Ok(form),
            other => {
                self.elements.insert(pos, other);
                Err(Self::mismatch(selector, "form"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_selector() {
        let mut doc = Document::new();
        assert_eq!(
            doc.take_form("form").unwrap_err(),
            Error::NotFound {
                selector: "form".to_string()
            }
        );
    }

    #[test]
    fn test_mismatch_keeps_element_mounted() {
        let mut doc = Document::new().mount("form", form::Model::new());
        let err = doc.take_timer("form").unwrap_err();
        assert_eq!(err.to_string(), "element at \"form\" is not a timer container");
        assert!(doc.contains("form"));
    }

    #[test]
    fn test_take_removes_element() {
        let mut doc = Document::new().mount("div.timer-wrapper", Markup::default());
        assert!(doc.take_timer("div.timer-wrapper").is_ok());
        assert!(!doc.contains("div.timer-wrapper"));
        assert!(doc.take_timer("div.timer-wrapper").is_err());
    }

    #[test]
    fn test_mount_replaces() {
        let first = form::Model::new();
        let second = form::Model::new();
        let second_id = second.id();
        let mut doc = Document::new().mount("form", first).mount("form", second);
        assert_eq!(doc.take_form("form").map(|f| f.id()), Ok(second_id));
    }
}
