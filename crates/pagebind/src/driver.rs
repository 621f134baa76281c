//! Driver - Abstract Browser Automation Capability
//!
//! The engine never talks to a browser directly. Everything it needs from the
//! automation backend goes through the [`Driver`] trait, which keeps binding and
//! readiness logic independent of the transport (WebDriver, CDP, in-memory mock).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageLifecycle ─► ElementBinder ─► ElementProxyFactory       │
//! │        │                                 │                   │
//! │        ▼                                 ▼                   │
//! │  ReadinessWaiter ──────────────► LocatorResolver             │
//! │                                          │                   │
//! ├──────────────────────────────────────────┼───────────────────┤
//! │  Driver (find_all, is_displayed, execute_script, ...)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::By;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Script run by the default [`Driver::document_ready`] implementation
pub const DOCUMENT_READY_SCRIPT: &str = "return document.readyState == 'complete'";

/// Result type for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Faults reported by a driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The element handle refers to a node that has been detached
    #[error("stale element reference")]
    StaleElementReference,

    /// No element matched
    #[error("no such element: {locator}")]
    NoSuchElement {
        /// Rendered locator
        locator: String,
    },

    /// Script evaluation failed
    #[error("script error: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// The browser session failed
    #[error("session error: {message}")]
    Session {
        /// Error message
        message: String,
    },
}

impl DriverError {
    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

/// Opaque reference to a live DOM element, issued by a driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    /// Create a handle from a driver-specific element id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Driver-specific element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.id)
    }
}

/// DOM scope a locator is evaluated against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchContext {
    /// The whole document
    #[default]
    Document,
    /// Descendants of an already resolved element
    Element(ElementHandle),
}

impl SearchContext {
    /// Scope a search to the descendants of `element`
    #[must_use]
    pub fn within(element: ElementHandle) -> Self {
        Self::Element(element)
    }
}

impl fmt::Display for SearchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Element(handle) => write!(f, "{handle}"),
        }
    }
}

/// Argument passed to [`Driver::execute_script`] as `arguments[i]`
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    /// A DOM element
    Element(ElementHandle),
    /// A JSON value
    Value(serde_json::Value),
}

/// Browser automation capability consumed by the engine.
///
/// Implementations must be shareable between the page objects of one session;
/// the engine itself only calls a driver from the thread that owns the page.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Find every element matching `by` within `context`, in document order.
    /// Zero matches is `Ok(vec![])`, never an error.
    fn find_all(&self, context: &SearchContext, by: &By) -> DriverResult<Vec<ElementHandle>>;

    /// Whether the element is rendered and visible
    fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Execute a synchronous script with positional arguments
    fn execute_script(&self, script: &str, args: &[ScriptArg]) -> DriverResult<serde_json::Value>;

    /// Whether the document reports itself as fully loaded
    fn document_ready(&self) -> DriverResult<bool> {
        let value = self.execute_script(DOCUMENT_READY_SCRIPT, &[])?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Navigate the session to `url`
    fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Click the element
    fn click(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Type text into the element
    fn send_keys(&self, element: &ElementHandle, keys: &str) -> DriverResult<()>;

    /// Clear an editable element
    fn clear(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Rendered text of the element
    fn text(&self, element: &ElementHandle) -> DriverResult<String>;

    /// Attribute or property value
    fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>>;

    /// Whether a checkbox, radio or option is selected
    fn is_selected(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Lower-case tag name
    fn tag_name(&self, element: &ElementHandle) -> DriverResult<String>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    #[test]
    fn test_element_handle_display() {
        let handle = ElementHandle::new("42");
        assert_eq!(handle.id(), "42");
        assert_eq!(handle.to_string(), "element#42");
    }

    #[test]
    fn test_search_context_default_is_document() {
        assert_eq!(SearchContext::default(), SearchContext::Document);
        assert_eq!(SearchContext::Document.to_string(), "document");
        assert_eq!(
            SearchContext::within(ElementHandle::new("7")).to_string(),
            "element#7"
        );
    }

    #[test]
    fn test_document_ready_default_uses_script() {
        let driver = MockDriver::new();
        driver.queue_ready([false]);
        assert!(!driver.document_ready().unwrap());
        assert!(driver.document_ready().unwrap());
        assert_eq!(driver.scripts_containing("document.readyState"), 2);
    }

    #[test]
    fn test_driver_error_messages() {
        assert_eq!(
            DriverError::StaleElementReference.to_string(),
            "stale element reference"
        );
        assert_eq!(DriverError::script("x").to_string(), "script error: x");
        assert_eq!(DriverError::session("gone").to_string(), "session error: gone");
    }
}
