//! Result and error types for pagebind.

use crate::driver::DriverError;
use thiserror::Error;

/// Result type for pagebind operations
pub type PageResult<T> = Result<T, PageError>;

/// Errors that can occur while binding, using or awaiting page objects
#[derive(Debug, Error)]
pub enum PageError {
    /// A single-element proxy resolved to zero matches
    #[error("Element '{name}' not found using {locator}")]
    ElementNotFound {
        /// Display name of the field
        name: String,
        /// Rendered locator
        locator: String,
    },

    /// A previously resolved element was detached from the document
    #[error("Element '{name}' is no longer attached to the document")]
    StaleElement {
        /// Display name of the field
        name: String,
    },

    /// A readiness condition did not hold in time
    #[error("Timed out after {elapsed_ms}ms waiting for '{field}' to be {condition}{}", cause_suffix(.cause))]
    WaitTimeout {
        /// Field that could not be satisfied
        field: String,
        /// Declared condition
        condition: String,
        /// Time spent waiting
        elapsed_ms: u64,
        /// Underlying fault, if the wait ended early
        cause: Option<String>,
    },

    /// A readiness mark was declared on a field shape that cannot honour it
    #[error("Mark {mark} is not supported on '{field}' ({category})")]
    UnsupportedMark {
        /// Field name
        field: String,
        /// Declared mark
        mark: String,
        /// Field category
        category: String,
    },

    /// A proxy was used before the page object was bound
    #[error("Element '{name}' has not been bound to a driver")]
    NotBound {
        /// Display name of the field
        name: String,
    },

    /// Script execution failed
    #[error("Script execution failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Driver session error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Invalid state error (lifecycle transition not allowed)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// A page object failed to become ready
    #[error("Page '{page}' failed to load: {source}")]
    PageLoadFailed {
        /// Page name
        page: String,
        /// First failing field or condition
        source: Box<PageError>,
    },

    /// The notification pool no longer accepts work
    #[error("Notification rejected: {message}")]
    NotificationRejected {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn cause_suffix(cause: &Option<String>) -> String {
    cause
        .as_ref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

impl PageError {
    /// Attach a field name to a driver fault
    #[must_use]
    pub fn from_driver(name: &str, err: DriverError) -> Self {
        match err {
            DriverError::StaleElementReference => Self::StaleElement {
                name: name.to_string(),
            },
            DriverError::NoSuchElement { locator } => Self::ElementNotFound {
                name: name.to_string(),
                locator,
            },
            DriverError::Script { message } => Self::Script { message },
            DriverError::Session { message } => Self::Driver { message },
        }
    }

    /// Whether this error is a transient staleness fault
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }

    /// Whether this error means nothing matched
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}
