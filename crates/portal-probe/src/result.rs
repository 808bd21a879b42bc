//! Result and error types for portal-probe.

use thiserror::Error;

/// Result type for portal-probe operations
pub type PortalResult<T> = Result<T, PortalError>;

/// Errors that can occur while driving the portal
#[derive(Debug, Error)]
pub enum PortalError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// The driver rejected or failed a command
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// An interaction targeted a locator that never resolved
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector description
        selector: String,
    },

    /// An interaction targeted a locator that resolved to several elements
    #[error("Strict mode violation: {selector} resolved to {count} elements")]
    StrictModeViolation {
        /// Selector description
        selector: String,
        /// Number of matches
        count: usize,
    },

    /// Expected condition never became true
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A verification branch that has no implementation
    #[error("Not implemented: {what}")]
    NotImplemented {
        /// The unsupported branch
        what: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Fixture error (pre-navigation failed)
    #[error("Fixture error: {message}")]
    Fixture {
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

impl PortalError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a not-implemented error
    #[must_use]
    pub fn not_implemented(what: impl Into<String>) -> Self {
        Self::NotImplemented { what: what.into() }
    }

    /// Whether this failure is an expectation that did not hold
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = PortalError::Navigation {
            url: "https://portal/hd/".to_string(),
            message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("https://portal/hd/"));
        assert!(text.contains("ERR_NAME_NOT_RESOLVED"));
    }

    #[test]
    fn test_constructors() {
        assert!(PortalError::assertion("x").is_assertion());
        assert!(!PortalError::driver("x").is_assertion());
        assert_eq!(
            PortalError::not_implemented("sort by Newest").to_string(),
            "Not implemented: sort by Newest"
        );
    }

    #[test]
    fn test_strict_violation_message() {
        let err = PortalError::StrictModeViolation {
            selector: "role=button".to_string(),
            count: 3,
        };
        assert!(err.to_string().contains("3 elements"));
    }
}
