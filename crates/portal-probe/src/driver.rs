//! Abstract browser driver.
//!
//! Page objects never talk to a browser directly. They go through
//! [`PageDriver`], which resolves serialisable [`Selector`]s on the live
//! page and performs the few primitive actions the suite needs.
//!
//! # Implementations
//!
//! - `ChromiumDriver` - Chrome DevTools Protocol via chromiumoxide (`browser` feature)
//! - [`MockDriver`](crate::mock::MockDriver) - in-memory documents for unit testing

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::Selector;
use crate::result::PortalResult;
use crate::wait::LoadState;

/// Observable state of one matched element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Whitespace-normalised text content
    pub text: Option<String>,
    /// Rendered with a non-empty box and not hidden
    pub visible: bool,
    /// Current value for form controls, `None` otherwise
    pub value: Option<String>,
}

impl ElementSnapshot {
    /// Snapshot of a visible element with text
    #[must_use]
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            visible: true,
            value: None,
        }
    }
}

/// Abstract driver trait for browser automation
///
/// `index` arguments pick one element out of the selector's matches, in
/// document order.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL
    async fn goto(&self, url: &str) -> PortalResult<()>;

    /// Wait until the page reaches a load state
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> PortalResult<()>;

    /// Get current URL
    async fn url(&self) -> PortalResult<String>;

    /// Get document title
    async fn title(&self) -> PortalResult<String>;

    /// Snapshot every element matching the selector
    async fn query(&self, selector: &Selector) -> PortalResult<Vec<ElementSnapshot>>;

    /// Click one matched element
    async fn click(&self, selector: &Selector, index: usize) -> PortalResult<()>;

    /// Replace the value of one matched form control
    async fn fill(&self, selector: &Selector, index: usize, value: &str) -> PortalResult<()>;

    /// Capture the viewport as PNG bytes
    async fn screenshot(&self) -> PortalResult<Vec<u8>>;

    /// Close the page
    async fn close(&self) -> PortalResult<()>;
}

impl fmt::Debug for dyn PageDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn PageDriver")
    }
}

/// Source of fresh, isolated pages; one page per scenario
#[async_trait]
pub trait PageFactory: Send + Sync {
    /// Open a new page
    async fn open_page(&self) -> PortalResult<Arc<dyn PageDriver>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_snapshot() {
        let snapshot = ElementSnapshot::visible("Home");
        assert!(snapshot.visible);
        assert_eq!(snapshot.text.as_deref(), Some("Home"));
        assert!(snapshot.value.is_none());
    }

    #[test]
    fn test_snapshot_deserializes_from_resolver_json() {
        let snapshot: ElementSnapshot =
            serde_json::from_str(r#"{"text":"Search","visible":false,"value":""}"#)
                .unwrap_or_default();
        assert!(!snapshot.visible);
        assert_eq!(snapshot.value.as_deref(), Some(""));
    }
}
