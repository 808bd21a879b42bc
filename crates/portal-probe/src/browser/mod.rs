//! Browser control.
//!
//! [`Page`] is the handle page objects hold: a shared [`PageDriver`] plus
//! the configured timeouts. When compiled with the `browser` feature, the
//! `cdp` module provides a real Chromium driver over the Chrome `DevTools`
//! Protocol via chromiumoxide.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::assertion::{expect_page, PageExpect};
use crate::config::Timeouts;
use crate::driver::PageDriver;
use crate::locator::{AriaRole, Locator, LocatorOptions, Selector, TextMatch};
use crate::result::PortalResult;
use crate::wait::{poll_until, LoadState, Probe, WaitOptions};

#[cfg(feature = "browser")]
mod cdp;

#[cfg(feature = "browser")]
pub use cdp::{ChromiumBrowser, ChromiumDriver};

/// A live page: the driver plus the timeouts its locators inherit
#[derive(Clone)]
pub struct Page {
    driver: Arc<dyn PageDriver>,
    timeouts: Timeouts,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Wrap a driver
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, timeouts: Timeouts) -> Self {
        Self { driver, timeouts }
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.driver)
    }

    /// Configured timeouts
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    fn locator_options(&self) -> LocatorOptions {
        LocatorOptions {
            timeout: self.timeouts.action(),
            expect_timeout: self.timeouts.expect(),
            poll_interval: self.timeouts.poll_interval(),
            strict: true,
        }
    }

    /// Locator for an arbitrary selector
    #[must_use]
    pub fn locator(&self, selector: Selector) -> Locator {
        Locator::new(self.driver(), selector, self.locator_options())
    }

    /// Role query narrowed by accessible name
    #[must_use]
    pub fn get_by_role(&self, role: AriaRole, name: impl Into<TextMatch>) -> Locator {
        self.locator(Selector::role(role).named(name))
    }

    /// Text query
    #[must_use]
    pub fn get_by_text(&self, text: impl Into<TextMatch>) -> Locator {
        self.locator(Selector::text(text))
    }

    /// Navigate and wait for the load event
    pub async fn goto(&self, url: &str) -> PortalResult<()> {
        tracing::debug!(url, "goto");
        self.driver.goto(url).await?;
        self.wait_for_load_state(LoadState::Load).await
    }

    /// Wait for a load state within the navigation timeout
    pub async fn wait_for_load_state(&self, state: LoadState) -> PortalResult<()> {
        self.driver
            .wait_for_load_state(state, self.timeouts.navigation())
            .await
    }

    /// Wait until the current URL matches
    pub async fn wait_for_url(&self, url: &TextMatch, timeout: Duration) -> PortalResult<()> {
        let options = WaitOptions::new(timeout, self.timeouts.poll_interval());
        poll_until(&format!("url {url}"), &options, || async {
            let current = self.driver.url().await?;
            Ok(if url.matches(&current) {
                Probe::Ready(())
            } else {
                Probe::Pending(current)
            })
        })
        .await
    }

    /// Current URL
    pub async fn url(&self) -> PortalResult<String> {
        self.driver.url().await
    }

    /// Document title
    pub async fn title(&self) -> PortalResult<String> {
        self.driver.title().await
    }

    /// PNG screenshot of the viewport
    pub async fn screenshot(&self) -> PortalResult<Vec<u8>> {
        self.driver.screenshot().await
    }

    /// Close the page
    pub async fn close(&self) -> PortalResult<()> {
        self.driver.close().await
    }

    /// Expectations on this page
    #[must_use]
    pub fn expect(&self) -> PageExpect {
        expect_page(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDocument, MockDriver, MockElement};

    fn driver() -> Arc<MockDriver> {
        Arc::new(MockDriver::new(|url| {
            let mut doc = MockDocument::new(format!("at {url}"));
            doc.push(MockElement::link("Next", format!("{url}next")));
            Some(doc)
        }))
    }

    #[tokio::test]
    async fn test_goto_waits_for_load() {
        let d = driver();
        let page = Page::new(d.clone(), Timeouts::uniform(50, 5));
        page.goto("https://t/").await.unwrap();
        assert_eq!(page.url().await.unwrap(), "https://t/");
        assert_eq!(page.title().await.unwrap(), "at https://t/");
        assert!(d.was_called("wait_for_load_state:load"));
    }

    #[tokio::test]
    async fn test_wait_for_url() {
        let page = Page::new(driver(), Timeouts::uniform(50, 5));
        page.goto("https://t/").await.unwrap();
        page.get_by_role(AriaRole::Link, "Next").click().await.unwrap();
        let timeout = Duration::from_millis(50);
        page.wait_for_url(&TextMatch::pattern("/next$"), timeout)
            .await
            .unwrap();
        let err = page
            .wait_for_url(&TextMatch::pattern("knowledgeBase"), timeout)
            .await
            .unwrap_err();
        assert!(err.is_assertion());
    }

    #[tokio::test]
    async fn test_locators_inherit_timeouts() {
        let page = Page::new(driver(), Timeouts::uniform(123, 7));
        let options = *page.get_by_text("x").options();
        assert_eq!(options.timeout.as_millis(), 123);
        assert_eq!(options.expect_timeout.as_millis(), 123);
        assert_eq!(options.poll_interval.as_millis(), 7);
        assert!(options.strict);
    }
}
