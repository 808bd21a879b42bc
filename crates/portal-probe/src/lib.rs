//! portal-probe: end-to-end checks for the Self Service Portal
//!
//! Page objects for the portal's landing page, Knowledge Base and search
//! results, driven through a small Playwright-style layer: strict locators
//! that auto-wait, polling `expect` assertions, and a [`PageDriver`] trait
//! with a Chromium implementation (feature `browser`) and an in-memory mock.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ SuiteRunner  │──►│ PortalFixture│──►│  ManagePage  │──►│ Page objects │
//! │ (scenarios)  │   │ (navigation) │   │ (lazy, memo) │   │ + chrome     │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                                                 │
//!                          ┌──────────────────────────────────────┘
//!                          ▼
//!                   ┌──────────────┐   ┌──────────────┐
//!                   │ Locator /    │──►│ PageDriver   │──► Chromium (CDP)
//!                   │ expect()     │   │              │──► MockDriver
//!                   └──────────────┘   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let page = Page::new(Arc::new(driver), Timeouts::default());
//! let manage = ManagePage::new(page, config.urls());
//! manage.knowledge_base_page().goto().await?;
//! manage.knowledge_base_page().verify_page_loaded().await?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
mod browser;
mod config;
mod driver;
mod fixture;
mod locator;
mod manage;
mod page_object;
mod reporter;
mod result;
mod runner;
mod scenario;
mod sort;
mod steps;
mod wait;

/// In-memory driver and the simulated portal it serves
pub mod mock;

/// Portal page objects
pub mod pages;

pub use assertion::{
    expect, expect_page, Expect, ExpectAssertion, LocatorCondition, PageAssertion, PageCondition,
    PageExpect,
};
pub use browser::Page;
#[cfg(feature = "browser")]
pub use browser::{ChromiumBrowser, ChromiumDriver};
pub use config::{
    BrowserSettings, PortalConfig, PortalUrls, Timeouts, DEFAULT_BASE_URL, ENV_BASE_URL,
    ENV_CHROMIUM_PATH, ENV_HEADLESS, KNOWLEDGE_BASE_PATH, SEARCH_RESULTS_PATH,
};
pub use driver::{ElementSnapshot, PageDriver, PageFactory};
pub use fixture::{NavigationStrategy, PortalFixture, DIRECT_STEP, VIA_HOME_MENU_STEP};
pub use locator::{
    normalize_whitespace, AriaRole, Locator, LocatorOptions, Selector, TextMatch,
};
pub use manage::ManagePage;
pub use page_object::{PageKind, PageObject, PortalPage};
pub use reporter::{ScenarioReport, SuiteReport, TestStatus};
pub use result::{PortalError, PortalResult};
pub use runner::{SuiteRunner, DEFAULT_SUITE_NAME};
pub use scenario::{
    catalogue, find as find_scenario, Scenario, ScenarioBody, ScenarioContext, ScenarioFilter,
    Tag, UNMATCHED_SEARCH_TERM, WORD_ARTICLE_TITLE, WORD_SEARCH_TERM,
};
pub use sort::{first_integer, is_sorted, SortDirection, SortOption};
pub use steps::{StepRecord, StepRecorder, StepStatus};
pub use wait::{
    poll, poll_until, LoadState, PollOutcome, Probe, WaitOptions, DEFAULT_EXPECT_TIMEOUT_MS,
    DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, NETWORK_IDLE_THRESHOLD_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::{expect, expect_page};
    pub use super::browser::Page;
    pub use super::config::{PortalConfig, PortalUrls, Timeouts};
    pub use super::driver::{PageDriver, PageFactory};
    pub use super::locator::{AriaRole, Locator, Selector, TextMatch};
    pub use super::manage::ManagePage;
    pub use super::page_object::{PageKind, PageObject, PortalPage};
    pub use super::pages::{HomePage, KnowledgeBasePage, NavigationChrome, SearchResultsPage};
    pub use super::result::{PortalError, PortalResult};
    pub use super::sort::{SortDirection, SortOption};
    pub use super::wait::LoadState;
}
