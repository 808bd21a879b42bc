//! Search Results page.

use std::time::Duration;

use crate::assertion::{expect, expect_page};
use crate::browser::Page;
use crate::config::SEARCH_RESULTS_PATH;
use crate::locator::{AriaRole, Locator, Selector, TextMatch};
use crate::page_object::{PageKind, PageObject, PortalPage};
use crate::pages::{NavigationChrome, ARTICLE_NUMBER_PATTERN};
use crate::result::PortalResult;

/// Message rendered when a search matches nothing
pub const NO_RESULTS_MESSAGE: &str = "There are no items to display.";

/// Document title of the results page
pub const SEARCH_RESULTS_TITLE: &str = "Search Results";

const URL_WAIT: Duration = Duration::from_secs(15);

/// Search Results page object
#[derive(Debug, Clone)]
pub struct SearchResultsPage {
    page: Page,
    chrome: NavigationChrome,
    heading: Locator,
    no_results_message: Locator,
    result_rows: Locator,
}

impl SearchResultsPage {
    /// Declare the page's locators; performs no I/O
    #[must_use]
    pub fn new(page: &Page) -> Self {
        Self {
            chrome: NavigationChrome::new(page),
            heading: page.locator(
                Selector::role(AriaRole::Heading)
                    .named(SEARCH_RESULTS_TITLE)
                    .level(4),
            ),
            no_results_message: page.get_by_text(TextMatch::exact(NO_RESULTS_MESSAGE)),
            result_rows: page
                .locator(Selector::role(AriaRole::Listitem))
                .filter_has_text(TextMatch::pattern(ARTICLE_NUMBER_PATTERN)),
            page: page.clone(),
        }
    }

    /// Result rows: list items carrying an article number
    #[must_use]
    pub const fn result_rows(&self) -> &Locator {
        &self.result_rows
    }

    /// URL, title and heading are in place
    pub async fn verify_page_loaded(&self) -> PortalResult<()> {
        let url_wait = URL_WAIT.min(self.page.timeouts().navigation());
        self.page
            .wait_for_url(&TextMatch::pattern(SEARCH_RESULTS_PATH), url_wait)
            .await?;
        expect_page(&self.page)
            .to_have_title(TextMatch::exact(SEARCH_RESULTS_TITLE))
            .await?;
        expect(&self.heading).to_be_visible().await
    }

    /// The search matched nothing
    pub async fn verify_no_results_state(&self) -> PortalResult<()> {
        expect_page(&self.page)
            .to_have_url(TextMatch::pattern(SEARCH_RESULTS_PATH))
            .await?;
        expect(&self.no_results_message).to_be_visible().await
    }

    /// Exact number of result rows
    pub async fn verify_article_count(&self, expected: usize) -> PortalResult<()> {
        expect(&self.result_rows).to_have_count(expected).await
    }

    /// A result row containing `title` is visible
    pub async fn verify_article_listed(&self, title: &str) -> PortalResult<()> {
        expect(&self.result_rows.filter_has_text(title).first())
            .to_be_visible()
            .await
    }

    /// Text of every result row
    pub async fn result_texts(&self) -> PortalResult<Vec<String>> {
        self.result_rows.all_text_contents().await
    }
}

impl PageObject for SearchResultsPage {
    fn kind(&self) -> PageKind {
        PageKind::SearchResults
    }

    fn url_pattern(&self) -> &str {
        SEARCH_RESULTS_PATH
    }
}

impl PortalPage for SearchResultsPage {
    fn chrome(&self) -> &NavigationChrome {
        &self.chrome
    }
}
