//! Knowledge Base listing page.
//!
//! Article rows are list items carrying a `KB` number (`KB000123`); view
//! counts are the `N views` fragments inside those rows.

use std::ops::RangeInclusive;
use std::time::Duration;

use crate::assertion::expect;
use crate::browser::Page;
use crate::config::{PortalUrls, KNOWLEDGE_BASE_PATH};
use crate::locator::{AriaRole, Locator, Selector, TextMatch};
use crate::page_object::{PageKind, PageObject, PortalPage};
use crate::pages::NavigationChrome;
use crate::result::{PortalError, PortalResult};
use crate::sort::{first_integer, is_sorted, SortDirection, SortOption};
use crate::wait::{poll_until, LoadState, Probe};

/// Article numbers as rendered in each row
pub const ARTICLE_NUMBER_PATTERN: &str = r"KB\d{6}";

/// View-count fragments inside article rows
pub const VIEW_COUNT_PATTERN: &str = r"\d[\d,]*\s+views?\b";

/// Class of the primary (title) text inside an article row
pub const ARTICLE_TITLE_CSS: &str = ".MuiListItemText-primary";

/// Rows a freshly loaded listing shows
pub const DEFAULT_ARTICLE_RANGE: RangeInclusive<usize> = 1..=10;

/// Upper bound on the URL wait after navigation
const URL_WAIT: Duration = Duration::from_secs(15);

/// Knowledge Base page object
#[derive(Debug, Clone)]
pub struct KnowledgeBasePage {
    page: Page,
    chrome: NavigationChrome,
    urls: PortalUrls,
    page_heading: Locator,
    articles_heading: Locator,
    breadcrumb: Locator,
    breadcrumb_links: Locator,
    home_link: Locator,
    knowledge_base_link: Locator,
    all_articles_link: Locator,
    categories_tree: Locator,
    article_rows: Locator,
    view_counts: Locator,
    sort_dropdown: Locator,
    page_info: Locator,
    visible_count_info: Locator,
}

impl KnowledgeBasePage {
    /// Declare the page's locators; performs no I/O
    #[must_use]
    pub fn new(page: &Page, urls: &PortalUrls) -> Self {
        let breadcrumb = page.get_by_role(AriaRole::Navigation, "breadcrumb");
        let article_rows = page
            .locator(Selector::role(AriaRole::Listitem))
            .filter_has_text(TextMatch::pattern(ARTICLE_NUMBER_PATTERN));
        Self {
            chrome: NavigationChrome::new(page),
            urls: urls.clone(),
            page_heading: page.locator(
                Selector::role(AriaRole::Heading)
                    .named("Knowledge Base")
                    .level(4),
            ),
            articles_heading: page.locator(
                Selector::role(AriaRole::Heading)
                    .named("All Articles")
                    .level(5),
            ),
            breadcrumb_links: breadcrumb.locator(Selector::role(AriaRole::Link)),
            home_link: breadcrumb.get_by_role(AriaRole::Link, "Home"),
            knowledge_base_link: breadcrumb.get_by_role(AriaRole::Link, "Knowledge Base"),
            all_articles_link: breadcrumb.get_by_role(AriaRole::Link, "All Articles"),
            breadcrumb,
            categories_tree: page.locator(Selector::role(AriaRole::Tree)),
            view_counts: article_rows
                .locator(Selector::text(TextMatch::pattern_ignore_case(VIEW_COUNT_PATTERN))),
            article_rows,
            sort_dropdown: page.get_by_role(AriaRole::Combobox, "sort").first(),
            page_info: page.get_by_text("Page:").first(),
            visible_count_info: page.get_by_text("Visible:").first(),
            page: page.clone(),
        }
    }

    /// Article rows
    #[must_use]
    pub const fn article_rows(&self) -> &Locator {
        &self.article_rows
    }

    /// Breadcrumb navigation
    #[must_use]
    pub const fn breadcrumb(&self) -> &Locator {
        &self.breadcrumb
    }

    /// Pagination indicator ("Page: N")
    #[must_use]
    pub const fn page_info(&self) -> &Locator {
        &self.page_info
    }

    fn url_wait(&self) -> Duration {
        URL_WAIT.min(self.page.timeouts().navigation())
    }

    /// Navigate straight to the listing
    pub async fn goto(&self) -> PortalResult<()> {
        self.load(&self.urls.knowledge_base()).await
    }

    /// Navigate straight to one article category
    pub async fn goto_category(&self, category_id: &str) -> PortalResult<()> {
        self.load(&self.urls.knowledge_base_category(category_id))
            .await
    }

    async fn load(&self, url: &str) -> PortalResult<()> {
        self.page.goto(url).await?;
        self.page
            .wait_for_load_state(LoadState::DomContentLoaded)
            .await
    }

    /// URL, article heading and page heading are in place.
    ///
    /// Article content can lag behind navigation, so the article heading
    /// gets the full navigation timeout.
    pub async fn verify_page_loaded(&self) -> PortalResult<()> {
        self.page
            .wait_for_url(&TextMatch::pattern(KNOWLEDGE_BASE_PATH), self.url_wait())
            .await?;
        expect(&self.articles_heading)
            .to_be_visible()
            .with_timeout(self.page.timeouts().navigation())
            .await?;
        expect(&self.page_heading).to_be_visible().await
    }

    /// Breadcrumb, search box, category tree and at least one article row
    pub async fn verify_page_structure(&self) -> PortalResult<()> {
        expect(&self.breadcrumb).to_be_visible().await?;
        expect(self.chrome.search_box()).to_be_visible().await?;
        expect(&self.categories_tree).to_be_visible().await?;
        expect(&self.article_rows.first()).to_be_visible().await
    }

    /// Exactly the Home / Knowledge Base / All Articles links, each visible
    pub async fn verify_breadcrumb_elements(&self) -> PortalResult<()> {
        expect(&self.home_link).to_be_visible().await?;
        expect(&self.knowledge_base_link).to_be_visible().await?;
        expect(&self.all_articles_link).to_be_visible().await?;
        expect(&self.breadcrumb_links).to_have_count(3).await
    }

    /// Row count within [`DEFAULT_ARTICLE_RANGE`]
    pub async fn verify_article_count(&self) -> PortalResult<()> {
        expect(&self.article_rows)
            .to_have_count_in(DEFAULT_ARTICLE_RANGE)
            .await
    }

    /// Exact row count
    pub async fn verify_article_count_exact(&self, expected: usize) -> PortalResult<()> {
        expect(&self.article_rows).to_have_count(expected).await
    }

    /// Title of the first article row.
    ///
    /// Falls back to the row's full text when it has no title element, and
    /// to an empty string when the row has no text at all.
    pub async fn find_article_title(&self) -> PortalResult<String> {
        let row = self.article_rows.first();
        expect(&row).to_be_visible().await?;
        let titles = row
            .locator(Selector::css(ARTICLE_TITLE_CSS))
            .all_text_contents()
            .await?;
        let row_text = if titles.iter().any(|t| !t.is_empty()) {
            None
        } else {
            row.text_content().await?
        };
        Ok(pick_article_title(titles, row_text))
    }

    /// Open the sort dropdown and pick `option` by its label
    pub async fn change_article_sorting(&self, option: SortOption) -> PortalResult<()> {
        tracing::info!(%option, "changing article sorting");
        self.sort_dropdown.click().await?;
        self.page
            .get_by_role(AriaRole::Option, TextMatch::exact(option.label()))
            .click()
            .await
    }

    /// Parsed view counts of the rendered rows, in document order
    pub async fn view_counts(&self) -> PortalResult<Vec<u64>> {
        Ok(self
            .view_counts
            .all_text_contents()
            .await?
            .iter()
            .filter_map(|text| first_integer(text))
            .collect())
    }

    /// Rows are ordered by `option`.
    ///
    /// Only [`SortOption::MostPopular`] is verifiable (view counts
    /// non-increasing); any other option is [`PortalError::NotImplemented`].
    pub async fn verify_article_sorting(&self, option: SortOption) -> PortalResult<()> {
        match option {
            SortOption::MostPopular => {
                let options = self.page.timeouts().expect_options();
                poll_until("view counts in non-increasing order", &options, || async {
                    let counts = self.view_counts().await?;
                    Ok(if !counts.is_empty() && is_sorted(&counts, SortDirection::Descending) {
                        Probe::Ready(())
                    } else {
                        Probe::Pending(format!("{counts:?}"))
                    })
                })
                .await
            }
            other => Err(PortalError::not_implemented(format!(
                "article sort verification for {other}"
            ))),
        }
    }

    /// Follow the breadcrumb's Home link
    pub async fn navigate_to_home_page(&self) -> PortalResult<()> {
        self.home_link.click().await
    }

    /// Number shown by the "Visible: N" indicator
    pub async fn visible_count_info(&self) -> PortalResult<u64> {
        let text = self.visible_count_info.text_content().await?.unwrap_or_default();
        first_integer(&text).ok_or_else(|| {
            PortalError::assertion(format!("visible-count indicator has no number: {text:?}"))
        })
    }

    /// The "Visible: N" indicator agrees with the rendered row count
    pub async fn verify_visible_count_matches_rows(&self) -> PortalResult<()> {
        let shown = self.visible_count_info().await? as usize;
        expect(&self.article_rows).to_have_count(shown).await
    }
}

impl PageObject for KnowledgeBasePage {
    fn kind(&self) -> PageKind {
        PageKind::KnowledgeBase
    }

    fn url_pattern(&self) -> &str {
        KNOWLEDGE_BASE_PATH
    }
}

impl PortalPage for KnowledgeBasePage {
    fn chrome(&self) -> &NavigationChrome {
        &self.chrome
    }
}

/// First non-empty title, else the row text, else `""`
fn pick_article_title(titles: Vec<String>, row_text: Option<String>) -> String {
    titles
        .into_iter()
        .find(|t| !t.is_empty())
        .or(row_text)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod article_title_tests {
        use super::*;

        #[test]
        fn test_title_element_wins() {
            let titles = vec![String::new(), "Book a meeting room".to_string()];
            assert_eq!(
                pick_article_title(titles, Some("KB000008 230 views".to_string())),
                "Book a meeting room"
            );
        }

        #[test]
        fn test_row_text_when_untitled() {
            assert_eq!(
                pick_article_title(Vec::new(), Some("KB000008 230 views".to_string())),
                "KB000008 230 views"
            );
            assert_eq!(
                pick_article_title(vec![String::new()], Some("KB000008".to_string())),
                "KB000008"
            );
        }

        #[test]
        fn test_empty_when_row_has_no_text() {
            assert_eq!(pick_article_title(Vec::new(), None), "");
            assert_eq!(pick_article_title(vec![String::new()], None), "");
        }
    }
}
