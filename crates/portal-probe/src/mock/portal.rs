//! A simulated Self Service Portal built from mock documents.
//!
//! Serves the landing page, the Knowledge Base listing (with working sort
//! dropdown and category URLs) and the Search Results page, so every page
//! object and scenario can run without a browser.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{query_param, MockAction, MockDocument, MockDriver, MockElement};
use crate::config::PortalUrls;
use crate::driver::{PageDriver, PageFactory};
use crate::locator::AriaRole;
use crate::pages::{MAIN_SECTIONS, NO_RESULTS_MESSAGE, SEARCH_FIELD_NAME, SEARCH_RESULTS_TITLE};
use crate::result::PortalResult;
use crate::sort::SortOption;

/// Rows per listing page
const PAGE_SIZE: usize = 10;

const SEARCH_KEY: &str = "search";
const DRAWER_KEY: &str = "drawer";
const SORT_OPTIONS_KEY: &str = "sort-options";

/// One article in the fake Knowledge Base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeArticle {
    /// Rendered as `KB` plus six digits
    pub number: u32,
    /// Title
    pub title: String,
    /// View count
    pub views: u64,
}

impl FakeArticle {
    /// Create an article
    #[must_use]
    pub fn new(number: u32, title: impl Into<String>, views: u64) -> Self {
        Self {
            number,
            title: title.into(),
            views,
        }
    }

    /// `KB000042`
    #[must_use]
    pub fn article_number(&self) -> String {
        format!("KB{:06}", self.number)
    }
}

/// The article set the portal serves by default
#[must_use]
pub fn default_articles() -> Vec<FakeArticle> {
    vec![
        FakeArticle::new(1, "How do I get Word to stop helping me type?", 120),
        FakeArticle::new(2, "Reset your network credentials", 342),
        FakeArticle::new(3, "Connect to the office VPN", 87),
        FakeArticle::new(4, "Request a new laptop", 15),
        FakeArticle::new(5, "Set up multi-factor authentication", 560),
        FakeArticle::new(6, "Map a shared network drive", 42),
        FakeArticle::new(7, "Configure email on your phone", 230),
        FakeArticle::new(8, "Book a meeting room", 230),
    ]
}

/// `1204` as `1,204`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn sort_slug(option: SortOption) -> String {
    option.label().to_lowercase().replace(' ', "-")
}

/// Simulated portal rooted at a base URL
#[derive(Debug, Clone)]
pub struct FakePortal {
    urls: PortalUrls,
    articles: Vec<FakeArticle>,
    hidden_sections: Vec<String>,
    popularity_sort_works: bool,
    menu_works: bool,
    grouped_view_counts: bool,
    titled_rows: bool,
}

impl FakePortal {
    /// Portal serving [`default_articles`]
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            urls: PortalUrls::new(base_url),
            articles: default_articles(),
            hidden_sections: Vec::new(),
            popularity_sort_works: true,
            menu_works: true,
            grouped_view_counts: false,
            titled_rows: true,
        }
    }

    /// Replace the article set
    #[must_use]
    pub fn with_articles(mut self, articles: Vec<FakeArticle>) -> Self {
        self.articles = articles;
        self
    }

    /// Leave a landing-page section out
    #[must_use]
    pub fn without_section(mut self, name: impl Into<String>) -> Self {
        self.hidden_sections.push(name.into());
        self
    }

    /// "Most Popular" keeps the default order
    #[must_use]
    pub const fn with_broken_popularity_sort(mut self) -> Self {
        self.popularity_sort_works = false;
        self
    }

    /// The menu toggle does nothing
    #[must_use]
    pub const fn with_broken_menu(mut self) -> Self {
        self.menu_works = false;
        self
    }

    /// Render view counts with thousands separators (`1,204 views`)
    #[must_use]
    pub const fn with_grouped_view_counts(mut self) -> Self {
        self.grouped_view_counts = true;
        self
    }

    /// Render rows without their title element
    #[must_use]
    pub const fn without_article_titles(mut self) -> Self {
        self.titled_rows = false;
        self
    }

    /// URLs of this portal
    #[must_use]
    pub const fn urls(&self) -> &PortalUrls {
        &self.urls
    }

    /// Articles served
    #[must_use]
    pub fn articles(&self) -> &[FakeArticle] {
        &self.articles
    }

    /// A fresh page on `about:blank`
    #[must_use]
    pub fn driver(&self) -> MockDriver {
        let portal = self.clone();
        MockDriver::new(move |url| portal.document(url))
    }

    /// Page factory handing out fresh drivers on this portal
    #[must_use]
    pub fn factory(&self) -> FakePortalFactory {
        FakePortalFactory {
            portal: self.clone(),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Document served at `url`, if any
    #[must_use]
    pub fn document(&self, url: &str) -> Option<MockDocument> {
        let path = url.split_once('?').map_or(url, |(path, _)| path);
        let knowledge_base = self.urls.knowledge_base();
        if path == self.urls.home() {
            Some(self.home())
        } else if path == knowledge_base {
            let sort = query_param(url, "sort");
            Some(self.knowledge_base(sort.as_deref()))
        } else if path
            .strip_prefix(knowledge_base.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|id| !id.is_empty())
        {
            Some(self.knowledge_base(None))
        } else if path == self.urls.search_results() {
            Some(self.search_results(&query_param(url, "q").unwrap_or_default()))
        } else {
            None
        }
    }

    fn push_chrome(&self, doc: &mut MockDocument, search_value: &str) {
        let mut menu = MockElement::button("").name("Open menu");
        if self.menu_works {
            menu = menu.on_click(MockAction::Reveal(vec![DRAWER_KEY.to_string()]));
        }
        doc.push(menu);
        let drawer = doc.push(MockElement::new("div").key(DRAWER_KEY).hidden());
        doc.push_child(drawer, MockElement::link("Home", self.urls.home()));
        doc.push_child(
            drawer,
            MockElement::link("Knowledge Base", self.urls.knowledge_base()),
        );
        doc.push(
            MockElement::textbox(SEARCH_FIELD_NAME)
                .key(SEARCH_KEY)
                .value(search_value),
        );
        doc.push(MockElement::button("Search").on_click(MockAction::Search {
            input: SEARCH_KEY.to_string(),
            url: self.urls.search_results(),
        }));
    }

    fn push_rows(&self, doc: &mut MockDocument, articles: &[FakeArticle]) {
        let list = doc.push(MockElement::new("ul").role(AriaRole::List));
        for article in articles {
            let row = doc.push_child(list, MockElement::new("li").role(AriaRole::Listitem));
            if self.titled_rows {
                doc.push_child(
                    row,
                    MockElement::new("span")
                        .class("MuiListItemText-primary")
                        .text(article.title.clone()),
                );
            }
            doc.push_child(row, MockElement::new("span").text(article.article_number()));
            let views = if self.grouped_view_counts {
                group_thousands(article.views)
            } else {
                article.views.to_string()
            };
            doc.push_child(row, MockElement::new("span").text(format!("{views} views")));
        }
    }

    fn push_search_breadcrumb(&self, doc: &mut MockDocument) {
        let nav = doc.push(
            MockElement::new("nav")
                .role(AriaRole::Navigation)
                .name("breadcrumb"),
        );
        let trail = doc.push_child(nav, MockElement::new("ol").role(AriaRole::List));
        let home = doc.push_child(trail, MockElement::new("li").role(AriaRole::Listitem));
        doc.push_child(home, MockElement::link("Home", self.urls.home()));
        doc.push_child(
            trail,
            MockElement::new("li").role(AriaRole::Listitem).text("Search"),
        );
    }

    fn home(&self) -> MockDocument {
        let mut doc = MockDocument::new("Home | Self Service Portal");
        self.push_chrome(&mut doc, "");
        doc.push(MockElement::heading(1, "Find a Solution"));
        for section in MAIN_SECTIONS {
            if !self.hidden_sections.iter().any(|s| s == section) {
                doc.push(MockElement::heading(2, section));
            }
        }
        doc
    }

    fn knowledge_base(&self, sort: Option<&str>) -> MockDocument {
        let mut doc = MockDocument::new("Knowledge Base | Self Service Portal");
        self.push_chrome(&mut doc, "");
        let nav = doc.push(
            MockElement::new("nav")
                .role(AriaRole::Navigation)
                .name("breadcrumb"),
        );
        doc.push_child(nav, MockElement::link("Home", self.urls.home()));
        doc.push_child(
            nav,
            MockElement::link("Knowledge Base", self.urls.knowledge_base()),
        );
        doc.push_child(
            nav,
            MockElement::link("All Articles", self.urls.knowledge_base()),
        );
        doc.push(MockElement::heading(4, "Knowledge Base"));

        let tree = doc.push(MockElement::new("ul").role(AriaRole::Tree));
        for category in ["Software", "Hardware", "Accounts"] {
            doc.push_child(
                tree,
                MockElement::new("li").role(AriaRole::Treeitem).text(category),
            );
        }

        doc.push(MockElement::heading(5, "All Articles"));
        doc.push(
            MockElement::new("div")
                .role(AriaRole::Combobox)
                .name("Sort by")
                .text(sort.unwrap_or("newest"))
                .on_click(MockAction::Reveal(vec![SORT_OPTIONS_KEY.to_string()])),
        );
        let listbox = doc.push(
            MockElement::new("ul")
                .role(AriaRole::Listbox)
                .key(SORT_OPTIONS_KEY)
                .hidden(),
        );
        for option in SortOption::ALL {
            doc.push_child(
                listbox,
                MockElement::new("li")
                    .role(AriaRole::Option)
                    .text(option.label())
                    .on_click(MockAction::Navigate(format!(
                        "{}?sort={}",
                        self.urls.knowledge_base(),
                        sort_slug(option)
                    ))),
            );
        }

        let mut articles = self.articles.clone();
        if self.popularity_sort_works && sort == Some(sort_slug(SortOption::MostPopular).as_str())
        {
            articles.sort_by(|a, b| b.views.cmp(&a.views));
        }
        articles.truncate(PAGE_SIZE);
        self.push_rows(&mut doc, &articles);
        doc.push(MockElement::new("span").text("Page: 1"));
        doc.push(MockElement::new("span").text(format!("Visible: {}", articles.len())));
        doc
    }

    fn search_results(&self, term: &str) -> MockDocument {
        let mut doc = MockDocument::new(SEARCH_RESULTS_TITLE);
        self.push_chrome(&mut doc, term);
        self.push_search_breadcrumb(&mut doc);
        doc.push(MockElement::heading(4, SEARCH_RESULTS_TITLE));
        let needle = term.trim().to_lowercase();
        let hits: Vec<FakeArticle> = self
            .articles
            .iter()
            .filter(|a| a.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if hits.is_empty() {
            doc.push(MockElement::new("p").text(NO_RESULTS_MESSAGE));
        } else {
            self.push_rows(&mut doc, &hits);
        }
        doc
    }
}

/// [`PageFactory`] over a [`FakePortal`]; remembers every page it opened
#[derive(Debug)]
pub struct FakePortalFactory {
    portal: FakePortal,
    opened: Mutex<Vec<Arc<MockDriver>>>,
}

impl FakePortalFactory {
    /// Every page opened so far
    #[must_use]
    pub fn opened(&self) -> Vec<Arc<MockDriver>> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PageFactory for FakePortalFactory {
    async fn open_page(&self) -> PortalResult<Arc<dyn PageDriver>> {
        let driver = Arc::new(self.portal.driver());
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&driver));
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{Selector, TextMatch};
    use crate::pages::ARTICLE_NUMBER_PATTERN;

    const BASE: &str = "https://portal.test/hd/";

    #[test]
    fn test_routes() {
        let portal = FakePortal::new(BASE);
        assert!(portal.document(BASE).is_some());
        assert!(portal
            .document("https://portal.test/hd/knowledgeBase")
            .is_some());
        assert!(portal
            .document("https://portal.test/hd/knowledgeBase/17")
            .is_some());
        assert!(portal
            .document("https://portal.test/hd/searchResults?q=vpn")
            .is_some());
        assert!(portal.document("https://portal.test/hd/tickets").is_none());
        assert!(portal
            .document("https://portal.test/hd/knowledgeBase/")
            .is_none());
    }

    #[test]
    fn test_popular_sort_orders_rows() {
        let portal = FakePortal::new(BASE);
        let doc = portal
            .document("https://portal.test/hd/knowledgeBase?sort=most-popular")
            .unwrap_or_default();
        let rows = doc.resolve(&Selector::role(AriaRole::Listitem));
        assert_eq!(rows.len(), 8);
        let first_title = doc.resolve(&Selector::css(".MuiListItemText-primary"))[0];
        assert_eq!(
            doc.elements()[first_title].text,
            "Set up multi-factor authentication"
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let portal = FakePortal::new(BASE);
        let doc = portal
            .document("https://portal.test/hd/searchResults?q=word")
            .unwrap_or_default();
        let rows = Selector::role(AriaRole::Listitem)
            .has_text(TextMatch::pattern(ARTICLE_NUMBER_PATTERN));
        assert_eq!(doc.resolve(&rows).len(), 1);
        assert_eq!(
            doc.find_key(SEARCH_KEY).and_then(|e| e.value.clone()),
            Some("word".to_string())
        );
    }

    #[test]
    fn test_listing_truncates_to_page_size() {
        let articles = (1..=25)
            .map(|n| FakeArticle::new(n, format!("Article {n}"), u64::from(n)))
            .collect();
        let portal = FakePortal::new(BASE).with_articles(articles);
        let doc = portal
            .document("https://portal.test/hd/knowledgeBase")
            .unwrap_or_default();
        assert_eq!(doc.resolve(&Selector::role(AriaRole::Listitem)).len(), PAGE_SIZE);
    }
}
