//! Lazily constructed page objects over one shared page.

use std::sync::OnceLock;

use crate::browser::Page;
use crate::config::PortalUrls;
use crate::page_object::PageKind;
use crate::pages::{HomePage, KnowledgeBasePage, SearchResultsPage};

/// Aggregator handing out one instance per page-object kind.
///
/// Each page object is built on first access and the same reference is
/// returned for the aggregator's lifetime. Aggregators never share state.
#[derive(Debug)]
pub struct ManagePage {
    page: Page,
    urls: PortalUrls,
    home: OnceLock<HomePage>,
    knowledge_base: OnceLock<KnowledgeBasePage>,
    search_results: OnceLock<SearchResultsPage>,
}

impl ManagePage {
    /// Aggregator over `page`; constructs nothing yet
    #[must_use]
    pub const fn new(page: Page, urls: PortalUrls) -> Self {
        Self {
            page,
            urls,
            home: OnceLock::new(),
            knowledge_base: OnceLock::new(),
            search_results: OnceLock::new(),
        }
    }

    /// The shared page
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Portal URLs
    #[must_use]
    pub const fn urls(&self) -> &PortalUrls {
        &self.urls
    }

    /// Landing page object
    pub fn home_page(&self) -> &HomePage {
        self.home
            .get_or_init(|| HomePage::new(&self.page, &self.urls))
    }

    /// Knowledge Base page object
    pub fn knowledge_base_page(&self) -> &KnowledgeBasePage {
        self.knowledge_base
            .get_or_init(|| KnowledgeBasePage::new(&self.page, &self.urls))
    }

    /// Search Results page object
    pub fn search_results_page(&self) -> &SearchResultsPage {
        self.search_results
            .get_or_init(|| SearchResultsPage::new(&self.page))
    }

    /// Whether the page object of `kind` has been built
    #[must_use]
    pub fn is_constructed(&self, kind: PageKind) -> bool {
        match kind {
            PageKind::Home => self.home.get().is_some(),
            PageKind::KnowledgeBase => self.knowledge_base.get().is_some(),
            PageKind::SearchResults => self.search_results.get().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::mock::portal::FakePortal;
    use std::sync::Arc;

    fn manage() -> ManagePage {
        let portal = FakePortal::new("https://portal.test/hd/");
        let page = Page::new(Arc::new(portal.driver()), Timeouts::uniform(50, 5));
        ManagePage::new(page, portal.urls().clone())
    }

    #[test]
    fn test_nothing_constructed_up_front() {
        let mp = manage();
        for kind in PageKind::ALL {
            assert!(!mp.is_constructed(kind));
        }
    }

    #[test]
    fn test_repeat_access_returns_same_instance() {
        let mp = manage();
        let first = mp.knowledge_base_page();
        let second = mp.knowledge_base_page();
        assert!(std::ptr::eq(first, second));
        assert!(mp.is_constructed(PageKind::KnowledgeBase));
        assert!(!mp.is_constructed(PageKind::Home));
        assert!(std::ptr::eq(mp.home_page(), mp.home_page()));
        assert!(std::ptr::eq(mp.search_results_page(), mp.search_results_page()));
    }

    #[test]
    fn test_aggregators_are_independent() {
        let a = manage();
        let b = manage();
        let _ = a.home_page();
        assert!(a.is_constructed(PageKind::Home));
        assert!(!b.is_constructed(PageKind::Home));
        assert!(!std::ptr::eq(a.home_page(), b.home_page()));
    }
}
