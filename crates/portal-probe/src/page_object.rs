//! Page Object Model support.
//!
//! Every portal page object implements [`PageObject`] for identity and URL
//! matching, and [`PortalPage`] to expose the navigation chrome it composes.
//! Constructing a page object performs no I/O; locators resolve lazily.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locator::TextMatch;
use crate::pages::NavigationChrome;

/// The page objects the aggregator can hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Landing page
    Home,
    /// Knowledge Base listing
    KnowledgeBase,
    /// Search Results
    SearchResults,
}

impl PageKind {
    /// Every kind
    pub const ALL: [Self; 3] = [Self::Home, Self::KnowledgeBase, Self::SearchResults];

    /// Human-readable name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::KnowledgeBase => "Knowledge Base",
            Self::SearchResults => "Search Results",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for page objects representing a page in the UI.
pub trait PageObject {
    /// Which page this is
    fn kind(&self) -> PageKind;

    /// Regular expression matching this page's URLs
    fn url_pattern(&self) -> &str;

    /// Whether `url` belongs to this page
    fn matches_url(&self, url: &str) -> bool {
        TextMatch::pattern(self.url_pattern()).matches(url)
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &'static str {
        self.kind().name()
    }
}

/// A portal page: a page object that carries the shared navigation chrome
pub trait PortalPage: PageObject {
    /// Menu and global search shared by every page
    fn chrome(&self) -> &NavigationChrome;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake;

    impl PageObject for Fake {
        fn kind(&self) -> PageKind {
            PageKind::SearchResults
        }

        fn url_pattern(&self) -> &str {
            "searchResults"
        }
    }

    #[test]
    fn test_default_methods() {
        assert_eq!(Fake.page_name(), "Search Results");
        assert!(Fake.matches_url("https://x/hd/searchResults?q=Word"));
        assert!(!Fake.matches_url("https://x/hd/knowledgeBase"));
    }

    #[test]
    fn test_kind_names() {
        let names: Vec<_> = PageKind::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["Home", "Knowledge Base", "Search Results"]);
    }
}
