//! Portal page objects.

mod chrome;
mod home;
mod knowledge_base;
mod search_results;

pub use chrome::{NavigationChrome, SEARCH_FIELD_NAME};
pub use home::{HomePage, MAIN_SECTIONS, PORTAL_TITLE_PATTERN};
pub use knowledge_base::{
    KnowledgeBasePage, ARTICLE_NUMBER_PATTERN, ARTICLE_TITLE_CSS, DEFAULT_ARTICLE_RANGE,
    VIEW_COUNT_PATTERN,
};
pub use search_results::{SearchResultsPage, NO_RESULTS_MESSAGE, SEARCH_RESULTS_TITLE};
