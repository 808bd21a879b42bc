//! The portal scenario suite.
//!
//! Each [`Scenario`] pairs a fixture strategy with an async body that drives
//! the page objects of a [`ScenarioContext`]. [`catalogue`] lists the whole
//! suite in run order; [`ScenarioFilter`] narrows it by tag or name.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::fixture::NavigationStrategy;
use crate::manage::ManagePage;
use crate::page_object::PortalPage;
use crate::result::{PortalError, PortalResult};
use crate::sort::SortOption;
use crate::steps::StepRecorder;

/// Term that matches no article
pub const UNMATCHED_SEARCH_TERM: &str = "NonExistentTerm12345";

/// Term that matches exactly one article of the showcase portal
pub const WORD_SEARCH_TERM: &str = "Word";

/// The article [`WORD_SEARCH_TERM`] finds
pub const WORD_ARTICLE_TITLE: &str = "How do I get Word to stop helping me type?";

// =============================================================================
// TAGS
// =============================================================================

/// Suite a scenario belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Fast checks of the main flows
    Smoke,
    /// Broader checks of page structure and navigation
    Regression,
}

impl Tag {
    /// Every tag
    pub const ALL: [Self; 2] = [Self::Smoke, Self::Regression];

    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Regression => "regression",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl FromStr for Tag {
    type Err = PortalError;

    /// Accepts `smoke`, `@smoke`, `regression` or `@regression`, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('@').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == name)
            .ok_or_else(|| PortalError::Config {
                message: format!("unknown tag {s:?} (expected smoke or regression)"),
            })
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// What a scenario body works with: the page objects and the step log
#[derive(Debug)]
pub struct ScenarioContext {
    manage: ManagePage,
    steps: StepRecorder,
}

impl ScenarioContext {
    /// Context over a fixture-prepared aggregator
    #[must_use]
    pub const fn new(manage: ManagePage, steps: StepRecorder) -> Self {
        Self { manage, steps }
    }

    /// Page objects
    #[must_use]
    pub const fn manage(&self) -> &ManagePage {
        &self.manage
    }

    /// Step log
    #[must_use]
    pub const fn steps(&self) -> &StepRecorder {
        &self.steps
    }

    /// Run `body` as a named step
    pub async fn step<T, F, Fut>(&self, name: &str, body: F) -> PortalResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PortalResult<T>>,
    {
        self.steps.step(name, body).await
    }
}

// =============================================================================
// SCENARIO
// =============================================================================

/// Body of a scenario
pub type ScenarioBody = for<'a> fn(&'a ScenarioContext) -> BoxFuture<'a, PortalResult<()>>;

/// One named, tagged scenario
#[derive(Clone, Copy)]
pub struct Scenario {
    name: &'static str,
    title: &'static str,
    tags: &'static [Tag],
    fixture: NavigationStrategy,
    body: ScenarioBody,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("fixture", &self.fixture)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Declare a scenario
    #[must_use]
    pub const fn new(
        name: &'static str,
        title: &'static str,
        tags: &'static [Tag],
        fixture: NavigationStrategy,
        body: ScenarioBody,
    ) -> Self {
        Self {
            name,
            title,
            tags,
            fixture,
            body,
        }
    }

    /// Identifier (snake_case)
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Human-readable title
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// Tags
    #[must_use]
    pub const fn tags(&self) -> &'static [Tag] {
        self.tags
    }

    /// Fixture strategy the body expects
    #[must_use]
    pub const fn fixture(&self) -> NavigationStrategy {
        self.fixture
    }

    /// Carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Run the body against a prepared context
    pub async fn run(&self, ctx: &ScenarioContext) -> PortalResult<()> {
        (self.body)(ctx).await
    }
}

/// Selects scenarios by tag and name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioFilter {
    tags: Vec<Tag>,
    name: Option<String>,
}

impl ScenarioFilter {
    /// Filter accepting everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept scenarios carrying `tag` (no tags means any tag)
    #[must_use]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Require `needle` in the scenario name
    #[must_use]
    pub fn with_name(mut self, needle: impl Into<String>) -> Self {
        self.name = Some(needle.into());
        self
    }

    /// Whether `scenario` is selected
    #[must_use]
    pub fn matches(&self, scenario: &Scenario) -> bool {
        let tag_ok = self.tags.is_empty() || self.tags.iter().any(|t| scenario.has_tag(*t));
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |needle| scenario.name().contains(needle));
        tag_ok && name_ok
    }

    /// The selected part of `scenarios`, order kept
    #[must_use]
    pub fn select(&self, scenarios: &[Scenario]) -> Vec<Scenario> {
        scenarios.iter().filter(|s| self.matches(s)).copied().collect()
    }
}

// =============================================================================
// CATALOGUE
// =============================================================================

/// Every portal scenario, in run order
#[must_use]
pub fn catalogue() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "knowledge_base_structure",
            "Navigation to Knowledge Base via burger menu",
            &[Tag::Regression],
            NavigationStrategy::ViaHomeMenu,
            knowledge_base_structure,
        ),
        Scenario::new(
            "knowledge_base_breadcrumbs",
            "Knowledge Base navigation breadcrumbs",
            &[Tag::Regression],
            NavigationStrategy::ViaHomeMenu,
            knowledge_base_breadcrumbs,
        ),
        Scenario::new(
            "successful_search",
            "Successful search in Knowledge Base",
            &[Tag::Smoke],
            NavigationStrategy::Direct,
            successful_search,
        ),
        Scenario::new(
            "unsuccessful_search",
            "Unsuccessful search in Knowledge Base",
            &[Tag::Smoke],
            NavigationStrategy::Direct,
            unsuccessful_search,
        ),
        Scenario::new(
            "search_word",
            "Search for a known article",
            &[Tag::Smoke],
            NavigationStrategy::Direct,
            search_word,
        ),
        Scenario::new(
            "clear_search_round_trip",
            "Search field keeps and clears its value",
            &[Tag::Regression],
            NavigationStrategy::Direct,
            clear_search_round_trip,
        ),
        Scenario::new(
            "sort_most_popular",
            "Sort articles by Most Popular",
            &[Tag::Regression],
            NavigationStrategy::Direct,
            sort_most_popular,
        ),
        Scenario::new(
            "home_main_sections",
            "Home page shows its main sections",
            &[Tag::Smoke],
            NavigationStrategy::None,
            home_main_sections,
        ),
    ]
}

/// Look a scenario up by exact name
#[must_use]
pub fn find(name: &str) -> Option<Scenario> {
    catalogue().into_iter().find(|s| s.name() == name)
}

fn knowledge_base_structure(ctx: &ScenarioContext) -> BoxFuture<'_, PortalResult<()>> {
    Box::pin(async move {
        let kb = ctx.manage().knowledge_base_page();
        ctx.step("Verify Knowledge Base page structure", || async {
            kb.verify_page_structure().await?;
            kb.verify_article_count().await
        })
        .await
    })
}

fn knowledge_base_breadcrumbs(ctx: &ScenarioContext) -> BoxFuture<'_, PortalResult<()>> {
    Box::pin(async move {
        let kb = ctx.manage().knowledge_base_page();
        ctx.step("Verify breadcrumb navigation", || {
            kb.verify_breadcrumb_elements()
        })
        .await?;
        ctx.step("Test breadcrumb navigation functionality", || async {
            kb.navigate_to_home_page().await?;
            ctx.manage().home_page().verify_page_loaded().await
        })
        .await
    })
}

fn successful_search(ctx: &ScenarioContext) -> BoxFuture<'_, PortalResult<()>> {
    Box::pin(async move {
        let kb = ctx.manage().knowledge_base_page();
        let results = ctx.manage().search_results_page();
        ctx.step("Perform successful search", || async {
            let title = kb.find_article_title().await?;
            kb.chrome().perform_search(&title).await
        })
        .await?;
        ctx.step("Verify search results", || async {
            results.verify_page_loaded().await?;
            results.verify_article_count(1).await
        })
        .await
    })
}

fn unsuccessful_search(ctx: &ScenarioContext) -> BoxFuture<'_, PortalResult<()>> {
    Box::pin(async move {
        let kb = ctx.manage().knowledge_base_page();
        let results = ctx.manage().search_results_page();
        ctx.step("Perform unsuccessful search", || async {
            kb.chrome().perform_search(UNMATCHED_SEARCH_TERM).await?;
            results.verify_no_results_state().await?;
            results.verify_article_count(0).await
        })
        .await
    })
}

fn search_word(ctx: &ScenarioContext) -> BoxFuture<'_, PortalResult<()>> {
    Box::pin(async move {
        let kb = ctx.manage().knowledge_base_page();
        let results = ctx.manage().search_results_page();
        ctx.step("Search for the Word article", || {
            kb.chrome().perform_search(WORD_SEARCH_TERM)
        })
        .await?;
        ctx.step("Verify the Word article is the only result", || async {
            results.verify_page_loaded().await?;
            results.verify_article_count(1).await?;
            results.verify_article_listed(WORD_ARTICLE_TITLE).await
        })
        .await
    })
}

fn clear_search_round_trip(ctx: &ScenarioContext) -> BoxFuture<'_, PortalResult<()>> {
    Box::pin(async move {
        let chrome = ctx.manage().knowledge_base_page().chrome();
        ctx.step("Search keeps the term", || async {
            chrome.perform_search(WORD_SEARCH_TERM).await?;
            ctx.manage().search_results_page().verify_page_loaded().await?;
            ctx.manage()
                .search_results_page()
                .chrome()
                .verify_search_value(WORD_SEARCH_TERM)
                .await
        })
        .await?;
        ctx.step("Clearing empties the field", || async {
            let chrome = ctx.manage().search_results_page().chrome();
            chrome.clear_search().await?;
            chrome.verify_search_value("").await
        })
        .await
    })
}

fn sort_most_popular(ctx: &ScenarioContext) -> BoxFuture<'_, PortalResult<()>> {
    Box::pin(async move {
        let kb = ctx.manage().knowledge_base_page();
        ctx.step("Change article sorting", || {
            kb.change_article_sorting(SortOption::MostPopular)
        })
        .await?;
        ctx.step("Verify article sorting", || {
            kb.verify_article_sorting(SortOption::MostPopular)
        })
        .await
    })
}

fn home_main_sections(ctx: &ScenarioContext) -> BoxFuture<'_, PortalResult<()>> {
    Box::pin(async move {
        let home = ctx.manage().home_page();
        ctx.step("Open home page", || async {
            home.goto().await?;
            home.verify_page_loaded().await
        })
        .await?;
        ctx.step("Verify main sections", || home.verify_main_sections())
            .await
    })
}
