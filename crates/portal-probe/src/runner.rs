//! Sequential scenario runner.
//!
//! Every scenario gets a page of its own from the [`PageFactory`]; the page
//! is closed when the scenario ends, whatever the outcome. Scenarios never
//! share state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::browser::Page;
use crate::config::PortalConfig;
use crate::driver::PageFactory;
use crate::fixture::PortalFixture;
use crate::reporter::{ScenarioReport, SuiteReport};
use crate::result::PortalResult;
use crate::scenario::{catalogue, Scenario, ScenarioContext, ScenarioFilter};
use crate::steps::StepRecorder;

/// Default suite name in reports
pub const DEFAULT_SUITE_NAME: &str = "self-service-portal";

/// Runs the selected scenarios one after another
pub struct SuiteRunner {
    factory: Arc<dyn PageFactory>,
    config: PortalConfig,
    scenarios: Vec<Scenario>,
    filter: ScenarioFilter,
    fail_fast: bool,
    suite_name: String,
}

impl std::fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("base_url", &self.config.base_url)
            .field("filter", &self.filter)
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

impl SuiteRunner {
    /// Runner over the full [`catalogue`]
    #[must_use]
    pub fn new(factory: Arc<dyn PageFactory>, config: PortalConfig) -> Self {
        Self {
            factory,
            config,
            scenarios: catalogue(),
            filter: ScenarioFilter::new(),
            fail_fast: false,
            suite_name: DEFAULT_SUITE_NAME.to_string(),
        }
    }

    /// Replace the scenario set
    #[must_use]
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Run only what `filter` selects
    #[must_use]
    pub fn with_filter(mut self, filter: ScenarioFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Enable fail-fast mode: after the first failure the rest are skipped
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Suite name used in reports
    #[must_use]
    pub fn with_suite_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }

    /// Scenarios the filter selects, in run order
    #[must_use]
    pub fn selected(&self) -> Vec<Scenario> {
        self.filter.select(&self.scenarios)
    }

    /// Run the selection
    pub async fn run(&self) -> SuiteReport {
        self.run_with(|_| {}).await
    }

    /// Run the selection, calling `on_result` as each scenario finishes
    pub async fn run_with<F>(&self, mut on_result: F) -> SuiteReport
    where
        F: FnMut(&ScenarioReport),
    {
        let mut report = SuiteReport::new(self.suite_name.clone(), self.config.base_url.clone());
        let selected = self.selected();
        tracing::info!(
            run_id = %report.run_id,
            scenarios = selected.len(),
            base_url = %self.config.base_url,
            "suite started"
        );

        let mut stopped = false;
        for scenario in &selected {
            let result = if stopped {
                ScenarioReport::skipped(scenario)
            } else {
                self.run_scenario(scenario).await
            };
            if self.fail_fast && result.status.is_failed() {
                tracing::warn!(scenario = scenario.name(), "fail-fast: skipping the rest");
                stopped = true;
            }
            on_result(&result);
            report.record(result);
        }

        report.finish();
        tracing::info!(summary = %report.summary(), "suite finished");
        report
    }

    /// Run one scenario on a fresh page
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioReport {
        let start = Instant::now();
        let span = tracing::info_span!("scenario", name = scenario.name());

        let driver = match self.factory.open_page().await {
            Ok(driver) => driver,
            Err(e) => {
                tracing::error!(scenario = scenario.name(), error = %e, "could not open page");
                return ScenarioReport::failed(scenario, elapsed_ms(start), Vec::new(), e.to_string());
            }
        };
        let page = Page::new(driver, self.config.timeouts);
        let steps = StepRecorder::new();

        let outcome = self
            .execute(scenario, &page, &steps)
            .instrument(span)
            .await;

        let screenshot = match &outcome {
            Ok(()) => None,
            Err(_) => self.capture_failure(scenario, &page).await,
        };
        if let Err(e) = page.close().await {
            tracing::warn!(scenario = scenario.name(), error = %e, "closing page failed");
        }

        let duration_ms = elapsed_ms(start);
        match outcome {
            Ok(()) => {
                tracing::info!(scenario = scenario.name(), duration_ms, "scenario passed");
                ScenarioReport::passed(scenario, duration_ms, steps.records())
            }
            Err(e) => {
                tracing::warn!(scenario = scenario.name(), duration_ms, error = %e, "scenario failed");
                let report = ScenarioReport::failed(scenario, duration_ms, steps.records(), e.to_string());
                match screenshot {
                    Some(path) => report.with_screenshot(path),
                    None => report,
                }
            }
        }
    }

    async fn execute(
        &self,
        scenario: &Scenario,
        page: &Page,
        steps: &StepRecorder,
    ) -> PortalResult<()> {
        let manage = PortalFixture::new(scenario.fixture())
            .setup(page.clone(), self.config.urls(), steps)
            .await?;
        let ctx = ScenarioContext::new(manage, steps.clone());
        scenario.run(&ctx).await
    }

    /// Save a screenshot of the failed page when a directory is configured
    async fn capture_failure(&self, scenario: &Scenario, page: &Page) -> Option<PathBuf> {
        let dir = self.config.screenshot_dir.as_ref()?;
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
        let path = dir.join(format!("{}-{stamp}.png", scenario.name()));
        let saved = async {
            let bytes = page.screenshot().await?;
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, bytes).await?;
            PortalResult::Ok(())
        }
        .await;
        match saved {
            Ok(()) => {
                tracing::info!(path = %path.display(), "failure screenshot saved");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failure screenshot not saved");
                None
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
