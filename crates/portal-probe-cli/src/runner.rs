//! Suite execution for the `run` command

use std::path::Path;
use std::sync::Arc;

use portal_probe::mock::portal::FakePortal;
use portal_probe::{PortalConfig, ScenarioFilter, SuiteReport, SuiteRunner};

use crate::commands::ReportFormat;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Where pages come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Headless Chromium over CDP
    #[default]
    Chromium,
    /// The built-in simulated portal
    Offline,
}

/// Test runner for the CLI
#[derive(Debug)]
pub struct TestRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl TestRunner {
    /// Create a new test runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Run the selected scenarios
    pub async fn run(
        &mut self,
        portal: PortalConfig,
        filter: ScenarioFilter,
        fail_fast: bool,
        backend: Backend,
    ) -> CliResult<SuiteReport> {
        match backend {
            Backend::Offline => {
                let factory = Arc::new(FakePortal::new(&portal.base_url).factory());
                let runner = SuiteRunner::new(factory, portal).with_filter(filter);
                Ok(self.drive(with_fail_fast(runner, fail_fast)).await)
            }
            Backend::Chromium => self.run_chromium(portal, filter, fail_fast).await,
        }
    }

    #[cfg(feature = "browser")]
    async fn run_chromium(
        &mut self,
        portal: PortalConfig,
        filter: ScenarioFilter,
        fail_fast: bool,
    ) -> CliResult<SuiteReport> {
        let browser = Arc::new(portal_probe::ChromiumBrowser::launch(portal.browser.clone()).await?);
        let runner = SuiteRunner::new(browser.clone(), portal).with_filter(filter);
        let report = self.drive(with_fail_fast(runner, fail_fast)).await;

        match Arc::try_unwrap(browser) {
            Ok(browser) => browser.close().await?,
            Err(_) => tracing::warn!("browser still shared after the run; leaving it to drop"),
        }
        Ok(report)
    }

    #[cfg(not(feature = "browser"))]
    async fn run_chromium(
        &mut self,
        _portal: PortalConfig,
        _filter: ScenarioFilter,
        _fail_fast: bool,
    ) -> CliResult<SuiteReport> {
        Err(CliError::config(
            "browser support not compiled in; rebuild with --features browser or pass --offline",
        ))
    }

    async fn drive(&mut self, runner: SuiteRunner) -> SuiteReport {
        let selected = runner.selected().len();
        if selected == 0 {
            self.reporter.info("No scenarios selected");
        } else if self.config.verbosity.is_verbose() {
            self.reporter.info(&format!("Running {selected} scenarios"));
        }

        self.reporter.start_progress(selected as u64, "scenarios");
        let reporter = &self.reporter;
        let report = runner.run_with(|result| reporter.scenario_finished(result)).await;
        self.reporter.finish();
        self.reporter.summary(&report);
        report
    }
}

fn with_fail_fast(runner: SuiteRunner, fail_fast: bool) -> SuiteRunner {
    if fail_fast {
        runner.with_fail_fast()
    } else {
        runner
    }
}

/// Render `report` in `format`
pub fn render_report(report: &SuiteReport, format: ReportFormat) -> CliResult<String> {
    Ok(match format {
        ReportFormat::Text => report.render_text(),
        ReportFormat::Json => report.to_json()?,
        ReportFormat::Junit => report.render_junit(),
    })
}

/// Write `report` to `path` in `format`
pub fn write_report(report: &SuiteReport, format: ReportFormat, path: &Path) -> CliResult<()> {
    match format {
        ReportFormat::Json => report.write_json(path)?,
        ReportFormat::Junit => report.write_junit(path)?,
        ReportFormat::Text => std::fs::write(path, report.render_text())?,
    }
    Ok(())
}

/// Turn a finished suite into the command's outcome
pub fn outcome(report: &SuiteReport) -> CliResult<()> {
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::test_execution(format!(
            "{} of {} scenarios failed",
            report.failed_count(),
            report.total_count()
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{ColorChoice, Verbosity};
    use portal_probe::{Tag, Timeouts};

    fn quiet_runner() -> TestRunner {
        TestRunner::new(
            CliConfig::new()
                .with_verbosity(Verbosity::Quiet)
                .with_color(ColorChoice::Never),
        )
    }

    fn offline_config() -> PortalConfig {
        PortalConfig {
            base_url: "https://portal.test/hd/".to_string(),
            timeouts: Timeouts::uniform(300, 5),
            ..PortalConfig::default()
        }
    }

    #[tokio::test]
    async fn test_offline_smoke_run_passes() {
        let report = quiet_runner()
            .run(
                offline_config(),
                ScenarioFilter::new().with_tag(Tag::Smoke),
                false,
                Backend::Offline,
            )
            .await
            .unwrap();
        assert_eq!(report.total_count(), 4);
        assert!(outcome(&report).is_ok());
    }

    #[tokio::test]
    async fn test_empty_selection_is_not_a_failure() {
        let report = quiet_runner()
            .run(
                offline_config(),
                ScenarioFilter::new().with_name("no-such-scenario"),
                false,
                Backend::Offline,
            )
            .await
            .unwrap();
        assert_eq!(report.total_count(), 0);
        assert!(outcome(&report).is_ok());
    }

    #[test]
    fn test_failed_suite_is_test_execution_error() {
        let mut report = SuiteReport::new("s", "https://portal.test/");
        let scenario = portal_probe::find_scenario("search_word").unwrap();
        report.record(portal_probe::ScenarioReport::failed(
            &scenario,
            1,
            Vec::new(),
            "boom",
        ));
        let err = outcome(&report).unwrap_err();
        assert!(matches!(err, CliError::TestExecution { .. }));
        assert!(err.to_string().contains("1 of 1"));
    }

    #[test]
    fn test_render_formats() {
        let report = SuiteReport::new("portal", "https://portal.test/");
        assert!(render_report(&report, ReportFormat::Junit)
            .unwrap()
            .starts_with("<?xml"));
        assert!(render_report(&report, ReportFormat::Json)
            .unwrap()
            .contains("\"suite_name\""));
    }
}
