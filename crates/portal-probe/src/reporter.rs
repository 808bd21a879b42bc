//! Suite reports.
//!
//! A [`SuiteReport`] collects one [`ScenarioReport`] per selected scenario,
//! including the step log each scenario produced. Reports serialize to JSON
//! and render as a plain-text summary or a JUnit XML document.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fixture::NavigationStrategy;
use crate::result::PortalResult;
use crate::scenario::{Scenario, Tag};
use crate::steps::{StepRecord, StepStatus};

/// Scenario outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Fixture and body succeeded
    Passed,
    /// Fixture or body failed
    Failed,
    /// Not run (fail-fast stopped the suite)
    Skipped,
}

impl TestStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Marker used in text output
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        }
    }
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario identifier
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Tags
    pub tags: Vec<Tag>,
    /// Fixture strategy used
    pub fixture: NavigationStrategy,
    /// Outcome
    pub status: TestStatus,
    /// Wall-clock duration including fixture setup
    pub duration_ms: u64,
    /// Steps in start order
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    /// Error message if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Screenshot captured on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ScenarioReport {
    fn base(scenario: &Scenario, status: TestStatus, duration_ms: u64) -> Self {
        Self {
            name: scenario.name().to_string(),
            title: scenario.title().to_string(),
            tags: scenario.tags().to_vec(),
            fixture: scenario.fixture(),
            status,
            duration_ms,
            steps: Vec::new(),
            error: None,
            screenshot: None,
        }
    }

    /// Create a passing report
    #[must_use]
    pub fn passed(scenario: &Scenario, duration_ms: u64, steps: Vec<StepRecord>) -> Self {
        Self {
            steps,
            ..Self::base(scenario, TestStatus::Passed, duration_ms)
        }
    }

    /// Create a failing report
    #[must_use]
    pub fn failed(
        scenario: &Scenario,
        duration_ms: u64,
        steps: Vec<StepRecord>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            steps,
            error: Some(error.into()),
            ..Self::base(scenario, TestStatus::Failed, duration_ms)
        }
    }

    /// Create a skipped report
    #[must_use]
    pub fn skipped(scenario: &Scenario) -> Self {
        Self::base(scenario, TestStatus::Skipped, 0)
    }

    /// Attach the failure screenshot path
    #[must_use]
    pub fn with_screenshot(mut self, path: PathBuf) -> Self {
        self.screenshot = Some(path);
        self
    }

    /// Innermost failed step, if any
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .max_by_key(|s| s.depth)
    }
}

/// Results of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// Unique id of this run
    pub run_id: Uuid,
    /// Portal base URL the run targeted
    pub base_url: String,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time; `None` while running
    pub finished_at: Option<DateTime<Utc>>,
    /// One entry per selected scenario, in run order
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Empty report starting now
    #[must_use]
    pub fn new(suite_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            run_id: Uuid::new_v4(),
            base_url: base_url.into(),
            started_at: Utc::now(),
            finished_at: None,
            scenarios: Vec::new(),
        }
    }

    /// Append a scenario result
    pub fn record(&mut self, report: ScenarioReport) {
        self.scenarios.push(report);
    }

    /// Stamp the end time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Get number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    /// Get number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(TestStatus::Failed)
    }

    /// Get number of skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    fn count(&self, status: TestStatus) -> usize {
        self.scenarios.iter().filter(|s| s.status == status).count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Get pass rate (0.0 to 1.0) over scenarios that ran
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        let ran = self.passed_count() + self.failed_count();
        if ran == 0 {
            return 1.0;
        }
        self.passed_count() as f64 / ran as f64
    }

    /// No scenario failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Sum of scenario durations
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.scenarios.iter().map(|s| s.duration_ms).sum()
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.scenarios
            .iter()
            .filter(|s| s.status.is_failed())
            .collect()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} passed ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0
        );
        if self.skipped_count() > 0 {
            let _ = write!(line, ", {} skipped", self.skipped_count());
        }
        line
    }

    /// Per-scenario listing with nested steps, then the summary line
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for scenario in &self.scenarios {
            let _ = writeln!(
                out,
                "{} {} ({}ms)",
                scenario.status.symbol(),
                scenario.name,
                scenario.duration_ms
            );
            for step in &scenario.steps {
                let marker = match step.status {
                    StepStatus::Passed => "ok",
                    StepStatus::Failed => "failed",
                };
                let _ = writeln!(
                    out,
                    "{}- {} [{marker}]",
                    "  ".repeat(step.depth + 1),
                    step.name
                );
            }
            if let Some(error) = &scenario.error {
                let _ = writeln!(out, "    error: {error}");
            }
            if let Some(path) = &scenario.screenshot {
                let _ = writeln!(out, "    screenshot: {}", path.display());
            }
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }

    /// Pretty JSON
    pub fn to_json(&self) -> PortalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a report written by [`Self::to_json`]
    pub fn from_json(json: &str) -> PortalResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write JSON to `path`
    pub fn write_json(&self, path: &Path) -> PortalResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// JUnit XML document
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        let _ = writeln!(
            xml,
            r#"<testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}" timestamp="{}">"#,
            escape_xml(&self.suite_name),
            self.total_count(),
            self.failed_count(),
            self.skipped_count(),
            self.total_duration_ms() as f64 / 1000.0,
            self.started_at.to_rfc3339()
        );

        for scenario in &self.scenarios {
            let _ = writeln!(
                xml,
                r#"  <testcase name="{}" classname="{}" time="{:.3}">"#,
                escape_xml(&scenario.name),
                escape_xml(&self.suite_name),
                scenario.duration_ms as f64 / 1000.0
            );
            match scenario.status {
                TestStatus::Passed => {}
                TestStatus::Skipped => xml.push_str("    <skipped/>\n"),
                TestStatus::Failed => {
                    let error = scenario.error.as_deref().unwrap_or_default();
                    let _ = writeln!(
                        xml,
                        r#"    <failure message="{}">{}</failure>"#,
                        escape_xml(error),
                        escape_xml(error)
                    );
                }
            }
            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }

    /// Write JUnit XML to `path`
    pub fn write_junit(&self, path: &Path) -> PortalResult<()> {
        std::fs::write(path, self.render_junit())?;
        Ok(())
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scenario::find;

    fn scenario(name: &str) -> Scenario {
        find(name).unwrap()
    }

    fn step(name: &str, depth: usize, status: StepStatus) -> StepRecord {
        StepRecord {
            name: name.to_string(),
            depth,
            status,
            duration_ms: 1,
            error: None,
        }
    }

    fn mixed_report() -> SuiteReport {
        let mut report = SuiteReport::new("portal", "https://portal.test/hd/");
        report.record(ScenarioReport::passed(
            &scenario("search_word"),
            120,
            vec![step("Search", 0, StepStatus::Passed)],
        ));
        report.record(ScenarioReport::failed(
            &scenario("sort_most_popular"),
            80,
            vec![
                step("Change article sorting", 0, StepStatus::Passed),
                step("Verify article sorting", 0, StepStatus::Failed),
            ],
            "Assertion failed: expected <order>",
        ));
        report.record(ScenarioReport::skipped(&scenario("home_main_sections")));
        report.finish();
        report
    }

    mod status_tests {
        use super::*;

        #[test]
        fn test_status_predicates() {
            assert!(TestStatus::Passed.is_passed());
            assert!(TestStatus::Failed.is_failed());
            assert!(!TestStatus::Skipped.is_failed());
            assert!(!TestStatus::Skipped.is_passed());
        }
    }

    mod scenario_report_tests {
        use super::*;

        #[test]
        fn test_skipped_has_no_steps() {
            let report = ScenarioReport::skipped(&scenario("search_word"));
            assert_eq!(report.status, TestStatus::Skipped);
            assert!(report.steps.is_empty());
            assert_eq!(report.tags, vec![Tag::Smoke]);
        }

        #[test]
        fn test_failed_step_prefers_deepest() {
            let report = ScenarioReport::failed(
                &scenario("search_word"),
                5,
                vec![
                    step("outer", 0, StepStatus::Failed),
                    step("inner", 1, StepStatus::Failed),
                ],
                "boom",
            );
            assert_eq!(report.failed_step().unwrap().name, "inner");
        }
    }

    mod suite_report_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let report = mixed_report();
            assert_eq!(report.total_count(), 3);
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.skipped_count(), 1);
            assert!(!report.all_passed());
            assert_eq!(report.total_duration_ms(), 200);
            assert_eq!(report.failures()[0].name, "sort_most_popular");
        }

        #[test]
        fn test_summary() {
            assert_eq!(
                mixed_report().summary(),
                "portal: 1/3 passed (50.0%), 1 skipped"
            );
        }

        #[test]
        fn test_empty_report_passes() {
            let report = SuiteReport::new("portal", "https://portal.test/hd/");
            assert!(report.all_passed());
            assert!((report.pass_rate() - 1.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_text_lists_steps_and_errors() {
            let text = mixed_report().render_text();
            assert!(text.contains("PASS search_word (120ms)"));
            assert!(text.contains("  - Verify article sorting [failed]"));
            assert!(text.contains("error: Assertion failed"));
            assert!(text.contains("SKIP home_main_sections"));
        }

        #[test]
        fn test_json_round_trip() {
            let report = mixed_report();
            let parsed = SuiteReport::from_json(&report.to_json().unwrap()).unwrap();
            assert_eq!(parsed, report);
        }

        #[test]
        fn test_write_json() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("report.json");
            mixed_report().write_json(&path).unwrap();
            let written = std::fs::read_to_string(&path).unwrap();
            assert!(written.contains("\"sort_most_popular\""));
            assert!(written.contains("\"status\": \"skipped\""));
        }
    }

    mod junit_tests {
        use super::*;

        #[test]
        fn test_junit_counts_and_escaping() {
            let xml = mixed_report().render_junit();
            assert!(xml.starts_with("<?xml"));
            assert!(xml.contains(r#"tests="3" failures="1" skipped="1""#));
            assert!(xml.contains("expected &lt;order&gt;"));
            assert!(xml.contains("<skipped/>"));
            assert!(xml.trim_end().ends_with("</testsuite>"));
        }

        #[test]
        fn test_escape_xml() {
            assert_eq!(escape_xml(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
        }
    }
}
