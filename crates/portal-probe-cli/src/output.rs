//! Output formatting and progress reporting

use console::{style, Color, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use portal_probe::{ScenarioReport, SuiteReport, TestStatus};

/// Progress reporter for a suite run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar for `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = if self.term.is_term() {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Record one finished scenario
    pub fn scenario_finished(&self, report: &ScenarioReport) {
        let line = format!("{} ({}ms)", report.name, report.duration_ms);
        let message = match report.status {
            TestStatus::Passed if !self.quiet => {
                Some(self.prefixed("✓", "PASS", Color::Green, &line))
            }
            TestStatus::Failed => {
                let error = report.error.as_deref().unwrap_or("unknown error");
                Some(self.prefixed("✗", "FAIL", Color::Red, &format!("{line}: {error}")))
            }
            TestStatus::Skipped if !self.quiet => {
                Some(self.prefixed("-", "SKIP", Color::Yellow, &report.name))
            }
            TestStatus::Passed | TestStatus::Skipped => None,
        };
        if let Some(message) = message {
            self.println(message);
        }
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let line = self.prefixed("ℹ", "INFO", Color::Blue, message);
        let _ = self.term.write_line(&line);
    }

    /// Print the suite summary line
    pub fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let status = if failed > 0 { "FAILED" } else { "PASSED" };
        let status = if self.use_color {
            let colour = if failed > 0 {
                Style::new().red().bold()
            } else {
                Style::new().green().bold()
            };
            colour.apply_to(status).to_string()
        } else {
            status.to_string()
        };

        let secs = report.total_duration_ms() as f64 / 1000.0;
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "{status} {} scenarios in {secs:.2}s ({} passed, {failed} failed, {} skipped)",
            report.total_count(),
            report.passed_count(),
            report.skipped_count(),
        ));
    }

    fn prefixed(&self, symbol: &str, word: &str, colour: Color, message: &str) -> String {
        let prefix = if self.use_color {
            style(symbol).fg(colour).bold().to_string()
        } else {
            word.to_string()
        };
        format!("{prefix} {message}")
    }

    fn println(&self, line: String) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_hidden() => pb.println(line),
            _ => {
                let _ = self.term.write_line(&line);
            }
        }
    }
}
