//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use portal_probe::{ScenarioFilter, Tag};
use std::path::PathBuf;

use crate::config::{ColorChoice, PortalOverrides};

/// portal-probe: end-to-end scenarios for the Self Service Portal
#[derive(Parser, Debug)]
#[command(name = "portal-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List scenarios
    List(ListArgs),

    /// Run scenarios
    Run(RunArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Scenario selection shared by `list` and `run`
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Only scenarios with this tag (repeatable)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<TagArg>,

    /// Only scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,
}

impl SelectionArgs {
    /// Scenario filter for these arguments
    #[must_use]
    pub fn to_filter(&self) -> ScenarioFilter {
        let filter = self
            .tags
            .iter()
            .fold(ScenarioFilter::new(), |f, tag| f.with_tag((*tag).into()));
        match &self.filter {
            Some(needle) => filter.with_name(needle.clone()),
            None => filter,
        }
    }
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Scenario selection
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Portal configuration flags shared by `run` and `config`
#[derive(Args, Debug, Clone, Default)]
pub struct PortalArgs {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Portal base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, value_name = "PATH")]
    pub chromium: Option<PathBuf>,

    /// Expectation and action timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Save a screenshot of every failed scenario here
    #[arg(long, value_name = "DIR")]
    pub screenshots: Option<PathBuf>,
}

impl PortalArgs {
    /// Overrides for configuration resolution
    #[must_use]
    pub fn to_overrides(&self) -> PortalOverrides {
        PortalOverrides {
            config_file: self.config.clone(),
            base_url: self.base_url.clone(),
            headed: self.headed,
            chromium_path: self.chromium.clone(),
            timeout_ms: self.timeout,
            screenshot_dir: self.screenshots.clone(),
        }
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario selection
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Portal configuration
    #[command(flatten)]
    pub portal: PortalArgs,

    /// Fail fast on first error
    #[arg(long)]
    pub fail_fast: bool,

    /// Run against the built-in simulated portal instead of a browser
    #[arg(long)]
    pub offline: bool,

    /// Report format printed to stdout
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,

    /// Also write the report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Portal configuration
    #[command(flatten)]
    pub portal: PortalArgs,
}

/// Report output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
    /// JUnit XML
    Junit,
}

/// Scenario tag
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagArg {
    /// @smoke
    Smoke,
    /// @regression
    Regression,
}

impl From<TagArg> for Tag {
    fn from(arg: TagArg) -> Self {
        match arg {
            TagArg::Smoke => Self::Smoke,
            TagArg::Regression => Self::Regression,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Always => Self::Always,
            ColorArg::Auto => Self::Auto,
            ColorArg::Never => Self::Never,
        }
    }
}
