//! portal-probe CLI library
//!
//! Command-line front end for the Self Service Portal scenario suite:
//! argument parsing, configuration layering, progress output and report
//! export.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ListArgs, PortalArgs, ReportFormat, RunArgs,
    SelectionArgs, TagArg,
};
pub use config::{CliConfig, ColorChoice, PortalOverrides, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{outcome, render_report, write_report, Backend, TestRunner};
