//! portal-probe: end-to-end scenarios for the Self Service Portal
//!
//! ## Usage
//!
//! ```bash
//! portal-probe list --tag smoke              # What would run
//! portal-probe run                           # Whole suite in headless Chromium
//! portal-probe run --tag smoke --fail-fast   # Smoke scenarios only
//! portal-probe run --offline --format junit  # Against the simulated portal
//! portal-probe config --base-url https://…   # Effective configuration
//! ```

use std::process::ExitCode;

use clap::Parser;
use portal_probe::{catalogue, Scenario};
use portal_probe_cli::{
    outcome, render_report, write_report, Backend, Cli, CliConfig, CliResult, Commands,
    ConfigArgs, ListArgs, RunArgs, TestRunner, Verbosity,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match cli.command {
        Commands::List(args) => run_list(&args),
        Commands::Run(args) => run_suite(config, args),
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.into())
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Serialize)]
struct ListedScenario<'a> {
    name: &'a str,
    title: &'a str,
    tags: Vec<String>,
    fixture: String,
}

impl<'a> From<&'a Scenario> for ListedScenario<'a> {
    fn from(scenario: &'a Scenario) -> Self {
        Self {
            name: scenario.name(),
            title: scenario.title(),
            tags: scenario.tags().iter().map(ToString::to_string).collect(),
            fixture: scenario.fixture().to_string(),
        }
    }
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    let selected = args.selection.to_filter().select(&catalogue());
    let listed: Vec<ListedScenario<'_>> = selected.iter().map(ListedScenario::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    for scenario in &listed {
        println!(
            "{:<28} {:<20} {:<16} {}",
            scenario.name,
            scenario.tags.join(" "),
            scenario.fixture,
            scenario.title
        );
    }
    Ok(())
}

fn run_suite(config: CliConfig, args: RunArgs) -> CliResult<()> {
    let portal = args.portal.to_overrides().resolve()?;
    let backend = if args.offline {
        Backend::Offline
    } else {
        Backend::Chromium
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let mut runner = TestRunner::new(config);
    let report = runtime.block_on(runner.run(
        portal,
        args.selection.to_filter(),
        args.fail_fast,
        backend,
    ))?;

    println!("{}", render_report(&report, args.format)?);
    if let Some(ref path) = args.output {
        write_report(&report, args.format, path)?;
    }
    outcome(&report)
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let portal = args.portal.to_overrides().resolve()?;
    print!("{}", portal.to_yaml()?);
    Ok(())
}
