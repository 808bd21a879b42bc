//! CLI configuration

use std::path::{Path, PathBuf};

use portal_probe::PortalConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliResult;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// From the `-v` count and `--quiet`
    #[must_use]
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Log filter used when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "portal_probe=info,warn",
            Self::Debug => "portal_probe=debug,info",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Command-line overrides layered over the portal configuration.
///
/// Precedence, lowest first: built-in defaults, the YAML file, environment
/// variables, then these flags.
#[derive(Debug, Clone, Default)]
pub struct PortalOverrides {
    /// YAML configuration file
    pub config_file: Option<PathBuf>,
    /// Portal base URL
    pub base_url: Option<String>,
    /// Show the browser window
    pub headed: bool,
    /// Chromium executable
    pub chromium_path: Option<PathBuf>,
    /// Uniform expectation/action timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Directory for failure screenshots
    pub screenshot_dir: Option<PathBuf>,
}

impl PortalOverrides {
    /// Resolve the effective configuration from the process environment
    pub fn resolve(&self) -> CliResult<PortalConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve the effective configuration with an arbitrary variable lookup
    pub fn resolve_with<F>(&self, lookup: F) -> CliResult<PortalConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.config_file {
            Some(path) => load_file(path)?,
            None => PortalConfig::default(),
        }
        .with_overrides_from(lookup)?;

        if let Some(url) = &self.base_url {
            config.base_url.clone_from(url);
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(path) = &self.chromium_path {
            config.browser.chromium_path = Some(path.clone());
        }
        if let Some(ms) = self.timeout_ms {
            config.timeouts.expect_ms = ms;
            config.timeouts.action_ms = ms;
        }
        if let Some(dir) = &self.screenshot_dir {
            config.screenshot_dir = Some(dir.clone());
        }
        Ok(config.validate()?)
    }
}

fn load_file(path: &Path) -> CliResult<PortalConfig> {
    tracing::debug!(path = %path.display(), "loading configuration file");
    Ok(PortalConfig::from_yaml_file(path)?)
}
