//! Suite configuration: target portal, browser settings and timeouts.
//!
//! Loaded from YAML, then overridden by `PORTAL_BASE_URL`, `PORTAL_HEADLESS`
//! and `CHROMIUM_PATH` when those are set.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::result::{PortalError, PortalResult};
use crate::wait::{
    WaitOptions, DEFAULT_EXPECT_TIMEOUT_MS, DEFAULT_NAVIGATION_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS,
};

/// Portal the suite targets unless configured otherwise
pub const DEFAULT_BASE_URL: &str = "https://showcase-x.alloyservice.com/hd/";

/// Path fragment identifying the Knowledge Base page
pub const KNOWLEDGE_BASE_PATH: &str = "knowledgeBase";

/// Path fragment identifying the Search Results page
pub const SEARCH_RESULTS_PATH: &str = "searchResults";

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "PORTAL_BASE_URL";

/// Environment variable overriding headless mode
pub const ENV_HEADLESS: &str = "PORTAL_HEADLESS";

/// Environment variable pointing at a Chromium binary
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Chromium executable; auto-detected when unset
    pub chromium_path: Option<PathBuf>,
    /// Enable the Chromium sandbox
    pub sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chromium_path: None,
            sandbox: true,
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Polling expectations
    pub expect_ms: u64,
    /// Auto-waiting actions (click, fill, text reads)
    pub action_ms: u64,
    /// Navigations and load states
    pub navigation_ms: u64,
    /// Sleep between polls
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            expect_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            action_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            navigation_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Timeouts {
    /// Expectation timeout
    #[must_use]
    pub const fn expect(&self) -> Duration {
        Duration::from_millis(self.expect_ms)
    }

    /// Action timeout
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Navigation timeout
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wait options for expectations
    #[must_use]
    pub const fn expect_options(&self) -> WaitOptions {
        WaitOptions::new(self.expect(), self.poll_interval())
    }

    /// Uniform timeouts, handy for tests against in-memory pages
    #[must_use]
    pub const fn uniform(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            expect_ms: timeout_ms,
            action_ms: timeout_ms,
            navigation_ms: timeout_ms,
            poll_interval_ms,
        }
    }
}

/// Complete suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Portal root; always ends with `/` after [`PortalConfig::validate`]
    pub base_url: String,
    /// Browser settings
    pub browser: BrowserSettings,
    /// Timeouts
    pub timeouts: Timeouts,
    /// Where failure screenshots go; disabled when unset
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            screenshot_dir: None,
        }
    }
}

impl PortalConfig {
    /// Parse YAML; missing keys take defaults
    pub fn from_yaml_str(yaml: &str) -> PortalResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: &Path) -> PortalResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialise to YAML
    pub fn to_yaml(&self) -> PortalResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> PortalResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> PortalResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            tracing::debug!(base_url = %url, "base url overridden from environment");
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_HEADLESS) {
            self.browser.headless = parse_bool(&raw).ok_or_else(|| PortalError::Config {
                message: format!("{ENV_HEADLESS} must be a boolean, got {raw:?}"),
            })?;
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH) {
            self.browser.chromium_path = Some(PathBuf::from(path));
        }
        self.validate()
    }

    /// Check the base URL and normalise its trailing slash
    pub fn validate(mut self) -> PortalResult<Self> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PortalError::Config {
                message: format!("base_url must be an http(s) URL, got {url:?}"),
            });
        }
        self.base_url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        if self.timeouts.poll_interval_ms == 0 {
            return Err(PortalError::Config {
                message: "timeouts.poll_interval_ms must be positive".to_string(),
            });
        }
        Ok(self)
    }

    /// URL builder for this portal
    #[must_use]
    pub fn urls(&self) -> PortalUrls {
        PortalUrls::new(&self.base_url)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Well-known portal URLs, derived from the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalUrls {
    base: String,
}

impl PortalUrls {
    /// Build from a base URL; a trailing slash is added when missing
    #[must_use]
    pub fn new(base: &str) -> Self {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        Self { base }
    }

    /// Base URL
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Home page (the base URL itself)
    #[must_use]
    pub fn home(&self) -> String {
        self.base.clone()
    }

    /// Knowledge Base page
    #[must_use]
    pub fn knowledge_base(&self) -> String {
        format!("{}{KNOWLEDGE_BASE_PATH}", self.base)
    }

    /// One Knowledge Base category
    #[must_use]
    pub fn knowledge_base_category(&self, category_id: &str) -> String {
        format!("{}/{category_id}", self.knowledge_base())
    }

    /// Search Results page
    #[must_use]
    pub fn search_results(&self) -> String {
        format!("{}{SEARCH_RESULTS_PATH}", self.base)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_default_config() {
            let config = PortalConfig::default();
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert!(config.browser.headless);
            assert_eq!(config.timeouts.expect(), Duration::from_secs(5));
            assert!(config.screenshot_dir.is_none());
        }

        #[test]
        fn test_urls() {
            let urls = PortalConfig::default().urls();
            assert_eq!(urls.home(), "https://showcase-x.alloyservice.com/hd/");
            assert_eq!(
                urls.knowledge_base(),
                "https://showcase-x.alloyservice.com/hd/knowledgeBase"
            );
            assert_eq!(
                urls.search_results(),
                "https://showcase-x.alloyservice.com/hd/searchResults"
            );
            assert_eq!(
                urls.knowledge_base_category("42"),
                "https://showcase-x.alloyservice.com/hd/knowledgeBase/42"
            );
        }

        #[test]
        fn test_urls_add_trailing_slash() {
            assert_eq!(PortalUrls::new("http://x/hd").home(), "http://x/hd/");
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_takes_defaults() {
            let config = PortalConfig::from_yaml_str(
                "base_url: http://localhost:8080/hd\ntimeouts:\n  expect_ms: 250\n",
            )
            .unwrap();
            assert_eq!(config.base_url, "http://localhost:8080/hd/");
            assert_eq!(config.timeouts.expect_ms, 250);
            assert_eq!(config.timeouts.navigation_ms, DEFAULT_NAVIGATION_TIMEOUT_MS);
            assert_eq!(config.browser, BrowserSettings::default());
        }

        #[test]
        fn test_rejects_non_http_base() {
            let err = PortalConfig::from_yaml_str("base_url: ftp://x/").unwrap_err();
            assert!(matches!(err, PortalError::Config { .. }));
        }

        #[test]
        fn test_rejects_malformed_yaml() {
            let err = PortalConfig::from_yaml_str("timeouts: [1, 2").unwrap_err();
            assert!(matches!(err, PortalError::Yaml(_)));
        }

        #[test]
        fn test_yaml_round_trip_through_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("portal.yaml");
            let mut config = PortalConfig::default();
            config.browser.headless = false;
            std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
            assert_eq!(PortalConfig::from_yaml_file(&path).unwrap(), config);
        }
    }

    mod env_tests {
        use super::*;

        fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn test_overrides_apply() {
            let config = PortalConfig::default()
                .with_overrides_from(lookup(&[
                    (ENV_BASE_URL, "https://staging.example.com/hd"),
                    (ENV_HEADLESS, "false"),
                    (ENV_CHROMIUM_PATH, "/usr/bin/chromium"),
                ]))
                .unwrap();
            assert_eq!(config.base_url, "https://staging.example.com/hd/");
            assert!(!config.browser.headless);
            assert_eq!(
                config.browser.chromium_path,
                Some(PathBuf::from("/usr/bin/chromium"))
            );
        }

        #[test]
        fn test_no_overrides_is_identity() {
            let config = PortalConfig::default().with_overrides_from(lookup(&[])).unwrap();
            assert_eq!(config, PortalConfig::default());
        }

        #[test]
        fn test_bad_headless_value() {
            let err = PortalConfig::default()
                .with_overrides_from(lookup(&[(ENV_HEADLESS, "maybe")]))
                .unwrap_err();
            assert!(err.to_string().contains(ENV_HEADLESS));
        }
    }
}
