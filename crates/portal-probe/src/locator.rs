//! Locator abstraction for element selection and interaction.
//!
//! A [`Locator`] is a declarative query plus a handle to the page it runs
//! against. It never caches elements: every call re-resolves the
//! [`Selector`] on the live page.
//!
//! # Design Philosophy
//!
//! - **Semantic first**: role + accessible name and text patterns are the
//!   primary strategies; CSS exists for fallbacks only
//! - **Auto-Waiting**: actions wait for the target to exist and be visible
//! - **Strict Selection**: actions fail if several elements match
//! - **Fluent API**: chainable scoping, filtering and indexing

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::driver::{ElementSnapshot, PageDriver};
use crate::result::{PortalError, PortalResult};
use crate::wait::{
    poll, PollOutcome, Probe, WaitOptions, DEFAULT_EXPECT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
};

/// Collapse runs of whitespace to single spaces and trim the ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How a piece of rendered text is matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TextMatch {
    /// Case-insensitive substring on whitespace-normalised text
    Substring {
        /// Needle
        text: String,
    },
    /// Exact, case-sensitive match on whitespace-normalised text
    Exact {
        /// Expected text
        text: String,
    },
    /// Regular expression, in the common subset of Rust and ECMAScript syntax
    Pattern {
        /// Pattern source
        source: String,
        /// Match case-insensitively
        ignore_case: bool,
    },
}

impl TextMatch {
    /// Case-insensitive substring match
    #[must_use]
    pub fn substring(text: impl Into<String>) -> Self {
        Self::Substring { text: text.into() }
    }

    /// Exact match
    #[must_use]
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact { text: text.into() }
    }

    /// Regular expression match
    #[must_use]
    pub fn pattern(source: impl Into<String>) -> Self {
        Self::Pattern {
            source: source.into(),
            ignore_case: false,
        }
    }

    /// Case-insensitive regular expression match
    #[must_use]
    pub fn pattern_ignore_case(source: impl Into<String>) -> Self {
        Self::Pattern {
            source: source.into(),
            ignore_case: true,
        }
    }

    /// Check a candidate string against this matcher.
    ///
    /// An invalid pattern matches nothing.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = normalize_whitespace(candidate);
        match self {
            Self::Substring { text } => candidate
                .to_lowercase()
                .contains(&normalize_whitespace(text).to_lowercase()),
            Self::Exact { text } => candidate == normalize_whitespace(text),
            Self::Pattern {
                source,
                ignore_case,
            } => RegexBuilder::new(source)
                .case_insensitive(*ignore_case)
                .build()
                .is_ok_and(|re| re.is_match(&candidate)),
        }
    }
}

impl From<&str> for TextMatch {
    fn from(text: &str) -> Self {
        Self::substring(text)
    }
}

impl From<String> for TextMatch {
    fn from(text: String) -> Self {
        Self::substring(text)
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring { text } => write!(f, "~{text:?}"),
            Self::Exact { text } => write!(f, "={text:?}"),
            Self::Pattern {
                source,
                ignore_case,
            } => write!(f, "/{source}/{}", if *ignore_case { "i" } else { "" }),
        }
    }
}

/// ARIA roles the portal's pages are queried by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    /// `button`, `input[type=button|submit]`
    Button,
    /// `a[href]`
    Link,
    /// `h1`..`h6`
    Heading,
    /// `input[type=text]`, `textarea`
    Textbox,
    /// `input[type=search]`
    Searchbox,
    /// `nav`
    Navigation,
    /// Category tree
    Tree,
    /// Tree node
    Treeitem,
    /// `ul`, `ol`
    List,
    /// `li`
    Listitem,
    /// `select` and custom dropdowns
    Combobox,
    /// Dropdown popup
    Listbox,
    /// Dropdown entry
    Option,
    /// `main`
    Main,
    /// Landmark region
    Region,
}

impl AriaRole {
    /// Role name as it appears in markup
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Link => "link",
            Self::Heading => "heading",
            Self::Textbox => "textbox",
            Self::Searchbox => "searchbox",
            Self::Navigation => "navigation",
            Self::Tree => "tree",
            Self::Treeitem => "treeitem",
            Self::List => "list",
            Self::Listitem => "listitem",
            Self::Combobox => "combobox",
            Self::Listbox => "listbox",
            Self::Option => "option",
            Self::Main => "main",
            Self::Region => "region",
        }
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css {
        /// Selector source
        css: String,
    },
    /// Accessible role, optionally narrowed by accessible name and heading level
    Role {
        /// ARIA role
        role: AriaRole,
        /// Accessible name
        name: Option<TextMatch>,
        /// Heading level (headings only)
        level: Option<u8>,
    },
    /// Smallest elements whose text content matches
    Text {
        /// Text matcher
        text: TextMatch,
    },
    /// `child` resolved inside elements matching `parent`
    Within {
        /// Scope
        parent: Box<Selector>,
        /// Query inside the scope
        child: Box<Selector>,
    },
    /// Elements of `base` whose text content matches
    HasText {
        /// Base selector
        base: Box<Selector>,
        /// Text filter
        text: TextMatch,
    },
    /// One element of `base` by position; negative counts from the end
    Nth {
        /// Base selector
        base: Box<Selector>,
        /// Position
        index: i32,
    },
    /// Union of two selectors, in document order
    Or {
        /// Preferred selector
        first: Box<Selector>,
        /// Alternative selector
        second: Box<Selector>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            css: selector.into(),
        }
    }

    /// Create a role selector
    #[must_use]
    pub const fn role(role: AriaRole) -> Self {
        Self::Role {
            role,
            name: None,
            level: None,
        }
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<TextMatch>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Narrow a role selector by accessible name (case-insensitive substring)
    ///
    /// Non-role selectors are returned unchanged.
    #[must_use]
    pub fn named(self, name: impl Into<TextMatch>) -> Self {
        match self {
            Self::Role { role, level, .. } => Self::Role {
                role,
                name: Some(name.into()),
                level,
            },
            other => other,
        }
    }

    /// Narrow a role selector by exact accessible name
    #[must_use]
    pub fn named_exact(self, name: impl Into<String>) -> Self {
        self.named(TextMatch::exact(name))
    }

    /// Narrow a heading selector by level
    ///
    /// Non-role selectors are returned unchanged.
    #[must_use]
    pub fn level(self, level: u8) -> Self {
        match self {
            Self::Role { role, name, .. } => Self::Role {
                role,
                name,
                level: Some(level),
            },
            other => other,
        }
    }

    /// Resolve `child` inside this selector's matches
    #[must_use]
    pub fn within(self, child: Self) -> Self {
        Self::Within {
            parent: Box::new(self),
            child: Box::new(child),
        }
    }

    /// Keep matches whose text content matches
    #[must_use]
    pub fn has_text(self, text: impl Into<TextMatch>) -> Self {
        Self::HasText {
            base: Box::new(self),
            text: text.into(),
        }
    }

    /// Pick one match by position
    #[must_use]
    pub fn nth(self, index: i32) -> Self {
        Self::Nth {
            base: Box::new(self),
            index,
        }
    }

    /// Union with an alternative selector
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or {
            first: Box::new(self),
            second: Box::new(other),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { css } => write!(f, "css={css}"),
            Self::Role { role, name, level } => {
                write!(f, "role={role}")?;
                if let Some(name) = name {
                    write!(f, "[name{name}]")?;
                }
                if let Some(level) = level {
                    write!(f, "[level={level}]")?;
                }
                Ok(())
            }
            Self::Text { text } => write!(f, "text{text}"),
            Self::Within { parent, child } => write!(f, "{parent} >> {child}"),
            Self::HasText { base, text } => write!(f, "{base} >> has-text{text}"),
            Self::Nth { base, index } => write!(f, "{base} >> nth={index}"),
            Self::Or { first, second } => write!(f, "({first}) or ({second})"),
        }
    }
}

/// Locator options for customizing behavior
#[derive(Debug, Clone, Copy)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting actions
    pub timeout: Duration,
    /// Timeout for polling expectations
    pub expect_timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether actions require a single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_EXPECT_TIMEOUT_MS),
            expect_timeout: Duration::from_millis(DEFAULT_EXPECT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            strict: true,
        }
    }
}

impl LocatorOptions {
    pub(crate) const fn wait_options(&self) -> WaitOptions {
        WaitOptions::new(self.timeout, self.poll_interval)
    }

    pub(crate) const fn expect_options(&self) -> WaitOptions {
        WaitOptions::new(self.expect_timeout, self.poll_interval)
    }
}

/// A lazily-resolved handle to zero or more elements on a live page.
#[derive(Clone)]
pub struct Locator {
    driver: Arc<dyn PageDriver>,
    selector: Selector,
    options: LocatorOptions,
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator")
            .field("selector", &self.selector.to_string())
            .field("options", &self.options)
            .finish()
    }
}

impl Locator {
    /// Create a locator bound to a driver
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, selector: Selector, options: LocatorOptions) -> Self {
        Self {
            driver,
            selector,
            options,
        }
    }

    fn derive(&self, selector: Selector) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            selector,
            options: self.options,
        }
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Set a custom action timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Disable strict mode (allow multiple matches, act on the first)
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Resolve `selector` inside this locator's matches
    #[must_use]
    pub fn locator(&self, selector: Selector) -> Self {
        self.derive(self.selector.clone().within(selector))
    }

    /// Scoped role query
    #[must_use]
    pub fn get_by_role(&self, role: AriaRole, name: impl Into<TextMatch>) -> Self {
        self.locator(Selector::role(role).named(name))
    }

    /// Scoped text query
    #[must_use]
    pub fn get_by_text(&self, text: impl Into<TextMatch>) -> Self {
        self.locator(Selector::text(text))
    }

    /// Keep matches whose text content matches
    #[must_use]
    pub fn filter_has_text(&self, text: impl Into<TextMatch>) -> Self {
        self.derive(self.selector.clone().has_text(text))
    }

    /// First match
    #[must_use]
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Last match
    #[must_use]
    pub fn last(&self) -> Self {
        self.nth(-1)
    }

    /// Match by position
    #[must_use]
    pub fn nth(&self, index: i32) -> Self {
        self.derive(self.selector.clone().nth(index))
    }

    /// Union with another locator on the same page
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        self.derive(self.selector.clone().or(other.selector.clone()))
    }

    /// Snapshot every current match
    pub async fn query(&self) -> PortalResult<Vec<ElementSnapshot>> {
        self.driver.query(&self.selector).await
    }

    /// Number of current matches
    pub async fn count(&self) -> PortalResult<usize> {
        Ok(self.query().await?.len())
    }

    /// Whether the first current match is visible (no waiting)
    pub async fn is_visible(&self) -> PortalResult<bool> {
        Ok(self.query().await?.first().is_some_and(|e| e.visible))
    }

    /// Text content of every current match (no waiting)
    pub async fn all_text_contents(&self) -> PortalResult<Vec<String>> {
        Ok(self
            .query()
            .await?
            .into_iter()
            .map(|e| e.text.unwrap_or_default())
            .collect())
    }

    /// Wait for a single attached target and return its snapshot
    async fn resolve_target(&self, require_visible: bool) -> PortalResult<ElementSnapshot> {
        let strict = self.options.strict;
        let selector = &self.selector;
        let outcome = poll(&self.options.wait_options(), || async move {
            let matches = self.driver.query(selector).await?;
            if strict && matches.len() > 1 {
                return Err(PortalError::StrictModeViolation {
                    selector: selector.to_string(),
                    count: matches.len(),
                });
            }
            Ok(match matches.into_iter().next() {
                Some(element) if element.visible || !require_visible => Probe::Ready(element),
                Some(_) => Probe::Pending("attached but hidden".to_string()),
                None => Probe::Pending("no match".to_string()),
            })
        })
        .await?;

        match outcome {
            PollOutcome::Ready(element) => Ok(element),
            PollOutcome::TimedOut { observed, elapsed } => Err(PortalError::ElementNotFound {
                selector: format!(
                    "{} ({observed} after {}ms)",
                    self.selector,
                    elapsed.as_millis()
                ),
            }),
        }
    }

    /// Wait until the target is visible, with an explicit timeout
    pub async fn wait_for_visible(&self, timeout: Duration) -> PortalResult<()> {
        self.clone().with_timeout(timeout).resolve_target(true).await?;
        Ok(())
    }

    /// Text content of the single target; `None` when it has none
    pub async fn text_content(&self) -> PortalResult<Option<String>> {
        Ok(self.resolve_target(false).await?.text)
    }

    /// Current value of the single input target
    pub async fn input_value(&self) -> PortalResult<String> {
        self.resolve_target(false)
            .await?
            .value
            .ok_or_else(|| PortalError::driver(format!("{} is not an input", self.selector)))
    }

    /// Click the target once it is visible
    pub async fn click(&self) -> PortalResult<()> {
        self.resolve_target(true).await?;
        tracing::debug!(selector = %self.selector, "click");
        self.driver.click(&self.selector, 0).await
    }

    /// Replace the target's value
    pub async fn fill(&self, value: &str) -> PortalResult<()> {
        self.resolve_target(true).await?;
        tracing::debug!(selector = %self.selector, value, "fill");
        self.driver.fill(&self.selector, 0, value).await
    }

    /// Empty the target's value
    pub async fn clear(&self) -> PortalResult<()> {
        self.fill("").await
    }
}
