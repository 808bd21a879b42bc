//! Polling expectations for locators and pages.
//!
//! `expect(&locator).to_be_visible().await?` re-queries the page until the
//! condition holds or the expectation timeout elapses, then fails with
//! [`PortalError::AssertionFailed`] naming the selector, the expectation
//! and the last observed state.

use std::future::IntoFuture;
use std::ops::RangeInclusive;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::browser::Page;
use crate::driver::ElementSnapshot;
use crate::locator::{Locator, TextMatch};
use crate::result::{PortalError, PortalResult};
use crate::wait::{poll_until, Probe, WaitOptions};

/// Condition on a locator's matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorCondition {
    /// Single match, visible
    Visible,
    /// No visible match
    Hidden,
    /// Exact number of matches
    Count(usize),
    /// Number of matches within bounds
    CountIn(RangeInclusive<usize>),
    /// Single form control with this value
    Value(String),
    /// Single match whose text matches
    Text(TextMatch),
    /// Single match whose text contains a substring
    ContainsText(String),
}

impl std::fmt::Display for LocatorCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Visible => write!(f, "to be visible"),
            Self::Hidden => write!(f, "to be hidden"),
            Self::Count(n) => write!(f, "to have count {n}"),
            Self::CountIn(range) => {
                write!(f, "to have count in {}..={}", range.start(), range.end())
            }
            Self::Value(value) => write!(f, "to have value {value:?}"),
            Self::Text(text) => write!(f, "to have text {text}"),
            Self::ContainsText(text) => write!(f, "to contain text {text:?}"),
        }
    }
}

/// Smart assertion builder for locators (Playwright's `expect()`)
#[derive(Debug, Clone)]
pub struct Expect {
    locator: Locator,
}

impl Expect {
    /// Create a new expectation for a locator
    #[must_use]
    pub const fn new(locator: Locator) -> Self {
        Self { locator }
    }

    fn assert(&self, condition: LocatorCondition) -> ExpectAssertion {
        let options = self.locator.options().expect_options();
        ExpectAssertion {
            locator: self.locator.clone(),
            condition,
            options,
        }
    }

    /// Assert the element is visible
    pub fn to_be_visible(&self) -> ExpectAssertion {
        self.assert(LocatorCondition::Visible)
    }

    /// Assert the element is hidden or absent
    pub fn to_be_hidden(&self) -> ExpectAssertion {
        self.assert(LocatorCondition::Hidden)
    }

    /// Assert the element count
    pub fn to_have_count(&self, count: usize) -> ExpectAssertion {
        self.assert(LocatorCondition::Count(count))
    }

    /// Assert the element count falls within bounds
    pub fn to_have_count_in(&self, range: RangeInclusive<usize>) -> ExpectAssertion {
        self.assert(LocatorCondition::CountIn(range))
    }

    /// Assert the input value
    pub fn to_have_value(&self, value: impl Into<String>) -> ExpectAssertion {
        self.assert(LocatorCondition::Value(value.into()))
    }

    /// Assert the element text
    pub fn to_have_text(&self, text: impl Into<TextMatch>) -> ExpectAssertion {
        self.assert(LocatorCondition::Text(text.into()))
    }

    /// Assert the element contains text
    pub fn to_contain_text(&self, text: impl Into<String>) -> ExpectAssertion {
        self.assert(LocatorCondition::ContainsText(text.into()))
    }
}

/// A pending locator expectation; await it to run
#[derive(Debug, Clone)]
pub struct ExpectAssertion {
    locator: Locator,
    condition: LocatorCondition,
    options: WaitOptions,
}

impl ExpectAssertion {
    /// Override the expectation timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    /// The condition being asserted
    #[must_use]
    pub const fn condition(&self) -> &LocatorCondition {
        &self.condition
    }

    fn single(&self, matches: Vec<ElementSnapshot>) -> PortalResult<Option<ElementSnapshot>> {
        if self.locator.options().strict && matches.len() > 1 {
            return Err(PortalError::StrictModeViolation {
                selector: self.locator.selector().to_string(),
                count: matches.len(),
            });
        }
        Ok(matches.into_iter().next())
    }

    fn check(&self, matches: Vec<ElementSnapshot>) -> PortalResult<Probe<()>> {
        let verdict = |ok: bool, observed: String| {
            if ok {
                Probe::Ready(())
            } else {
                Probe::Pending(observed)
            }
        };
        Ok(match &self.condition {
            LocatorCondition::Visible => match self.single(matches)? {
                Some(element) => verdict(element.visible, "hidden".to_string()),
                None => Probe::Pending("no match".to_string()),
            },
            LocatorCondition::Hidden => {
                let visible = matches.iter().filter(|m| m.visible).count();
                verdict(visible == 0, format!("{visible} visible"))
            }
            LocatorCondition::Count(expected) => {
                verdict(matches.len() == *expected, format!("count {}", matches.len()))
            }
            LocatorCondition::CountIn(range) => {
                verdict(range.contains(&matches.len()), format!("count {}", matches.len()))
            }
            LocatorCondition::Value(expected) => match self.single(matches)? {
                Some(element) => verdict(
                    element.value.as_deref() == Some(expected.as_str()),
                    format!("value {:?}", element.value.unwrap_or_default()),
                ),
                None => Probe::Pending("no match".to_string()),
            },
            LocatorCondition::Text(expected) => match self.single(matches)? {
                Some(element) => {
                    let text = element.text.unwrap_or_default();
                    verdict(expected.matches(&text), format!("text {text:?}"))
                }
                None => Probe::Pending("no match".to_string()),
            },
            LocatorCondition::ContainsText(expected) => match self.single(matches)? {
                Some(element) => {
                    let text = element.text.unwrap_or_default();
                    verdict(
                        TextMatch::substring(expected.as_str()).matches(&text),
                        format!("text {text:?}"),
                    )
                }
                None => Probe::Pending("no match".to_string()),
            },
        })
    }

    /// Poll until the condition holds
    pub async fn verify(self) -> PortalResult<()> {
        let expectation = format!("{} {}", self.locator.selector(), self.condition);
        let this = &self;
        poll_until(&expectation, &self.options, || async move {
            this.check(this.locator.query().await?)
        })
        .await
    }
}

impl IntoFuture for ExpectAssertion {
    type Output = PortalResult<()>;
    type IntoFuture = BoxFuture<'static, PortalResult<()>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.verify())
    }
}

/// Create an expectation for a locator (Playwright-style)
#[must_use]
pub fn expect(locator: &Locator) -> Expect {
    Expect::new(locator.clone())
}

/// Condition on the page as a whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCondition {
    /// Document title matches
    Title(TextMatch),
    /// Current URL matches
    Url(TextMatch),
}

/// Assertion builder for pages
#[derive(Debug, Clone)]
pub struct PageExpect {
    page: Page,
}

impl PageExpect {
    fn assert(&self, condition: PageCondition) -> PageAssertion {
        PageAssertion {
            page: self.page.clone(),
            condition,
            options: self.page.timeouts().expect_options(),
        }
    }

    /// Assert the document title
    pub fn to_have_title(&self, title: impl Into<TextMatch>) -> PageAssertion {
        self.assert(PageCondition::Title(title.into()))
    }

    /// Assert the current URL
    pub fn to_have_url(&self, url: impl Into<TextMatch>) -> PageAssertion {
        self.assert(PageCondition::Url(url.into()))
    }
}

/// A pending page expectation; await it to run
#[derive(Debug, Clone)]
pub struct PageAssertion {
    page: Page,
    condition: PageCondition,
    options: WaitOptions,
}

impl PageAssertion {
    /// Override the expectation timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    async fn probe(&self) -> PortalResult<Probe<()>> {
        let (matcher, actual) = match &self.condition {
            PageCondition::Title(m) => (m, self.page.title().await?),
            PageCondition::Url(m) => (m, self.page.url().await?),
        };
        Ok(if matcher.matches(&actual) {
            Probe::Ready(())
        } else {
            Probe::Pending(format!("{actual:?}"))
        })
    }

    /// Poll until the condition holds
    pub async fn verify(self) -> PortalResult<()> {
        let expectation = match &self.condition {
            PageCondition::Title(m) => format!("page title {m}"),
            PageCondition::Url(m) => format!("page url {m}"),
        };
        let this = &self;
        poll_until(&expectation, &self.options, || this.probe()).await
    }
}

impl IntoFuture for PageAssertion {
    type Output = PortalResult<()>;
    type IntoFuture = BoxFuture<'static, PortalResult<()>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.verify())
    }
}

/// Create an expectation for a page
#[must_use]
pub fn expect_page(page: &Page) -> PageExpect {
    PageExpect { page: page.clone() }
}
