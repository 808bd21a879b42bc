//! In-memory driver for unit testing page objects without a browser.
//!
//! A [`MockDocument`] is a flat arena of [`MockElement`]s linked by parent
//! index. [`MockDriver`] serves documents from a URL resolver closure and
//! applies [`MockAction`]s when elements are clicked, which is enough to
//! model menus that reveal links, links that navigate and search forms.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{ElementSnapshot, PageDriver};
use crate::locator::{normalize_whitespace, AriaRole, Selector, TextMatch};
use crate::result::{PortalError, PortalResult};
use crate::wait::LoadState;

pub mod portal;

/// Effect of clicking a mock element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    /// Load the document the resolver returns for this URL
    Navigate(String),
    /// Make elements with these keys visible
    Reveal(Vec<String>),
    /// Navigate to `{url}?q={value of the input keyed `input`}`
    Search {
        /// Key of the input element
        input: String,
        /// Results URL without query
        url: String,
    },
}

/// One element in a mock document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Tag name, used by CSS matching
    pub tag: String,
    /// ARIA role
    pub role: Option<AriaRole>,
    /// Explicit accessible name; falls back to text content
    pub name: Option<String>,
    /// Own text, excluding children
    pub text: String,
    /// Heading level
    pub level: Option<u8>,
    /// CSS classes
    pub classes: Vec<String>,
    /// Handle for actions and tests
    pub key: Option<String>,
    /// Own visibility; ancestors must also be visible
    pub visible: bool,
    /// Form control value; `None` for non-inputs
    pub value: Option<String>,
    /// Click behaviour
    pub on_click: Option<MockAction>,
    parent: Option<usize>,
}

impl MockElement {
    /// Visible element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role: None,
            name: None,
            text: String::new(),
            level: None,
            classes: Vec::new(),
            key: None,
            visible: true,
            value: None,
            on_click: None,
            parent: None,
        }
    }

    /// `<button>` whose name comes from its text
    #[must_use]
    pub fn button(text: impl Into<String>) -> Self {
        Self::new("button").role(AriaRole::Button).text(text)
    }

    /// `<a href>` navigating to `href`
    #[must_use]
    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self::new("a")
            .role(AriaRole::Link)
            .text(text)
            .on_click(MockAction::Navigate(href.into()))
    }

    /// `<hN>`
    #[must_use]
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(format!("h{level}"))
            .role(AriaRole::Heading)
            .level(level)
            .text(text)
    }

    /// Empty text `<input>` labelled `name`
    #[must_use]
    pub fn textbox(name: impl Into<String>) -> Self {
        Self::new("input")
            .role(AriaRole::Textbox)
            .name(name)
            .value("")
    }

    /// `<li>`
    #[must_use]
    pub fn listitem(text: impl Into<String>) -> Self {
        Self::new("li").role(AriaRole::Listitem).text(text)
    }

    /// Set role
    #[must_use]
    pub const fn role(mut self, role: AriaRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Set explicit accessible name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set heading level
    #[must_use]
    pub const fn level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Add a CSS class
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set key
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Make this a form control with a value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set click behaviour
    #[must_use]
    pub fn on_click(mut self, action: MockAction) -> Self {
        self.on_click = Some(action);
        self
    }

    /// Compound `tag.class.class` matching; anything richer matches nothing
    fn matches_css(&self, css: &str) -> bool {
        if css.is_empty() || css.contains(|c: char| "[]#:>+~ *,".contains(c)) {
            return false;
        }
        let mut parts = css.split('.');
        let tag = parts.next().unwrap_or_default();
        (tag.is_empty() || tag.eq_ignore_ascii_case(&self.tag))
            && parts.all(|class| !class.is_empty() && self.classes.iter().any(|c| c == class))
    }
}

/// A page's worth of mock elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDocument {
    title: String,
    elements: Vec<MockElement>,
}

impl MockDocument {
    /// Empty document
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }

    /// Document title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// All elements in insertion order
    #[must_use]
    pub fn elements(&self) -> &[MockElement] {
        &self.elements
    }

    /// Append a root element, returning its index
    pub fn push(&mut self, element: MockElement) -> usize {
        self.elements.push(MockElement {
            parent: None,
            ..element
        });
        self.elements.len() - 1
    }

    /// Append a child of `parent`, returning its index
    pub fn push_child(&mut self, parent: usize, element: MockElement) -> usize {
        self.elements.push(MockElement {
            parent: Some(parent),
            ..element
        });
        self.elements.len() - 1
    }

    /// Element by key
    #[must_use]
    pub fn find_key(&self, key: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.key.as_deref() == Some(key))
    }

    fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.parent == Some(index))
            .map(|(i, _)| i)
    }

    fn full_text(&self, index: usize) -> String {
        let mut parts = vec![self.elements[index].text.clone()];
        parts.extend(self.children(index).map(|child| self.full_text(child)));
        normalize_whitespace(&parts.join(" "))
    }

    fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.elements[index].parent, |&i| self.elements[i].parent)
    }

    fn is_visible(&self, index: usize) -> bool {
        self.elements[index].visible && self.ancestors(index).all(|i| self.elements[i].visible)
    }

    fn accessible_name(&self, index: usize) -> String {
        self.elements[index]
            .name
            .clone()
            .unwrap_or_else(|| self.full_text(index))
    }

    fn snapshot(&self, index: usize) -> ElementSnapshot {
        ElementSnapshot {
            text: Some(self.full_text(index)),
            visible: self.is_visible(index),
            value: self.elements[index].value.clone(),
        }
    }

    fn matches_text(&self, index: usize, text: &TextMatch) -> bool {
        text.matches(&self.full_text(index))
    }

    /// Indices matching `selector`, ascending
    #[must_use]
    pub fn resolve(&self, selector: &Selector) -> Vec<usize> {
        let all = 0..self.elements.len();
        match selector {
            Selector::Css { css } => all
                .filter(|&i| self.elements[i].matches_css(css))
                .collect(),
            Selector::Role { role, name, level } => all
                .filter(|&i| {
                    let element = &self.elements[i];
                    element.role == Some(*role)
                        && level.map_or(true, |l| element.level == Some(l))
                        && name
                            .as_ref()
                            .map_or(true, |n| n.matches(&self.accessible_name(i)))
                })
                .collect(),
            Selector::Text { text } => all
                .filter(|&i| {
                    self.matches_text(i, text)
                        && !self.children(i).any(|c| self.matches_text(c, text))
                })
                .collect(),
            Selector::Within { parent, child } => {
                let scopes = self.resolve(parent);
                self.resolve(child)
                    .into_iter()
                    .filter(|&i| self.ancestors(i).any(|a| scopes.contains(&a)))
                    .collect()
            }
            Selector::HasText { base, text } => self
                .resolve(base)
                .into_iter()
                .filter(|&i| self.matches_text(i, text))
                .collect(),
            Selector::Nth { base, index } => {
                let matches = self.resolve(base);
                let position = if *index < 0 {
                    matches.len().checked_sub(index.unsigned_abs() as usize)
                } else {
                    Some(*index as usize)
                };
                position
                    .and_then(|p| matches.get(p).copied())
                    .into_iter()
                    .collect()
            }
            Selector::Or { first, second } => {
                let mut union = self.resolve(first);
                union.extend(self.resolve(second));
                union.sort_unstable();
                union.dedup();
                union
            }
        }
    }
}

/// Extract a query parameter from a URL, without percent-decoding
#[must_use]
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Maps a URL to the document served there
pub type DocumentResolver = dyn Fn(&str) -> Option<MockDocument> + Send + Sync;

#[derive(Debug)]
struct MockState {
    url: String,
    document: MockDocument,
    history: Vec<String>,
    closed: bool,
}

/// Mock driver for unit testing
pub struct MockDriver {
    resolver: Box<DocumentResolver>,
    state: Mutex<MockState>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl MockDriver {
    /// Driver on `about:blank` serving documents from `resolver`
    #[must_use]
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(&str) -> Option<MockDocument> + Send + Sync + 'static,
    {
        Self {
            resolver: Box::new(resolver),
            state: Mutex::new(MockState {
                url: "about:blank".to_string(),
                document: MockDocument::default(),
                history: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Driver already showing `document` at `url`, which is its only page
    #[must_use]
    pub fn with_document(url: impl Into<String>, document: MockDocument) -> Self {
        let url = url.into();
        let served_at = url.clone();
        let template = document.clone();
        let driver = Self::new(move |u| (u == served_at).then(|| template.clone()));
        {
            let mut state = driver.state();
            state.url = url;
            state.document = document;
        }
        driver
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state().history.iter().any(|c| c.starts_with(method))
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Copy of the current document
    #[must_use]
    pub fn document(&self) -> MockDocument {
        self.state().document.clone()
    }

    fn navigate(&self, state: &mut MockState, url: &str) -> PortalResult<()> {
        let document = (self.resolver)(url).ok_or_else(|| PortalError::Navigation {
            url: url.to_string(),
            message: "no mock document served at this URL".to_string(),
        })?;
        state.url = url.to_string();
        state.document = document;
        Ok(())
    }

    fn open(&self, call: String) -> PortalResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        if state.closed {
            return Err(PortalError::driver("page is closed"));
        }
        state.history.push(call);
        Ok(state)
    }

    fn target(state: &MockState, selector: &Selector, index: usize) -> PortalResult<usize> {
        let target = state
            .document
            .resolve(selector)
            .get(index)
            .copied()
            .ok_or_else(|| PortalError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        if !state.document.is_visible(target) {
            return Err(PortalError::driver(format!("{selector} is not visible")));
        }
        Ok(target)
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str) -> PortalResult<()> {
        let mut state = self.open(format!("goto:{url}"))?;
        self.navigate(&mut state, url)
    }

    async fn wait_for_load_state(&self, state: LoadState, _timeout: Duration) -> PortalResult<()> {
        drop(self.open(format!("wait_for_load_state:{state}"))?);
        Ok(())
    }

    async fn url(&self) -> PortalResult<String> {
        Ok(self.state().url.clone())
    }

    async fn title(&self) -> PortalResult<String> {
        Ok(self.state().document.title.clone())
    }

    async fn query(&self, selector: &Selector) -> PortalResult<Vec<ElementSnapshot>> {
        let state = self.state();
        if state.closed {
            return Err(PortalError::driver("page is closed"));
        }
        Ok(state
            .document
            .resolve(selector)
            .into_iter()
            .map(|i| state.document.snapshot(i))
            .collect())
    }

    async fn click(&self, selector: &Selector, index: usize) -> PortalResult<()> {
        let mut state = self.open(format!("click:{selector}"))?;
        let target = Self::target(&state, selector, index)?;
        match state.document.elements[target].on_click.clone() {
            None => Ok(()),
            Some(MockAction::Navigate(url)) => self.navigate(&mut state, &url),
            Some(MockAction::Reveal(keys)) => {
                for element in &mut state.document.elements {
                    if element.key.as_ref().is_some_and(|k| keys.contains(k)) {
                        element.visible = true;
                    }
                }
                Ok(())
            }
            Some(MockAction::Search { input, url }) => {
                let term = state
                    .document
                    .find_key(&input)
                    .and_then(|e| e.value.clone())
                    .unwrap_or_default();
                self.navigate(&mut state, &format!("{url}?q={term}"))
            }
        }
    }

    async fn fill(&self, selector: &Selector, index: usize, value: &str) -> PortalResult<()> {
        let mut state = self.open(format!("fill:{selector}={value}"))?;
        let target = Self::target(&state, selector, index)?;
        let element = &mut state.document.elements[target];
        if element.value.is_none() {
            return Err(PortalError::driver(format!("{selector} is not a form control")));
        }
        element.value = Some(value.to_string());
        Ok(())
    }

    async fn screenshot(&self) -> PortalResult<Vec<u8>> {
        drop(self.open("screenshot".to_string())?);
        Ok(Vec::new())
    }

    async fn close(&self) -> PortalResult<()> {
        let mut state = self.state();
        state.history.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn menu_document() -> MockDocument {
        let mut doc = MockDocument::new("Portal");
        doc.push(
            MockElement::button("Open menu")
                .name("menu")
                .on_click(MockAction::Reveal(vec!["drawer".to_string()])),
        );
        let drawer = doc.push(MockElement::new("div").key("drawer").hidden());
        doc.push_child(drawer, MockElement::link("Knowledge Base", "https://t/kb"));
        let nav = doc.push(MockElement::new("nav").role(AriaRole::Navigation).name("breadcrumb"));
        doc.push_child(nav, MockElement::link("Home", "https://t/"));
        doc.push(MockElement::new("span").class("MuiListItemText-primary").text("Visible: 3"));
        doc
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_role_and_name() {
            let doc = menu_document();
            assert_eq!(doc.resolve(&Selector::role(AriaRole::Button).named("menu")), vec![0]);
            assert!(doc
                .resolve(&Selector::role(AriaRole::Button).named("nothing"))
                .is_empty());
        }

        #[test]
        fn test_within_scopes_to_descendants() {
            let doc = menu_document();
            let home = Selector::role(AriaRole::Navigation)
                .named("breadcrumb")
                .within(Selector::role(AriaRole::Link).named_exact("Home"));
            assert_eq!(doc.resolve(&home), vec![4]);
            let kb_in_nav = Selector::role(AriaRole::Navigation)
                .within(Selector::role(AriaRole::Link).named("Knowledge"));
            assert!(doc.resolve(&kb_in_nav).is_empty());
        }

        #[test]
        fn test_text_picks_smallest_element() {
            let doc = menu_document();
            assert_eq!(doc.resolve(&Selector::text("Visible:")), vec![5]);
        }

        #[test]
        fn test_css_tag_and_class() {
            let doc = menu_document();
            assert_eq!(doc.resolve(&Selector::css(".MuiListItemText-primary")), vec![5]);
            assert_eq!(doc.resolve(&Selector::css("button")), vec![0]);
            assert!(doc.resolve(&Selector::css("button[type=button]")).is_empty());
        }

        #[test]
        fn test_nth_negative_and_out_of_range() {
            let doc = menu_document();
            let links = Selector::role(AriaRole::Link);
            assert_eq!(doc.resolve(&links.clone().nth(-1)), vec![4]);
            assert!(doc.resolve(&links.clone().nth(5)).is_empty());
            assert!(doc.resolve(&links.nth(-3)).is_empty());
        }

        #[test]
        fn test_visibility_inherits_from_ancestors() {
            let doc = menu_document();
            let kb = doc.resolve(&Selector::role(AriaRole::Link).named("Knowledge"))[0];
            assert!(!doc.snapshot(kb).visible);
        }
    }

    mod driver_tests {
        use super::*;

        fn driver() -> MockDriver {
            let home = menu_document();
            MockDriver::new(move |url| match url {
                "https://t/" => Some(home.clone()),
                "https://t/kb" => Some(MockDocument::new("Knowledge Base")),
                _ => None,
            })
        }

        #[tokio::test]
        async fn test_reveal_then_navigate() {
            let d = driver();
            d.goto("https://t/").await.unwrap();
            let kb = Selector::role(AriaRole::Link).named("Knowledge");
            assert!(d.click(&kb, 0).await.is_err());
            d.click(&Selector::role(AriaRole::Button), 0).await.unwrap();
            d.click(&kb, 0).await.unwrap();
            assert_eq!(d.url().await.unwrap(), "https://t/kb");
            assert_eq!(d.title().await.unwrap(), "Knowledge Base");
            assert!(d.was_called("click:role=button"));
        }

        #[tokio::test]
        async fn test_unknown_url_is_navigation_error() {
            let err = driver().goto("https://t/missing").await.unwrap_err();
            assert!(matches!(err, PortalError::Navigation { .. }));
        }

        #[tokio::test]
        async fn test_search_action_carries_input_value() {
            let mut doc = MockDocument::new("Home");
            doc.push(MockElement::textbox("Search").key("q"));
            doc.push(MockElement::button("Search").on_click(MockAction::Search {
                input: "q".to_string(),
                url: "https://t/searchResults".to_string(),
            }));
            let d = MockDriver::new(move |url| {
                if url == "https://t/" {
                    Some(doc.clone())
                } else {
                    query_param(url, "q").map(|q| MockDocument::new(format!("Results for {q}")))
                }
            });
            d.goto("https://t/").await.unwrap();
            d.fill(&Selector::role(AriaRole::Textbox), 0, "Word").await.unwrap();
            d.click(&Selector::role(AriaRole::Button), 0).await.unwrap();
            assert_eq!(d.url().await.unwrap(), "https://t/searchResults?q=Word");
            assert_eq!(d.title().await.unwrap(), "Results for Word");
        }

        #[tokio::test]
        async fn test_fill_rejects_non_inputs() {
            let d = driver();
            d.goto("https://t/").await.unwrap();
            let err = d
                .fill(&Selector::role(AriaRole::Button), 0, "x")
                .await
                .unwrap_err();
            assert!(err.to_string().contains("not a form control"));
        }

        #[tokio::test]
        async fn test_recorded_calls_release_state() {
            let d = driver();
            d.goto("https://t/").await.unwrap();
            d.wait_for_load_state(LoadState::Load, Duration::from_millis(10))
                .await
                .unwrap();
            assert!(d.screenshot().await.unwrap().is_empty());
            assert!(d.was_called("wait_for_load_state:load"));
            assert!(d.was_called("screenshot"));
            d.close().await.unwrap();
            assert!(d.screenshot().await.is_err());
        }

        #[tokio::test]
        async fn test_closed_page_rejects_queries() {
            let d = driver();
            d.close().await.unwrap();
            assert!(d.is_closed());
            assert!(d.query(&Selector::css("button")).await.is_err());
        }
    }

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param("https://t/searchResults?x=1&q=Word", "q").as_deref(),
            Some("Word")
        );
        assert_eq!(query_param("https://t/searchResults", "q"), None);
    }
}
