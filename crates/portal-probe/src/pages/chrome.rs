//! Navigation chrome shared by every portal page: the menu toggle and the
//! global search field.

use crate::assertion::expect;
use crate::browser::Page;
use crate::locator::{AriaRole, Locator, Selector, TextMatch};
use crate::result::PortalResult;

/// Accessible name of the global search field
pub const SEARCH_FIELD_NAME: &str = "Search for solutions and tickets";

/// Accessible names the menu toggle goes by ("Open menu", MUI's "open drawer")
const MENU_TOGGLE_NAME: &str = "menu|drawer";

/// Structural fallback for the search trigger when it has no accessible name
const SEARCH_TRIGGER_FALLBACK_CSS: &str = r#"button[type="button"][tabindex="0"]"#;

/// Menu toggle and global search, composed into each page object
#[derive(Debug, Clone)]
pub struct NavigationChrome {
    menu_button: Locator,
    search_box: Locator,
    search_button: Locator,
}

impl NavigationChrome {
    /// Declare the chrome's locators on `page`
    #[must_use]
    pub fn new(page: &Page) -> Self {
        let search_button = page
            .locator(
                Selector::role(AriaRole::Button)
                    .named_exact("Search")
                    .or(Selector::css(SEARCH_TRIGGER_FALLBACK_CSS).nth(1)),
            )
            .first();
        Self {
            menu_button: page
                .get_by_role(AriaRole::Button, TextMatch::pattern_ignore_case(MENU_TOGGLE_NAME))
                .first(),
            search_box: page.get_by_role(AriaRole::Textbox, SEARCH_FIELD_NAME),
            search_button,
        }
    }

    /// Menu toggle
    #[must_use]
    pub const fn menu_button(&self) -> &Locator {
        &self.menu_button
    }

    /// Global search field
    #[must_use]
    pub const fn search_box(&self) -> &Locator {
        &self.search_box
    }

    /// Search trigger
    #[must_use]
    pub const fn search_button(&self) -> &Locator {
        &self.search_button
    }

    /// Open the navigation menu
    pub async fn open_menu(&self) -> PortalResult<()> {
        tracing::debug!("opening navigation menu");
        self.menu_button.click().await
    }

    /// Type `term` into the search field and trigger the search
    pub async fn perform_search(&self, term: &str) -> PortalResult<()> {
        tracing::info!(term, "search");
        self.search_box.fill(term).await?;
        self.search_button.click().await
    }

    /// Empty the search field and trigger the search
    pub async fn clear_search(&self) -> PortalResult<()> {
        self.search_box.clear().await?;
        self.search_button.click().await
    }

    /// Poll until the search field holds `expected`
    pub async fn verify_search_value(&self, expected: &str) -> PortalResult<()> {
        expect(&self.search_box).to_have_value(expected).await
    }
}
