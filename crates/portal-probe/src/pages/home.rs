//! Landing page.

use regex::escape;

use crate::assertion::{expect, expect_page};
use crate::browser::Page;
use crate::config::PortalUrls;
use crate::locator::{AriaRole, Locator, TextMatch};
use crate::page_object::{PageKind, PageObject, PortalPage};
use crate::pages::NavigationChrome;
use crate::result::{PortalError, PortalResult};
use crate::wait::LoadState;

/// Title pattern every portal page carries
pub const PORTAL_TITLE_PATTERN: &str = "Self Service Portal";

/// Top-level sections the landing page must show
pub const MAIN_SECTIONS: [&str; 7] = [
    "Latest Updates",
    "Popular Articles",
    "My Tickets",
    "Approvals",
    "Submit a Ticket",
    "Ask a Question",
    "Announcements",
];

/// Landing page object
#[derive(Debug, Clone)]
pub struct HomePage {
    page: Page,
    chrome: NavigationChrome,
    url: String,
    url_pattern: String,
    find_solution_heading: Locator,
    knowledge_base_link: Locator,
}

impl HomePage {
    /// Declare the page's locators; performs no I/O
    #[must_use]
    pub fn new(page: &Page, urls: &PortalUrls) -> Self {
        let url = urls.home();
        Self {
            chrome: NavigationChrome::new(page),
            url_pattern: format!(r"^{}(\?.*)?$", escape(&url)),
            url,
            find_solution_heading: page.get_by_role(AriaRole::Heading, "Find a Solution"),
            knowledge_base_link: page.get_by_role(AriaRole::Link, "Knowledge Base"),
            page: page.clone(),
        }
    }

    /// "Find a Solution" heading
    #[must_use]
    pub const fn find_solution_heading(&self) -> &Locator {
        &self.find_solution_heading
    }

    /// Knowledge Base entry in the navigation menu
    #[must_use]
    pub const fn knowledge_base_link(&self) -> &Locator {
        &self.knowledge_base_link
    }

    /// Locator for one landing-page section
    #[must_use]
    pub fn section(&self, name: &str) -> Locator {
        self.page.get_by_text(name).first()
    }

    /// Load the landing page and wait for the DOM
    pub async fn goto(&self) -> PortalResult<()> {
        self.page.goto(&self.url).await?;
        self.page
            .wait_for_load_state(LoadState::DomContentLoaded)
            .await
    }

    /// Title and key heading are in place
    pub async fn verify_page_loaded(&self) -> PortalResult<()> {
        expect_page(&self.page)
            .to_have_title(TextMatch::pattern(PORTAL_TITLE_PATTERN))
            .await?;
        expect(&self.find_solution_heading).to_be_visible().await
    }

    /// Open the navigation menu
    pub async fn open_menu(&self) -> PortalResult<()> {
        self.chrome.open_menu().await
    }

    /// The menu is open: its Knowledge Base link is visible
    pub async fn verify_menu_opened(&self) -> PortalResult<()> {
        expect(&self.knowledge_base_link).to_be_visible().await
    }

    /// Open the menu unless already open, then follow its Knowledge Base link
    pub async fn navigate_to_knowledge_base(&self) -> PortalResult<()> {
        if !self.knowledge_base_link.is_visible().await? {
            self.open_menu().await?;
        }
        expect(&self.knowledge_base_link).to_be_visible().await?;
        self.knowledge_base_link.click().await
    }

    /// Every section in [`MAIN_SECTIONS`] is visible; a failure names all
    /// missing sections
    pub async fn verify_main_sections(&self) -> PortalResult<()> {
        let mut missing = Vec::new();
        for name in MAIN_SECTIONS {
            match expect(&self.section(name)).to_be_visible().await {
                Ok(()) => {}
                Err(e) if e.is_assertion() => missing.push(name),
                Err(e) => return Err(e),
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PortalError::assertion(format!(
                "home page sections not visible: {}",
                missing.join(", ")
            )))
        }
    }
}

impl PageObject for HomePage {
    fn kind(&self) -> PageKind {
        PageKind::Home
    }

    fn url_pattern(&self) -> &str {
        &self.url_pattern
    }
}

impl PortalPage for HomePage {
    fn chrome(&self) -> &NavigationChrome {
        &self.chrome
    }
}
