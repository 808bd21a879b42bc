//! Scenario fixtures.
//!
//! A fixture turns a freshly opened [`Page`] into a [`ManagePage`],
//! optionally driving the page to the Knowledge Base first. Releasing the
//! page stays with whoever opened it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::browser::Page;
use crate::config::PortalUrls;
use crate::manage::ManagePage;
use crate::result::{PortalError, PortalResult};
use crate::steps::StepRecorder;

/// Step name used by [`NavigationStrategy::ViaHomeMenu`]
pub const VIA_HOME_MENU_STEP: &str = "Navigate to Knowledge Base via home page";

/// Step name used by [`NavigationStrategy::Direct`]
pub const DIRECT_STEP: &str = "Navigate directly to Knowledge Base";

/// Where the page stands when a scenario body starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStrategy {
    /// No navigation; the page is still blank
    #[default]
    None,
    /// Home page, menu, then the Knowledge Base link
    ViaHomeMenu,
    /// Straight to the Knowledge Base URL
    Direct,
}

impl NavigationStrategy {
    /// Short name used in listings
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ViaHomeMenu => "via-home-menu",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for NavigationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds the [`ManagePage`] a scenario body receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortalFixture {
    strategy: NavigationStrategy,
}

impl PortalFixture {
    /// Fixture applying `strategy`
    #[must_use]
    pub const fn new(strategy: NavigationStrategy) -> Self {
        Self { strategy }
    }

    /// Configured strategy
    #[must_use]
    pub const fn strategy(&self) -> NavigationStrategy {
        self.strategy
    }

    /// Wrap `page` and run the navigation steps.
    ///
    /// A failing navigation step fails the setup with
    /// [`PortalError::Fixture`]; the page is left as is.
    pub async fn setup(
        &self,
        page: Page,
        urls: PortalUrls,
        steps: &StepRecorder,
    ) -> PortalResult<ManagePage> {
        let manage = ManagePage::new(page, urls);
        tracing::debug!(strategy = %self.strategy, "fixture setup");
        match self.strategy {
            NavigationStrategy::None => {}
            NavigationStrategy::ViaHomeMenu => {
                steps
                    .step(VIA_HOME_MENU_STEP, || async {
                        let home = manage.home_page();
                        home.goto().await?;
                        home.verify_page_loaded().await?;
                        home.open_menu().await?;
                        home.verify_menu_opened().await?;
                        home.navigate_to_knowledge_base().await?;
                        manage.knowledge_base_page().verify_page_loaded().await
                    })
                    .await
                    .map_err(fixture_error)?;
            }
            NavigationStrategy::Direct => {
                steps
                    .step(DIRECT_STEP, || async {
                        let knowledge_base = manage.knowledge_base_page();
                        knowledge_base.goto().await?;
                        knowledge_base.verify_page_loaded().await
                    })
                    .await
                    .map_err(fixture_error)?;
            }
        }
        Ok(manage)
    }
}

fn fixture_error(e: PortalError) -> PortalError {
    PortalError::Fixture {
        message: e.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::mock::portal::FakePortal;
    use crate::mock::MockDriver;
    use crate::page_object::PageKind;
    use crate::steps::StepStatus;
    use std::sync::Arc;

    const BASE: &str = "https://portal.test/hd/";

    fn page_on(portal: &FakePortal) -> (Page, Arc<MockDriver>) {
        let driver = Arc::new(portal.driver());
        let page = Page::new(driver.clone(), Timeouts::uniform(200, 5));
        (page, driver)
    }

    mod strategies {
        use super::*;

        #[tokio::test]
        async fn test_none_leaves_page_blank() {
            let portal = FakePortal::new(BASE);
            let (page, driver) = page_on(&portal);
            let steps = StepRecorder::new();
            let manage = PortalFixture::new(NavigationStrategy::None)
                .setup(page, portal.urls().clone(), &steps)
                .await
                .unwrap();

            assert!(steps.is_empty());
            assert!(!driver.was_called("goto"));
            for kind in PageKind::ALL {
                assert!(!manage.is_constructed(kind));
            }
        }

        #[tokio::test]
        async fn test_via_home_menu_lands_on_knowledge_base() {
            let portal = FakePortal::new(BASE);
            let (page, _driver) = page_on(&portal);
            let steps = StepRecorder::new();
            let manage = PortalFixture::new(NavigationStrategy::ViaHomeMenu)
                .setup(page, portal.urls().clone(), &steps)
                .await
                .unwrap();

            assert_eq!(
                manage.page().url().await.unwrap(),
                portal.urls().knowledge_base()
            );
            let records = steps.records();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].name, VIA_HOME_MENU_STEP);
            assert_eq!(records[0].status, StepStatus::Passed);
            assert!(manage.is_constructed(PageKind::Home));
        }

        #[tokio::test]
        async fn test_direct_skips_home() {
            let portal = FakePortal::new(BASE);
            let (page, driver) = page_on(&portal);
            let steps = StepRecorder::new();
            let manage = PortalFixture::new(NavigationStrategy::Direct)
                .setup(page, portal.urls().clone(), &steps)
                .await
                .unwrap();

            assert_eq!(steps.records()[0].name, DIRECT_STEP);
            assert!(!manage.is_constructed(PageKind::Home));
            let gotos: Vec<String> = driver
                .history()
                .into_iter()
                .filter(|h| h.starts_with("goto"))
                .collect();
            assert_eq!(gotos, vec![format!("goto:{}", portal.urls().knowledge_base())]);
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn test_broken_menu_fails_setup() {
            let portal = FakePortal::new(BASE).with_broken_menu();
            let (page, _driver) = page_on(&portal);
            let steps = StepRecorder::new();
            let result = PortalFixture::new(NavigationStrategy::ViaHomeMenu)
                .setup(page, portal.urls().clone(), &steps)
                .await;

            assert!(matches!(result, Err(PortalError::Fixture { .. })));
            assert_eq!(steps.records()[0].status, StepStatus::Failed);
        }
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(NavigationStrategy::default(), NavigationStrategy::None);
        assert_eq!(NavigationStrategy::ViaHomeMenu.to_string(), "via-home-menu");
    }
}
