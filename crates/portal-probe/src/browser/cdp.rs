//! Real CDP implementation (when `browser` feature is enabled).
//!
//! Selectors are resolved inside the page by an injected script
//! (`resolver.js`) that computes implicit ARIA roles, accessible names,
//! text matches and visibility. Clicks are dispatched as real mouse events
//! at the element's center; fills go through the native value setter so
//! framework-controlled inputs see the change.

#![allow(
    clippy::significant_drop_tightening,
    clippy::missing_errors_doc,
    clippy::items_after_statements
)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::BrowserSettings;
use crate::driver::{ElementSnapshot, PageDriver, PageFactory};
use crate::locator::Selector;
use crate::result::{PortalError, PortalResult};
use crate::wait::{poll, LoadState, PollOutcome, Probe, WaitOptions, NETWORK_IDLE_THRESHOLD_MS};

const RESOLVER_JS: &str = include_str!("resolver.js");

/// Browser instance with real CDP connection
#[derive(Debug)]
pub struct ChromiumBrowser {
    settings: BrowserSettings,
    inner: Arc<Mutex<CdpBrowser>>,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Launch a new browser instance
    pub async fn launch(settings: BrowserSettings) -> PortalResult<Self> {
        let mut builder = CdpConfig::builder().window_size(
            settings.viewport_width,
            settings.viewport_height,
        );

        if !settings.headless {
            builder = builder.with_head();
        }

        if !settings.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| PortalError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| PortalError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!(headless = settings.headless, "chromium launched");
        Ok(Self {
            settings,
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Create a new page
    pub async fn new_page(&self) -> PortalResult<ChromiumDriver> {
        let browser = self.inner.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PortalError::driver(e.to_string()))?;
        Ok(ChromiumDriver { page })
    }

    /// Launch settings
    #[must_use]
    pub const fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Close the browser
    pub async fn close(self) -> PortalResult<()> {
        let mut browser = self.inner.lock().await;
        browser
            .close()
            .await
            .map_err(|e| PortalError::driver(e.to_string()))?;
        self.handle.abort();
        Ok(())
    }
}

#[async_trait]
impl PageFactory for ChromiumBrowser {
    async fn open_page(&self) -> PortalResult<Arc<dyn PageDriver>> {
        Ok(Arc::new(self.new_page().await?))
    }
}

#[derive(Serialize)]
struct ResolverRequest<'a> {
    op: &'static str,
    selector: &'a Selector,
    index: usize,
    value: Option<&'a str>,
}

#[derive(Deserialize)]
struct ClickPoint {
    found: bool,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct FillOutcome {
    ok: bool,
}

/// A browser page with real CDP connection
#[derive(Debug, Clone)]
pub struct ChromiumDriver {
    page: CdpPage,
}

impl ChromiumDriver {
    async fn evaluate<T: DeserializeOwned>(&self, script: String) -> PortalResult<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PortalError::driver(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| PortalError::driver(e.to_string()))
    }

    async fn resolve<T: DeserializeOwned>(&self, request: &ResolverRequest<'_>) -> PortalResult<T> {
        let request = serde_json::to_string(request)?;
        self.evaluate(format!("({RESOLVER_JS})({request})")).await
    }

    async fn mouse(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> PortalResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(PortalError::driver)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| PortalError::driver(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> PortalResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| PortalError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> PortalResult<()> {
        let options = WaitOptions::new(timeout, Duration::from_millis(50));
        let outcome = poll(&options, || async {
            let ready: String = self.evaluate("document.readyState".to_string()).await?;
            Ok(if state.ready_states().contains(&ready.as_str()) {
                Probe::Ready(())
            } else {
                Probe::Pending(ready)
            })
        })
        .await?;
        if let PollOutcome::TimedOut { .. } = outcome {
            return Err(PortalError::Timeout {
                ms: timeout.as_millis() as u64,
            });
        }
        if state == LoadState::NetworkIdle {
            tokio::time::sleep(Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS)).await;
        }
        Ok(())
    }

    async fn url(&self) -> PortalResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(|e| PortalError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn title(&self) -> PortalResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(|e| PortalError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn query(&self, selector: &Selector) -> PortalResult<Vec<ElementSnapshot>> {
        self.resolve(&ResolverRequest {
            op: "query",
            selector,
            index: 0,
            value: None,
        })
        .await
    }

    async fn click(&self, selector: &Selector, index: usize) -> PortalResult<()> {
        let point: ClickPoint = self
            .resolve(&ResolverRequest {
                op: "point",
                selector,
                index,
                value: None,
            })
            .await?;
        if !point.found {
            return Err(PortalError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        self.mouse(DispatchMouseEventType::MouseMoved, point.x, point.y)
            .await?;
        self.mouse(DispatchMouseEventType::MousePressed, point.x, point.y)
            .await?;
        self.mouse(DispatchMouseEventType::MouseReleased, point.x, point.y)
            .await
    }

    async fn fill(&self, selector: &Selector, index: usize, value: &str) -> PortalResult<()> {
        let outcome: FillOutcome = self
            .resolve(&ResolverRequest {
                op: "fill",
                selector,
                index,
                value: Some(value),
            })
            .await?;
        if outcome.ok {
            Ok(())
        } else {
            Err(PortalError::driver(format!(
                "{selector} is not a fillable form control"
            )))
        }
    }

    async fn screenshot(&self) -> PortalResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| PortalError::driver(e.to_string()))?;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| PortalError::driver(e.to_string()))
    }

    async fn close(&self) -> PortalResult<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| PortalError::driver(e.to_string()))
    }
}
