//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature this module launches Chromium through
//! chromiumoxide. Each session lives in its own browser context, so
//! cookies and storage never leak between scenarios. Element operations
//! evaluate the locator's JavaScript in the page; clicks, hovers and key
//! presses go through the CDP `Input` domain.

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chromium_path: None,
            sandbox: true,
            navigation_timeout_ms: 30_000,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, ms: u64) -> Self {
        self.navigation_timeout_ms = ms;
        self
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, CdpSession};

#[cfg(feature = "browser")]
#[allow(
    clippy::significant_drop_tightening,
    clippy::missing_errors_doc,
    clippy::similar_names
)]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{BrowserSession, Key, Screenshot, SessionFactory, Viewport};
    use crate::locator::{js_string, BoundingBox, Locator};
    use crate::result::{ProbeError, ProbeResult};
    use crate::wait::LoadState;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
    use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, MouseButton,
    };
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::browser_protocol::target::{
        CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use serde::Deserialize;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::Instant;
    use tracing::{debug, info};

    const READY_POLL: Duration = Duration::from_millis(50);

    /// Launched Chromium instance handing out isolated sessions
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|e| ProbeError::BrowserLaunch { message: e })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| ProbeError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            info!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> ProbeResult<()> {
            let mut browser = self.inner.lock().await;
            browser
                .close()
                .await
                .map_err(|e| ProbeError::session(e.to_string()))?;
            self.handle.abort();
            Ok(())
        }
    }

    #[async_trait]
    impl SessionFactory for Browser {
        async fn new_session(&self) -> ProbeResult<Box<dyn BrowserSession>> {
            let browser = self.inner.lock().await;
            let context = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .map_err(|e| ProbeError::session(e.to_string()))?;
            let params = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context.clone())
                .build()
                .map_err(ProbeError::session)?;
            let page = browser
                .new_page(params)
                .await
                .map_err(|e| ProbeError::session(e.to_string()))?;
            debug!(?context, "session opened");
            Ok(Box::new(CdpSession {
                page: Arc::new(Mutex::new(page)),
                browser: Arc::clone(&self.inner),
                context,
                navigation_timeout: Duration::from_millis(self.config.navigation_timeout_ms),
            }))
        }
    }

    #[derive(Debug, Deserialize)]
    struct FirstMatch {
        found: bool,
        #[serde(default)]
        value: serde_json::Value,
    }

    /// A page in its own browser context
    #[derive(Debug)]
    pub struct CdpSession {
        page: Arc<Mutex<CdpPage>>,
        browser: Arc<Mutex<CdpBrowser>>,
        context: BrowserContextId,
        navigation_timeout: Duration,
    }

    impl CdpSession {
        async fn eval<T: DeserializeOwned>(&self, expression: String) -> ProbeResult<T> {
            let page = self.page.lock().await;
            let result = page
                .evaluate(expression)
                .await
                .map_err(|e| ProbeError::Evaluation {
                    message: e.to_string(),
                })?;
            result.into_value().map_err(|e| ProbeError::Evaluation {
                message: e.to_string(),
            })
        }

        /// Evaluate `body` with `el` bound to the first match
        async fn on_first<T: DeserializeOwned>(
            &self,
            locator: &Locator,
            body: &str,
        ) -> ProbeResult<T> {
            let expression = format!(
                "(() => {{ const el = {}[0]; if (!el) {{ return {{ found: false }}; }} \
                 return {{ found: true, value: ({body}) }}; }})()",
                locator.to_js()
            );
            let reply: FirstMatch = self.eval(expression).await?;
            if !reply.found {
                return Err(ProbeError::ElementNotFound {
                    locator: locator.to_string(),
                    waited_ms: 0,
                });
            }
            Ok(serde_json::from_value(reply.value)?)
        }

        async fn center_of(&self, locator: &Locator) -> ProbeResult<(f64, f64)> {
            self.scroll_into_view(locator).await?;
            let bbox = self
                .bounding_box(locator)
                .await?
                .ok_or_else(|| ProbeError::Input {
                    message: format!("{locator} has no box to interact with"),
                })?;
            let center = bbox.center();
            Ok((center.x, center.y))
        }

        async fn mouse(
            &self,
            kind: DispatchMouseEventType,
            x: f64,
            y: f64,
            pressed: bool,
        ) -> ProbeResult<()> {
            let mut builder = DispatchMouseEventParams::builder().r#type(kind).x(x).y(y);
            if pressed {
                builder = builder.button(MouseButton::Left).click_count(1);
            }
            let params = builder.build().map_err(|e| ProbeError::Input { message: e })?;
            let page = self.page.lock().await;
            page.execute(params).await.map_err(|e| ProbeError::Input {
                message: e.to_string(),
            })?;
            Ok(())
        }

        async fn key(&self, kind: DispatchKeyEventType, key: Key) -> ProbeResult<()> {
            let params = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key(key.as_str())
                .code(key.as_str())
                .windows_virtual_key_code(key.key_code())
                .build()
                .map_err(|e| ProbeError::Input { message: e })?;
            let page = self.page.lock().await;
            page.execute(params).await.map_err(|e| ProbeError::Input {
                message: e.to_string(),
            })?;
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserSession for CdpSession {
        async fn navigate(&self, url: &str, wait_until: LoadState) -> ProbeResult<()> {
            {
                let page = self.page.lock().await;
                tokio::time::timeout(self.navigation_timeout, page.goto(url))
                    .await
                    .map_err(|_| {
                        ProbeError::navigation(
                            url,
                            format!("timeout {}ms exceeded", self.navigation_timeout.as_millis()),
                        )
                    })?
                    .map_err(|e| ProbeError::navigation(url, e.to_string()))?;
            }
            self.wait_for_load_state(wait_until, self.navigation_timeout)
                .await
        }

        async fn current_url(&self) -> ProbeResult<String> {
            let page = self.page.lock().await;
            let url = page
                .url()
                .await
                .map_err(|e| ProbeError::session(e.to_string()))?;
            Ok(url.unwrap_or_else(|| "about:blank".to_string()))
        }

        async fn wait_for_load_state(
            &self,
            state: LoadState,
            timeout: Duration,
        ) -> ProbeResult<()> {
            let start = Instant::now();
            loop {
                let ready: String = self.eval("document.readyState".to_string()).await?;
                if state.ready_states().contains(&ready.as_str()) {
                    return Ok(());
                }
                if start.elapsed() >= timeout {
                    let url = self.current_url().await.unwrap_or_default();
                    return Err(ProbeError::navigation(
                        url,
                        format!("{state} not reached within {}ms", timeout.as_millis()),
                    ));
                }
                tokio::time::sleep(READY_POLL).await;
            }
        }

        async fn set_viewport(&self, viewport: Viewport) -> ProbeResult<()> {
            let params = SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(viewport.width))
                .height(i64::from(viewport.height))
                .device_scale_factor(1.0)
                .mobile(false)
                .build()
                .map_err(ProbeError::session)?;
            let page = self.page.lock().await;
            page.execute(params)
                .await
                .map_err(|e| ProbeError::session(e.to_string()))?;
            Ok(())
        }

        async fn viewport(&self) -> ProbeResult<Viewport> {
            self.eval("({ width: window.innerWidth, height: window.innerHeight })".to_string())
                .await
        }

        async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
            self.eval(format!("{}.length", locator.to_js())).await
        }

        async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
            let body = "(() => { const r = el.getBoundingClientRect(); \
                        const s = getComputedStyle(el); \
                        return r.width > 0 && r.height > 0 && s.visibility !== 'hidden'; })()";
            match self.on_first(locator, body).await {
                Err(ProbeError::ElementNotFound { .. }) => Ok(false),
                other => other,
            }
        }

        async fn text_content(&self, locator: &Locator) -> ProbeResult<Option<String>> {
            self.on_first(locator, "el.textContent").await
        }

        async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
            self.on_first(locator, &format!("el.getAttribute({})", js_string(name)))
                .await
        }

        async fn bounding_box(&self, locator: &Locator) -> ProbeResult<Option<BoundingBox>> {
            let body = "(() => { const r = el.getBoundingClientRect(); \
                        if (r.width === 0 && r.height === 0) { return null; } \
                        return { x: r.left, y: r.top, width: r.width, height: r.height }; })()";
            self.on_first(locator, body).await
        }

        async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<String> {
            self.on_first(
                locator,
                &format!("getComputedStyle(el).getPropertyValue({})", js_string(property)),
            )
            .await
        }

        async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
            let _: bool = self
                .on_first(
                    locator,
                    "(el.scrollIntoView({ block: 'center', inline: 'nearest' }), true)",
                )
                .await?;
            Ok(())
        }

        async fn click(&self, locator: &Locator) -> ProbeResult<()> {
            let (x, y) = self.center_of(locator).await?;
            self.mouse(DispatchMouseEventType::MouseMoved, x, y, false)
                .await?;
            self.mouse(DispatchMouseEventType::MousePressed, x, y, true)
                .await?;
            self.mouse(DispatchMouseEventType::MouseReleased, x, y, true)
                .await
        }

        async fn hover(&self, locator: &Locator) -> ProbeResult<()> {
            let (x, y) = self.center_of(locator).await?;
            self.mouse(DispatchMouseEventType::MouseMoved, x, y, false)
                .await
        }

        async fn dispatch_click(&self, locator: &Locator) -> ProbeResult<()> {
            let _: bool = self
                .on_first(
                    locator,
                    "el.dispatchEvent(new MouseEvent('click', { bubbles: true, cancelable: true, view: window }))",
                )
                .await?;
            Ok(())
        }

        async fn press_key(&self, key: Key) -> ProbeResult<()> {
            self.key(DispatchKeyEventType::KeyDown, key).await?;
            self.key(DispatchKeyEventType::KeyUp, key).await
        }

        async fn screenshot(&self) -> ProbeResult<Screenshot> {
            let viewport = self.viewport().await?;
            let page = self.page.lock().await;
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot = page
                .execute(params)
                .await
                .map_err(|e| ProbeError::Screenshot {
                    message: e.to_string(),
                })?;

            use base64::Engine;
            let data = base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| ProbeError::Screenshot {
                    message: e.to_string(),
                })?;
            Ok(Screenshot::new(data, viewport.width, viewport.height))
        }

        async fn close(&self) -> ProbeResult<()> {
            let page = self.page.lock().await.clone();
            page.close()
                .await
                .map_err(|e| ProbeError::session(e.to_string()))?;
            let browser = self.browser.lock().await;
            browser
                .execute(DisposeBrowserContextParams::new(self.context.clone()))
                .await
                .map_err(|e| ProbeError::session(e.to_string()))?;
            Ok(())
        }
    }
}
