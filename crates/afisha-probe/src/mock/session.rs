//! [`BrowserSession`] over an in-memory site.

use super::dom::{Dom, MockAction, MockDocument, NodeId};
use crate::driver::{BrowserSession, Key, Screenshot, SessionFactory, Viewport};
use crate::locator::{BoundingBox, Locator};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Builds a page from the URLs visited so far in the session
pub type PageBuilder = Arc<dyn Fn(&[String]) -> MockDocument + Send + Sync>;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A set of pages keyed by absolute URL
#[derive(Default)]
pub struct MockSite {
    pages: HashMap<String, PageBuilder>,
}

impl MockSite {
    /// Empty site
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page rendered from the session's visit history
    #[must_use]
    pub fn with_page<F>(mut self, url: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&[String]) -> MockDocument + Send + Sync + 'static,
    {
        self.pages.insert(url.into(), Arc::new(builder));
        self
    }

    /// Register a page that never changes
    #[must_use]
    pub fn with_static_page(self, url: impl Into<String>, document: impl Into<MockDocument>) -> Self {
        let document = document.into();
        self.with_page(url, move |_| document.clone())
    }

    /// Registered URLs
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    /// Share between sessions
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn render(&self, url: &str, history: &[String]) -> Option<MockDocument> {
        self.pages.get(url).map(|builder| builder(history))
    }
}

impl fmt::Debug for MockSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSite").field("pages", &self.urls()).finish()
    }
}

#[derive(Debug)]
struct SessionState {
    url: String,
    dom: Dom,
    viewport: Viewport,
    history: Vec<String>,
    calls: Vec<String>,
    closed: bool,
}

/// In-memory browser session
#[derive(Debug)]
pub struct MockSession {
    site: Arc<MockSite>,
    state: Mutex<SessionState>,
}

impl MockSession {
    /// New session on `about:blank` with a 1280x720 viewport
    #[must_use]
    pub fn new(site: Arc<MockSite>) -> Self {
        Self {
            site,
            state: Mutex::new(SessionState {
                url: "about:blank".to_string(),
                dom: Dom::empty(),
                viewport: Viewport::new(1280, 720),
                history: Vec::new(),
                calls: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Calls made on this session, e.g. `press_key:ArrowRight`
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Check if a call starting with `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    /// URLs loaded in this session, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().map(|s| s.history.clone()).unwrap_or_default()
    }

    fn state(&self) -> ProbeResult<MutexGuard<'_, SessionState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| ProbeError::session("mock session state poisoned"))?;
        if state.closed {
            return Err(ProbeError::session("session is closed"));
        }
        Ok(state)
    }

    fn record(&self, call: String) -> ProbeResult<()> {
        self.state()?.calls.push(call);
        Ok(())
    }

    fn load(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.state()?;
        let mut history = state.history.clone();
        history.push(url.to_string());
        let document = self
            .site
            .render(url, &history)
            .ok_or_else(|| ProbeError::navigation(url, "no page registered for URL"))?;
        debug!(url, "mock navigation");
        state.dom = Dom::from_document(document);
        state.url = url.to_string();
        state.history = history;
        Ok(())
    }

    fn apply(&self, action: MockAction) -> ProbeResult<()> {
        match action {
            MockAction::Navigate(url) => self.load(&url),
            MockAction::TranslateX { target, dx } => {
                self.state()?.dom.translate_x(&target, dx);
                Ok(())
            }
            MockAction::SetStyle {
                target,
                property,
                value,
            } => {
                self.state()?.dom.set_style(&target, &property, &value);
                Ok(())
            }
            MockAction::Sequence(actions) => actions.into_iter().try_for_each(|a| self.apply(a)),
        }
    }

    fn with_first<T>(
        &self,
        locator: &Locator,
        f: impl FnOnce(&mut Dom, NodeId) -> T,
    ) -> ProbeResult<T> {
        let mut state = self.state()?;
        let id = state
            .dom
            .first(locator)
            .ok_or_else(|| ProbeError::ElementNotFound {
                locator: locator.to_string(),
                waited_ms: 0,
            })?;
        Ok(f(&mut state.dom, id))
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&self, url: &str, wait_until: LoadState) -> ProbeResult<()> {
        self.record(format!("navigate:{url}:{wait_until}"))?;
        self.load(url)
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.state()?.url.clone())
    }

    async fn wait_for_load_state(&self, state: LoadState, _timeout: Duration) -> ProbeResult<()> {
        self.record(format!("wait_for_load_state:{state}"))
    }

    async fn set_viewport(&self, viewport: Viewport) -> ProbeResult<()> {
        self.record(format!("set_viewport:{viewport}"))?;
        self.state()?.viewport = viewport;
        Ok(())
    }

    async fn viewport(&self) -> ProbeResult<Viewport> {
        Ok(self.state()?.viewport)
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        Ok(self.state()?.dom.resolve(locator).len())
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        let state = self.state()?;
        Ok(state
            .dom
            .first(locator)
            .is_some_and(|id| state.dom.is_visible(id)))
    }

    async fn text_content(&self, locator: &Locator) -> ProbeResult<Option<String>> {
        self.with_first(locator, |dom, id| Some(dom.text_content(id)))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        self.with_first(locator, |dom, id| dom.attribute(id, name))
    }

    async fn bounding_box(&self, locator: &Locator) -> ProbeResult<Option<BoundingBox>> {
        self.with_first(locator, |dom, id| dom.bounding_box(id))
    }

    async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<String> {
        self.with_first(locator, |dom, id| dom.computed_style(id, property))
    }

    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
        self.with_first(locator, |_, _| ())?;
        self.record(format!("scroll_into_view:{locator}"))
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        let action = self.with_first(locator, |dom, id| {
            dom.is_visible(id).then(|| dom.click_action(id))
        })?;
        let Some(action) = action else {
            return Err(ProbeError::Input {
                message: format!("{locator} is not visible"),
            });
        };
        self.record(format!("click:{locator}"))?;
        action.map_or(Ok(()), |a| self.apply(a))
    }

    async fn hover(&self, locator: &Locator) -> ProbeResult<()> {
        self.with_first(locator, |dom, id| dom.hover(id))?;
        self.record(format!("hover:{locator}"))
    }

    async fn dispatch_click(&self, locator: &Locator) -> ProbeResult<()> {
        let action = self.with_first(locator, |dom, id| dom.click_action(id))?;
        self.record(format!("dispatch_click:{locator}"))?;
        action.map_or(Ok(()), |a| self.apply(a))
    }

    async fn press_key(&self, key: Key) -> ProbeResult<()> {
        self.record(format!("press_key:{key}"))?;
        let action = self.state()?.dom.key_action(key);
        action.map_or(Ok(()), |a| self.apply(a))
    }

    async fn screenshot(&self) -> ProbeResult<Screenshot> {
        let viewport = self.state()?.viewport;
        Ok(Screenshot::new(
            PNG_SIGNATURE.to_vec(),
            viewport.width,
            viewport.height,
        ))
    }

    async fn close(&self) -> ProbeResult<()> {
        self.state()?.closed = true;
        Ok(())
    }
}

/// Hands out independent [`MockSession`]s over one site
#[derive(Debug)]
pub struct MockSessionFactory {
    site: Arc<MockSite>,
    opened: AtomicUsize,
}

impl MockSessionFactory {
    /// Factory over `site`
    #[must_use]
    pub fn new(site: Arc<MockSite>) -> Self {
        Self {
            site,
            opened: AtomicUsize::new(0),
        }
    }

    /// Number of sessions opened so far
    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn new_session(&self) -> ProbeResult<Box<dyn BrowserSession>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession::new(Arc::clone(&self.site))))
    }
}
