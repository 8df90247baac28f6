//! Session handle provider.
//!
//! Owns the single long-lived browser context and its one active page.
//! Every other component borrows the page through [`PageHandle`] for the
//! duration of one operation; nothing else may create or destroy the
//! browser process.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::AutomationError;

/// Default location of the persistent browser profile.
pub fn default_profile_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".linkpilot")
        .join("profile")
}

/// Options used when acquiring a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    pub profile_dir: PathBuf,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            profile_dir: default_profile_dir(),
        }
    }
}

impl SessionOptions {
    /// The same options with headless mode overridden. Acquiring with a
    /// different headless mode forces a teardown-and-recreate.
    pub fn with_headless(&self, headless: bool) -> Self {
        Self {
            headless,
            profile_dir: self.profile_dir.clone(),
        }
    }
}

/// A borrowed view of the active page. Cheap to clone; valid only until
/// the session is released.
#[derive(Clone)]
pub struct PageHandle {
    page: Page,
}

impl PageHandle {
    pub(crate) fn new(page: Page) -> Self {
        Self { page }
    }

    /// Raw CDP page, for modules that need driver-level access.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate with a hard upper bound. A timeout or a network failure is
    /// reported as [`AutomationError::Navigation`]; the caller decides
    /// whether that means "logged out" or a surfaced failure.
    pub async fn goto_bounded(&self, url: &str, timeout: Duration) -> Result<(), AutomationError> {
        debug!(url, ?timeout, "navigating");
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AutomationError::Navigation(format!(
                "failed to load {url}: {e}"
            ))),
            Err(_) => Err(AutomationError::Navigation(format!(
                "timed out after {timeout:?} loading {url}"
            ))),
        }
    }

    /// Current page address, if the target is still reachable.
    pub async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    /// Best-effort vertical scroll; failures are absorbed since scrolling
    /// only drives lazy loading.
    pub async fn scroll_by(&self, delta_y: i64) {
        let _ = self
            .page
            .evaluate(format!("window.scrollBy(0, {delta_y})"))
            .await;
    }

    pub async fn scroll_to_top(&self) {
        let _ = self.page.evaluate("window.scrollTo(0, 0)").await;
    }
}

struct LiveSession {
    browser: Browser,
    page: Page,
    headless: bool,
    handler_task: JoinHandle<()>,
}

/// Process-wide owner of the browser context. At most one live session
/// exists at a time; recreating is the only way to change headless mode.
pub struct SessionManager {
    inner: Mutex<Option<LiveSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Return the live session's page, or create the session first.
    ///
    /// If a session is live but its headless mode differs from the
    /// request, it is torn down and recreated: headless mode is fixed at
    /// browser launch and cannot be flipped in place.
    ///
    /// Launch failures propagate uncaught. A profile directory locked by
    /// another process is fatal, not retryable.
    pub async fn acquire(&self, opts: &SessionOptions) -> Result<PageHandle, AutomationError> {
        let mut guard = self.inner.lock().await;

        if let Some(live) = guard.as_ref() {
            if live.headless == opts.headless {
                return Ok(PageHandle::new(live.page.clone()));
            }
            info!(
                requested = opts.headless,
                current = live.headless,
                "headless mode changed; recreating browser context"
            );
            Self::teardown(guard.take()).await;
        }

        let live = Self::launch(opts).await?;
        let handle = PageHandle::new(live.page.clone());
        *guard = Some(live);
        Ok(handle)
    }

    /// Headless mode of the live session, or `None` when no session exists.
    pub async fn current_headless(&self) -> Option<bool> {
        self.inner.lock().await.as_ref().map(|live| live.headless)
    }

    /// Tear down the browser context. The persistent profile stays on disk.
    pub async fn release(&self) {
        let live = self.inner.lock().await.take();
        Self::teardown(live).await;
    }

    async fn launch(opts: &SessionOptions) -> Result<LiveSession, AutomationError> {
        info!(
            headless = opts.headless,
            profile_dir = %opts.profile_dir.display(),
            "launching browser context"
        );

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&opts.profile_dir)
            .no_sandbox()
            .window_size(1280, 900)
            .arg("--disable-blink-features=AutomationControlled");
        if !opts.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(AutomationError::Session)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AutomationError::Session(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        // A persistent context may restore a page from the previous run;
        // reuse it instead of piling up blank tabs.
        let existing = browser.pages().await.ok().and_then(|p| p.into_iter().next());
        let page = match existing {
            Some(page) => page,
            None => browser
                .new_page("about:blank")
                .await
                .map_err(|e| AutomationError::Session(format!("failed to open page: {e}")))?,
        };

        Ok(LiveSession {
            browser,
            page,
            headless: opts.headless,
            handler_task,
        })
    }

    async fn teardown(live: Option<LiveSession>) {
        let Some(mut live) = live else {
            return;
        };
        if let Err(e) = live.browser.close().await {
            warn!("browser close failed: {e}");
        }
        if let Err(e) = live.browser.wait().await {
            debug!("browser process wait failed: {e}");
        }
        live.handler_task.abort();
        info!("browser session released");
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
