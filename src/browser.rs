//! Page rendering with headless Chrome/Chromium.
//!
//! Every render launches its own browser process and always tears it down
//! before returning, whether navigation, the readiness probe or DOM capture
//! succeeded or not.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::BROWSER_USER_AGENT;
use crate::feed::{PageRenderer, RetrievalError};

/// Default viewport width in pixels.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

/// Default viewport height in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1600;

/// Element whose presence signals the page shell has rendered.
pub const READY_SELECTOR: &str = "body";

/// Delay between readiness probe attempts.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound for each teardown step before the process is killed.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed for late client-side rendering after the page is ready.
const SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Path to Chrome/Chromium executable (None for auto-detection).
    pub executable_path: Option<String>,
    pub launch_timeout: Duration,
    pub navigation_timeout: Duration,
    pub ready_timeout: Duration,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl RendererConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            executable_path: config.browser_executable_path.clone(),
            launch_timeout: config.browser_launch_timeout,
            navigation_timeout: config.browser_nav_timeout,
            ready_timeout: config.browser_ready_timeout,
            ..Self::default()
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            executable_path: None,
            launch_timeout: Duration::from_secs(60),
            navigation_timeout: Duration::from_secs(30),
            ready_timeout: Duration::from_secs(10),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// [`PageRenderer`] backed by a freshly launched headless Chromium per call.
pub struct ChromiumRenderer {
    config: RendererConfig,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RetrievalError> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.config.viewport_width, self.config.viewport_height)
            .request_timeout(self.config.navigation_timeout)
            .no_sandbox()
            .disable_default_args()
            .arg("--headless=new")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--mute-audio")
            .arg("--lang=en-US,en")
            .arg(format!("--user-agent={BROWSER_USER_AGENT}"));

        if let Some(ref path) = self.config.executable_path {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| RetrievalError::Browser(format!("failed to build browser config: {e}")))
    }

    async fn launch(&self) -> Result<BrowserSession, RetrievalError> {
        let config = self.browser_config()?;

        let (browser, mut handler) = bounded(
            "browser launch",
            self.config.launch_timeout,
            Browser::launch(config),
        )
        .await?
        .map_err(|e| RetrievalError::Browser(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        info!("Headless browser launched");
        Ok(BrowserSession {
            browser,
            handler_task,
        })
    }

    /// Navigate, wait for readiness, and capture the DOM.
    async fn render_in(&self, session: &BrowserSession, url: &str) -> Result<String, RetrievalError> {
        let page = bounded(
            "page navigation",
            self.config.navigation_timeout,
            open_page(&session.browser, url),
        )
        .await??;

        self.wait_until_ready(&page).await;
        tokio::time::sleep(SETTLE_DELAY).await;

        if let Ok(title) = page.get_title().await {
            debug!(title = ?title, "Page loaded");
        }

        let html = page
            .content()
            .await
            .map_err(|e| RetrievalError::Browser(format!("failed to read page content: {e}")));

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {e}");
        }

        html
    }

    /// Poll for [`READY_SELECTOR`] until it appears or the probe times out.
    ///
    /// A missing element is not fatal; extraction decides what the page holds.
    async fn wait_until_ready(&self, page: &Page) {
        let probe = async {
            loop {
                if page.find_element(READY_SELECTOR).await.is_ok() {
                    return;
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };

        if tokio::time::timeout(self.config.ready_timeout, probe)
            .await
            .is_err()
        {
            warn!(
                selector = READY_SELECTOR,
                timeout = ?self.config.ready_timeout,
                "Readiness probe timed out, extracting anyway"
            );
        }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> Result<String, RetrievalError> {
        let session = self.launch().await?;
        let result = self.render_in(&session, url).await;
        session.close().await;
        result
    }
}

/// A launched browser and the task pumping its CDP events.
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    async fn close(mut self) {
        match bounded("browser close", SHUTDOWN_TIMEOUT, self.browser.close()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Failed to close browser: {e}"),
            Err(e) => warn!("{e}"),
        }
        reap(&mut self.browser, SHUTDOWN_TIMEOUT).await;
        self.handler_task.abort();
        debug!("Headless browser shut down");
    }
}

/// The exit/kill half of a browser child process.
#[async_trait]
trait BrowserProcess: Send {
    async fn wait_exit(&mut self) -> std::io::Result<()>;
    async fn force_kill(&mut self) -> Option<std::io::Result<()>>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn wait_exit(&mut self) -> std::io::Result<()> {
        self.wait().await.map(|_| ())
    }

    async fn force_kill(&mut self) -> Option<std::io::Result<()>> {
        self.kill().await
    }
}

/// Wait for the process to exit, killing it if it outlives `limit`.
///
/// Returns `true` when the process had to be killed.
async fn reap<P: BrowserProcess>(process: &mut P, limit: Duration) -> bool {
    match bounded("browser shutdown", limit, process.wait_exit()).await {
        Ok(Ok(())) => false,
        Ok(Err(e)) => {
            warn!("Failed to wait for browser exit: {e}");
            false
        }
        Err(e) => {
            warn!("{e}, killing browser process");
            if let Some(Err(e)) = process.force_kill().await {
                warn!("Failed to kill browser process: {e}");
            }
            true
        }
    }
}

async fn open_page(browser: &Browser, url: &str) -> Result<Page, RetrievalError> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| RetrievalError::Browser(format!("failed to open {url}: {e}")))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| RetrievalError::Browser(format!("navigation to {url} failed: {e}")))?;
    Ok(page)
}

async fn bounded<F: Future>(
    stage: &'static str,
    limit: Duration,
    fut: F,
) -> Result<F::Output, RetrievalError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| RetrievalError::Timeout {
            stage,
            after: limit,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RendererConfig::default();
        assert_eq!(config.viewport_width, DEFAULT_VIEWPORT_WIDTH);
        assert_eq!(config.viewport_height, DEFAULT_VIEWPORT_HEIGHT);
        assert!(config.executable_path.is_none());
    }

    #[test]
    fn test_from_config_carries_overrides() {
        let app = Config {
            browser_executable_path: Some("/opt/chrome/chrome".to_string()),
            browser_nav_timeout: Duration::from_secs(5),
            ..Config::for_testing()
        };
        let config = RendererConfig::from_config(&app);
        assert_eq!(config.executable_path.as_deref(), Some("/opt/chrome/chrome"));
        assert_eq!(config.navigation_timeout, Duration::from_secs(5));
        assert_eq!(config.ready_timeout, app.browser_ready_timeout);
    }

    struct FakeProcess {
        exits: bool,
        killed: bool,
    }

    #[async_trait]
    impl BrowserProcess for FakeProcess {
        async fn wait_exit(&mut self) -> std::io::Result<()> {
            if !self.exits {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn force_kill(&mut self) -> Option<std::io::Result<()>> {
            self.killed = true;
            Some(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_reap_kills_process_that_ignores_close() {
        let mut process = FakeProcess {
            exits: false,
            killed: false,
        };
        assert!(reap(&mut process, Duration::from_millis(20)).await);
        assert!(process.killed);
    }

    #[tokio::test]
    async fn test_reap_leaves_exited_process_alone() {
        let mut process = FakeProcess {
            exits: true,
            killed: false,
        };
        assert!(!reap(&mut process, Duration::from_millis(20)).await);
        assert!(!process.killed);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result = bounded(
            "test stage",
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await;
        match result {
            Err(RetrievalError::Timeout { stage, .. }) => assert_eq!(stage, "test stage"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
