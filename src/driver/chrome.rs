use super::{Locator, PageDriver, SessionLauncher};
use crate::{
    GrabberError, Result,
    config::{APP_DIR, Config},
    js_templates,
    timeouts::{ms, secs},
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page, element::Element};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Launches a dedicated Chromium process per session so no page state
/// survives from one attempt to the next.
pub struct ChromeLauncher {
    config: Arc<Config>,
}

impl ChromeLauncher {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn resolve_executable(&self) -> Result<PathBuf> {
        match self.config.browser.chrome_path {
            Some(ref path) => Ok(path.clone()),
            None => crate::utils::find_browser_executable(self.config.browser.engine),
        }
    }
}

#[async_trait::async_trait]
impl SessionLauncher for ChromeLauncher {
    type Driver = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let executable = self.resolve_executable()?;
        let browser_config = &self.config.browser;

        let (profile_dir, temp_profile) = match browser_config.user_data_dir {
            Some(ref dir) => (dir.clone(), None),
            None => {
                let dir = std::env::temp_dir().join(APP_DIR).join(&session_id);
                (dir.clone(), Some(dir))
            }
        };
        std::fs::create_dir_all(&profile_dir)?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&executable)
            .user_data_dir(&profile_dir)
            .window_size(browser_config.window_width, browser_config.window_height)
            .request_timeout(Duration::from_secs(secs::REQUEST))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-sync")
            .arg("--mute-audio");

        if !browser_config.headless {
            builder = builder.with_head();
        }

        if browser_config.disable_web_security {
            builder = builder.arg("--disable-web-security");
        }

        let launch_config = builder.build().map_err(GrabberError::LaunchFailed)?;

        tracing::debug!(
            "Launching {} session {} ({})",
            browser_config.engine,
            session_id,
            executable.display()
        );

        let (mut browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| GrabberError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                browser.kill().await;
                handler_task.abort();
                return Err(GrabberError::LaunchFailed(format!(
                    "Failed to open page: {}",
                    e
                )));
            }
        };

        Ok(ChromeSession {
            id: session_id,
            browser,
            page,
            handler_task,
            slow_mo: self.config.extraction.slow_mo(),
            temp_profile,
            ref_counter: AtomicU64::new(0),
            closed: false,
        })
    }
}

pub struct ChromeSession {
    id: String,
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    slow_mo: Duration,
    temp_profile: Option<PathBuf>,
    ref_counter: AtomicU64,
    closed: bool,
}

impl ChromeSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    async fn slow_down(&self) {
        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
    }

    /// One lookup attempt. Protocol-level misses are `Ok(None)` so the caller
    /// keeps polling; a broken connection to the browser is an error.
    async fn query(&self, locator: &Locator) -> Result<Option<Element>> {
        match locator {
            Locator::Css(selector) => lookup(self.page.find_element(selector.as_str()).await),
            Locator::Role { role, name } => {
                let marker = format!(
                    "{}-{}",
                    self.id,
                    self.ref_counter.fetch_add(1, Ordering::Relaxed)
                );
                let tagged = match lookup(
                    self.page
                        .evaluate(js_templates::tag_by_role(role, name, &marker))
                        .await,
                )? {
                    Some(result) => result.into_value::<bool>().unwrap_or(false),
                    None => false,
                };

                if !tagged {
                    return Ok(None);
                }

                lookup(
                    self.page
                        .find_element(js_templates::ref_selector(&marker))
                        .await,
                )
            }
        }
    }

    async fn is_actionable(&self, element: &Element) -> bool {
        element
            .call_js_fn(js_templates::ELEMENT_ACTIONABLE, false)
            .await
            .ok()
            .and_then(|r| r.result.value)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn remove_temp_profile(&self) {
        if let Some(ref dir) = self.temp_profile
            && let Err(e) = std::fs::remove_dir_all(dir)
        {
            tracing::debug!("Failed to remove profile {}: {}", dir.display(), e);
        }
    }
}

#[async_trait::async_trait]
impl PageDriver for ChromeSession {
    type Handle = Element;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        self.slow_down().await;

        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| GrabberError::General(format!("Failed to build navigate params: {}", e)))?;

        let response = tokio::time::timeout(timeout, self.page.execute(nav_params))
            .await
            .map_err(|_| GrabberError::NavigationTimeout(timeout.as_millis() as u64))?
            .map_err(|e| GrabberError::General(format!("Navigation failed: {}", e)))?;

        if let Some(ref error_text) = response.error_text {
            return Err(GrabberError::Connection(format!(
                "Navigation to {} failed: {}",
                url, error_text
            )));
        }

        Ok(())
    }

    async fn await_quiescence(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, async {
            loop {
                if let Ok(Ok(result)) = tokio::time::timeout(
                    Duration::from_secs(secs::READY_STATE),
                    self.page.evaluate(js_templates::READY_STATE),
                )
                .await
                    && let Ok(state) = result.into_value::<String>()
                    && state == "complete"
                {
                    tokio::time::sleep(Duration::from_millis(ms::NETWORK_IDLE)).await;
                    return;
                }
                tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
            }
        })
        .await
        .map_err(|_| GrabberError::NavigationTimeout(timeout.as_millis() as u64))
    }

    async fn find_element(&self, locator: &Locator, timeout: Duration) -> Result<Option<Element>> {
        let polled = tokio::time::timeout(timeout, async {
            loop {
                if let Some(element) = self.query(locator).await? {
                    return Ok::<_, GrabberError>(element);
                }
                tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
            }
        })
        .await;

        match polled {
            Ok(found) => found.map(Some),
            Err(_) => {
                tracing::debug!(
                    "No element for {} within {}ms",
                    locator,
                    timeout.as_millis()
                );
                Ok(None)
            }
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| GrabberError::General(format!("Query '{}' failed: {}", selector, e)))
    }

    async fn find_within(&self, parent: &Element, selector: &str) -> Result<Option<Element>> {
        parent
            .find_elements(selector)
            .await
            .map(|elements| elements.into_iter().next())
            .map_err(|e| GrabberError::General(format!("Query '{}' failed: {}", selector, e)))
    }

    async fn click(&self, handle: &Element) -> Result<()> {
        self.slow_down().await;

        let timeout = Duration::from_millis(ms::ACTIONABLE_WAIT);
        tokio::time::timeout(timeout, async {
            loop {
                if handle.scroll_into_view().await.is_ok() {
                    tokio::time::sleep(Duration::from_millis(ms::VIEWPORT_SETTLE)).await;
                    if self.is_actionable(handle).await {
                        return;
                    }
                }
                tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
            }
        })
        .await
        .map_err(|_| GrabberError::WaitTimeout {
            target: "actionable element".to_string(),
            timeout_ms: ms::ACTIONABLE_WAIT,
        })?;

        handle
            .click()
            .await
            .map_err(|e| GrabberError::General(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn read_text(&self, handle: &Element) -> Result<String> {
        handle
            .inner_text()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| GrabberError::EvaluationError(format!("Failed to read text: {}", e)))
    }

    async fn close_session(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let graceful = tokio::time::timeout(Duration::from_secs(secs::BROWSER_CLOSE), async {
            self.browser.close().await.ok();
            self.browser.wait().await.ok();
        })
        .await;

        if graceful.is_err() {
            tracing::warn!("Browser session {} did not exit, killing it", self.id);
            self.browser.kill().await;
        }

        self.handler_task.abort();
        self.remove_temp_profile();
        tracing::debug!("Closed browser session {}", self.id);
        Ok(())
    }
}

fn is_connection_error(error: &CdpError) -> bool {
    matches!(
        error,
        CdpError::Ws(_) | CdpError::Io(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse
    )
}

fn lookup<T>(result: std::result::Result<T, CdpError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_connection_error(&e) => {
            Err(GrabberError::Connection(format!("Lost connection to browser: {}", e)))
        }
        Err(_) => Ok(None),
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if !self.closed {
            self.handler_task.abort();
            self.remove_temp_profile();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_miss_keeps_polling() {
        assert!(matches!(lookup::<()>(Err(CdpError::NotFound)), Ok(None)));
        assert!(matches!(lookup(Ok(7)), Ok(Some(7))));
    }

    #[test]
    fn test_lookup_connection_loss_is_error() {
        let err = lookup::<()>(Err(CdpError::NoResponse)).unwrap_err();
        assert!(matches!(err, GrabberError::Connection(_)));

        let io = CdpError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe closed",
        ));
        assert!(lookup::<()>(Err(io)).is_err());
    }
}
