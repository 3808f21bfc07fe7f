use crate::{GrabberError, Result, config::BrowserEngine};
use std::path::PathBuf;

pub fn find_browser_executable(engine: BrowserEngine) -> Result<PathBuf> {
    if let Some(path) = find_in_standard_locations(engine) {
        return Ok(path);
    }

    if let Some(path) = find_in_path(engine) {
        return Ok(path);
    }

    Err(GrabberError::LaunchFailed(format!(
        "Could not find a {} executable. Please specify with --chrome-path",
        engine
    )))
}

fn first_existing(paths: &[&str]) -> Option<PathBuf> {
    paths.iter().map(PathBuf::from).find(|p| p.exists())
}

#[cfg(target_os = "macos")]
fn find_in_standard_locations(engine: BrowserEngine) -> Option<PathBuf> {
    let paths: &[&str] = match engine {
        BrowserEngine::Chromium => &[
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        ],
        BrowserEngine::Chrome => &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
        ],
        BrowserEngine::Edge => &["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"],
    };
    first_existing(paths)
}

#[cfg(target_os = "linux")]
fn find_in_standard_locations(engine: BrowserEngine) -> Option<PathBuf> {
    let paths: &[&str] = match engine {
        BrowserEngine::Chromium => &[
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/bin/google-chrome",
        ],
        BrowserEngine::Chrome => &["/usr/bin/google-chrome", "/usr/bin/google-chrome-stable"],
        BrowserEngine::Edge => &["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"],
    };
    first_existing(paths)
}

#[cfg(target_os = "windows")]
fn find_in_standard_locations(engine: BrowserEngine) -> Option<PathBuf> {
    let paths: &[&str] = match engine {
        BrowserEngine::Chromium => &[
            r"C:\Program Files\Chromium\Application\chrome.exe",
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        ],
        BrowserEngine::Chrome => &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ],
        BrowserEngine::Edge => &[
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
            r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
        ],
    };
    if let Some(path) = first_existing(paths) {
        return Some(path);
    }

    if engine == BrowserEngine::Chrome
        && let Ok(local_app_data) = std::env::var("LOCALAPPDATA")
    {
        let user_chrome = PathBuf::from(&local_app_data)
            .join("Google")
            .join("Chrome")
            .join("Application")
            .join("chrome.exe");
        if user_chrome.exists() {
            return Some(user_chrome);
        }
    }

    None
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn find_in_standard_locations(_engine: BrowserEngine) -> Option<PathBuf> {
    None
}

fn path_binaries(engine: BrowserEngine) -> &'static [&'static str] {
    if cfg!(windows) {
        match engine {
            BrowserEngine::Chromium => &["chromium.exe", "chrome.exe"],
            BrowserEngine::Chrome => &["chrome.exe"],
            BrowserEngine::Edge => &["msedge.exe"],
        }
    } else {
        match engine {
            BrowserEngine::Chromium => &["chromium", "chromium-browser", "google-chrome", "chrome"],
            BrowserEngine::Chrome => &["google-chrome", "google-chrome-stable", "chrome"],
            BrowserEngine::Edge => &["microsoft-edge", "microsoft-edge-stable", "msedge"],
        }
    }
}

fn find_in_path(engine: BrowserEngine) -> Option<PathBuf> {
    path_binaries(engine)
        .iter()
        .find_map(|binary| which::which(binary).ok())
}

pub mod signal {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Cloneable cancellation flag shared between the signal handlers, the
    /// batch loop and in-flight extractions.
    #[derive(Debug, Clone, Default)]
    pub struct ShutdownSignal {
        inner: Arc<Inner>,
    }

    #[derive(Debug, Default)]
    struct Inner {
        triggered: AtomicBool,
        notify: Notify,
    }

    impl ShutdownSignal {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn trigger(&self) {
            self.inner.triggered.store(true, Ordering::SeqCst);
            self.inner.notify.notify_waiters();
        }

        pub fn is_triggered(&self) -> bool {
            self.inner.triggered.load(Ordering::SeqCst)
        }

        /// Resolves once `trigger` has been called, immediately if it already was.
        pub async fn triggered(&self) {
            loop {
                let notified = self.inner.notify.notified();
                if self.is_triggered() {
                    return;
                }
                notified.await;
            }
        }

        /// Sleeps for `duration` unless interrupted. Returns `false` when the
        /// sleep was cut short.
        pub async fn sleep(&self, duration: Duration) -> bool {
            if self.is_triggered() {
                return false;
            }
            tokio::select! {
                _ = tokio::time::sleep(duration) => true,
                _ = self.triggered() => false,
            }
        }
    }

    pub fn setup_handlers(shutdown: ShutdownSignal) -> crate::Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::spawn(async move {
                tokio::select! {
                    _ = sigint.recv() => {
                        tracing::info!("Received SIGINT, finishing up...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, finishing up...");
                    }
                }
                shutdown.trigger();
            });
        }

        #[cfg(windows)]
        {
            use tokio::signal::windows;

            let mut ctrl_c = windows::ctrl_c()?;
            let mut ctrl_break = windows::ctrl_break()?;

            tokio::spawn(async move {
                tokio::select! {
                    _ = ctrl_c.recv() => {
                        tracing::info!("Received Ctrl+C, finishing up...");
                    }
                    _ = ctrl_break.recv() => {
                        tracing::info!("Received Ctrl+Break, finishing up...");
                    }
                }
                shutdown.trigger();
            });
        }

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_sleep_completes_without_trigger() {
            let signal = ShutdownSignal::new();
            assert!(signal.sleep(Duration::from_secs(5)).await);
        }

        #[tokio::test(start_paused = true)]
        async fn test_trigger_cuts_sleep_short() {
            let signal = ShutdownSignal::new();
            let trigger = signal.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                trigger.trigger();
            });

            let started = tokio::time::Instant::now();
            assert!(!signal.sleep(Duration::from_secs(60)).await);
            assert!(started.elapsed() < Duration::from_secs(60));
            assert!(signal.is_triggered());
        }

        #[tokio::test]
        async fn test_triggered_resolves_when_already_set() {
            let signal = ShutdownSignal::new();
            signal.trigger();
            signal.triggered().await;
            assert!(!signal.sleep(Duration::from_secs(1)).await);
        }
    }
}
