pub mod chrome;

use crate::Result;
use std::time::Duration;

pub use chrome::{ChromeLauncher, ChromeSession};

/// How an element is looked up on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    /// ARIA role plus accessible name, matched case-insensitively as a
    /// substring of the element's label.
    Role { role: String, name: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(selector) => f.write_str(selector),
            Self::Role { role, name } => write!(f, "{}[name=\"{}\"]", role, name),
        }
    }
}

/// Browser capabilities the extraction pipeline depends on. One value is one
/// open session (browser context plus page).
///
/// `find_element` returns `Ok(None)` when the element did not show up within
/// the bound; `Err` is reserved for the automation layer itself failing.
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    type Handle: Send + Sync;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    async fn await_quiescence(&self, timeout: Duration) -> Result<()>;

    async fn find_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<Self::Handle>>;

    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Handle>>;

    async fn find_within(
        &self,
        parent: &Self::Handle,
        selector: &str,
    ) -> Result<Option<Self::Handle>>;

    /// Waits for the element to become actionable, then clicks it.
    async fn click(&self, handle: &Self::Handle) -> Result<()>;

    async fn read_text(&self, handle: &Self::Handle) -> Result<String>;

    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn close_session(&mut self) -> Result<()>;
}

/// Opens a fresh, isolated session for every extraction attempt.
#[async_trait::async_trait]
pub trait SessionLauncher: Send + Sync {
    type Driver: PageDriver;

    async fn launch(&self) -> Result<Self::Driver>;
}
