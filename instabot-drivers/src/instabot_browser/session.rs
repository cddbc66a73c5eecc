//! Browser capability traits.
//!
//! The extraction pipeline only ever talks to these traits, so tests can swap
//! in counting doubles and production wires [`WebDriverLauncher`].
//!
//! [`WebDriverLauncher`]: super::driver::WebDriverLauncher
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Failures reported by a browser session.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// The browser process/session could not be started.
    #[error("failed to launch browser session: {0}")]
    Launch(String),

    /// The page could not be loaded (DNS, redirect loop, refused connection, HTTP error).
    #[error("navigation failed: {reason}")]
    Navigation {
        reason: String,
        status: Option<u16>,
    },

    /// A script evaluated inside the page failed or returned garbage.
    #[error("page script failed: {0}")]
    Script(String),

    /// The session died or refused a command after launch.
    #[error("browser session error: {0}")]
    Session(String),
}

impl BrowserError {
    pub fn navigation(reason: impl Into<String>) -> Self {
        BrowserError::Navigation {
            reason: reason.into(),
            status: None,
        }
    }
}

/// How long the network must stay quiet before a page counts as loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdlePolicy {
    /// Quiescence window: no new resource entries for this long.
    pub window: Duration,
    /// Delay between two page probes.
    pub poll_interval: Duration,
}

impl Default for IdlePolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// What the browser observed once navigation settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Final document URL, after redirects.
    pub url: Url,
    /// HTTP status of the main document, when the browser exposes it.
    pub status: Option<u16>,
    /// MIME type of the rendered document (`document.contentType`).
    pub content_type: Option<String>,
    pub redirected: bool,
}

impl Navigation {
    /// A plain successful HTML navigation; handy for doubles.
    pub fn html(url: Url) -> Self {
        Self {
            url,
            status: Some(200),
            content_type: Some("text/html".to_string()),
            redirected: false,
        }
    }

    /// `true` unless the browser reported a non-2xx status.
    pub fn is_success(&self) -> bool {
        self.status.map_or(true, |s| (200..300).contains(&s))
    }

    /// `true` when the document is HTML, or when the browser could not tell.
    pub fn is_html(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(raw) => {
                let essence = raw
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase();
                essence.is_empty() || essence == "text/html" || essence == "application/xhtml+xml"
            }
        }
    }
}

/// Starts isolated, disposable browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One browser process/session, owned by a single extraction.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` and wait for the network to go idle.
    ///
    /// The idle wait has no bound of its own; callers wrap this in a timeout.
    async fn navigate(&mut self, url: &Url, idle: &IdlePolicy) -> Result<Navigation, BrowserError>;

    /// Rendered HTML of the current document.
    async fn content(&mut self) -> Result<String, BrowserError>;

    /// Tear the session down, terminating the browser process.
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}
