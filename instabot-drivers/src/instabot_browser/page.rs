use crate::instabot_browser::{
    idle::{IdleTracker, PageProbe, PROBE_SCRIPT},
    session::{BrowserError, BrowserSession, IdlePolicy, Navigation},
};
use async_trait::async_trait;
use fantoccini::Client;
use std::time::Instant;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

/// A live WebDriver session rendering one page.
pub struct WebDriverPage {
    pub(crate) client: Client,
}

impl WebDriverPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Evaluate [`PROBE_SCRIPT`] and decode its report.
    pub async fn probe(&self) -> Result<PageProbe, BrowserError> {
        let raw = self
            .client
            .execute(PROBE_SCRIPT, vec![])
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        serde_json::from_value(raw).map_err(|e| BrowserError::Script(format!("bad probe payload: {e}")))
    }
}

/// Chrome reports load failures (`net::ERR_NAME_NOT_RESOLVED`,
/// `net::ERR_TOO_MANY_REDIRECTS`, ...) as the error text of `goto`.
fn navigation_reason(raw: &str) -> String {
    raw.split_whitespace()
        .find(|w| w.starts_with("net::ERR_"))
        .map(|w| w.trim_end_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_').to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn into_navigation(requested: &Url, probe: PageProbe) -> Navigation {
    let url = Url::parse(&probe.href).unwrap_or_else(|_| requested.clone());
    let redirected = probe.redirect_count > 0 || url != *requested;
    Navigation {
        url,
        status: probe.status,
        content_type: probe.content_type,
        redirected,
    }
}

#[async_trait]
impl BrowserSession for WebDriverPage {
    async fn navigate(&mut self, url: &Url, idle: &IdlePolicy) -> Result<Navigation, BrowserError> {
        self.client
            .goto(url.as_str())
            .await
            .map_err(|e| BrowserError::navigation(navigation_reason(&e.to_string())))?;

        let mut tracker = IdleTracker::new(idle.window);
        let mut probes = 0usize;
        loop {
            let probe = self.probe().await?;
            probes += 1;
            if tracker.observe(probe.is_complete(), probe.resources, Instant::now()) {
                debug!(
                    target: "browser.session",
                    href = %probe.href,
                    status = ?probe.status,
                    resources = probe.resources,
                    probes,
                    "network idle"
                );
                return Ok(into_navigation(url, probe));
            }
            sleep(idle.poll_interval).await;
        }
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        self.client
            .source()
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        let page = *self;
        page.client
            .close()
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))?;
        debug!(target: "browser.session", "session closed");
        Ok(())
    }
}
