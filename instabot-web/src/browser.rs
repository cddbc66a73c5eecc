//! Page capture: one disposable browser session per call.
use crate::error::ExtractionError;
use instabot_drivers::instabot_browser::session::{
    BrowserError, BrowserLauncher, BrowserSession, IdlePolicy, Navigation,
};
use std::time::Duration;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};
use url::Url;

/// Rendered HTML of a page plus what the browser saw while loading it.
#[derive(Debug, Clone)]
pub struct PageCapture {
    pub requested: Url,
    pub navigation: Navigation,
    pub html: String,
}

impl PageCapture {
    /// URL relative links resolve against: the final one, after redirects.
    pub fn base_url(&self) -> &Url {
        &self.navigation.url
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Shared deadline for navigation, the idle wait and reading the DOM back.
    /// Launching gets its own bound of the same length.
    pub navigation_timeout: Duration,
    pub idle: IdlePolicy,
}

/// Owns a session until it is released; dropping it (an error path or a
/// cancelled future) still closes the browser on the current runtime.
struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
}

impl SessionGuard {
    fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    fn session(&mut self) -> Result<&mut (dyn BrowserSession + 'static), BrowserError> {
        self.session
            .as_deref_mut()
            .ok_or_else(|| BrowserError::Session("session already released".into()))
    }

    /// Close the session and wait for it. The close runs as its own task so a
    /// caller giving up mid-release cannot abort it.
    async fn release(mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let handle = tokio::spawn(close_session(session));
        if let Err(e) = handle.await {
            warn!(target: "browser.session", error = %e, "session close task failed");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                debug!(target: "browser.session", "closing abandoned session");
                rt.spawn(close_session(session));
            }
            Err(_) => warn!(
                target: "browser.session",
                "no runtime to close abandoned session; relying on driver cleanup"
            ),
        }
    }
}

async fn close_session(session: Box<dyn BrowserSession>) {
    if let Err(e) = session.close().await {
        warn!(target: "browser.session", error = %e, "failed to close browser session");
    }
}

/// Launch a session, load `url` until the network is idle and return the
/// rendered HTML. The session is closed exactly once on every path.
pub async fn capture_page(
    launcher: &dyn BrowserLauncher,
    url: &Url,
    options: &CaptureOptions,
) -> Result<PageCapture, ExtractionError> {
    let session = timeout(options.navigation_timeout, launcher.launch())
        .await
        .map_err(|_| {
            ExtractionError::Environment(format!(
                "browser did not start within {:?}",
                options.navigation_timeout
            ))
        })?
        .map_err(|e| ExtractionError::Environment(e.to_string()))?;
    let mut guard = SessionGuard::new(session);

    let result = load(&mut guard, url, options).await;
    guard.release().await;
    result
}

async fn load(
    guard: &mut SessionGuard,
    url: &Url,
    options: &CaptureOptions,
) -> Result<PageCapture, ExtractionError> {
    let session = guard
        .session()
        .map_err(|e| ExtractionError::from_browser(url.as_str(), e))?;

    let deadline = Instant::now() + options.navigation_timeout;
    let timed_out = || ExtractionError::NavigationTimeout {
        url: url.to_string(),
        timeout: options.navigation_timeout,
    };

    let navigation = timeout_at(deadline, session.navigate(url, &options.idle))
        .await
        .map_err(|_| timed_out())?
        .map_err(|e| ExtractionError::from_browser(url.as_str(), e))?;

    debug!(
        target: "browser.session",
        final_url = %navigation.url,
        status = ?navigation.status,
        content_type = ?navigation.content_type,
        redirected = navigation.redirected,
        "navigation settled"
    );

    if !navigation.is_success() {
        let status = navigation.status;
        return Err(ExtractionError::Navigation {
            url: url.to_string(),
            status,
            reason: match status {
                Some(code) => format!("HTTP {code}"),
                None => "unsuccessful response".to_string(),
            },
        });
    }
    if !navigation.is_html() {
        return Err(ExtractionError::UnsupportedContentType {
            url: navigation.url.to_string(),
            content_type: navigation.content_type.clone().unwrap_or_default(),
        });
    }

    // The page loaded; failing to read it back is still a navigation failure.
    let html = timeout_at(deadline, session.content())
        .await
        .map_err(|_| timed_out())?
        .map_err(|e| ExtractionError::Navigation {
            url: url.to_string(),
            status: navigation.status,
            reason: e.to_string(),
        })?;

    Ok(PageCapture {
        requested: url.clone(),
        navigation,
        html,
    })
}
