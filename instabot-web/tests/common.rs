#![allow(dead_code)]

use async_trait::async_trait;
use instabot_common::observability::{LogConfig, LogFormat};
use instabot_drivers::instabot_browser::session::{
    BrowserError, BrowserLauncher, BrowserSession, IdlePolicy, Navigation,
};
use instabot_web::{Article, ContentExtractor, Readability};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, OnceLock,
    },
    time::Duration,
};
use url::Url;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "instabot-tests",
            emit_stderr: true,
            format: LogFormat::from_name(&std::env::var("INSTABOT_LOG_FORMAT").unwrap_or_default()),
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        instabot_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub const ARTICLE_HTML: &str = include_str!("fixtures/article.html");

/// What the fake browser does for one URL.
#[derive(Debug, Clone)]
pub enum Route {
    /// 200 `text/html` with this body.
    Html(String),
    /// Settles with the given status.
    Status(u16),
    /// Settles with a non-HTML document.
    ContentType(String),
    /// `goto` fails with a Chrome network error.
    NetError(String),
    /// Redirected to `to`, which serves `html`.
    Redirect { to: String, html: String },
    /// Navigation never settles.
    Hang,
    /// Settles, but reading the DOM back fails.
    BrokenContent,
    /// Settles, but reading the DOM back never returns.
    HangingContent,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub launches: AtomicUsize,
    pub navigations: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Counters {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Browser double that counts sessions opened and closed.
#[derive(Debug, Default)]
pub struct FakeBrowser {
    routes: Arc<HashMap<String, Route>>,
    pub counters: Arc<Counters>,
    refuse_launch: bool,
    stall_launch: bool,
}

impl FakeBrowser {
    pub fn new(routes: impl IntoIterator<Item = (&'static str, Route)>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(url, route)| (normalize(url), route))
            .collect();
        Self {
            routes: Arc::new(routes),
            ..Self::default()
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse_launch: true,
            ..Self::default()
        }
    }

    /// A launcher whose browser never comes up.
    pub fn stalled() -> Self {
        Self {
            stall_launch: true,
            ..Self::default()
        }
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if self.refuse_launch {
            return Err(BrowserError::Launch("connection refused".into()));
        }
        if self.stall_launch {
            std::future::pending::<()>().await;
        }
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            routes: self.routes.clone(),
            counters: self.counters.clone(),
            current: None,
        }))
    }
}

struct FakeSession {
    routes: Arc<HashMap<String, Route>>,
    counters: Arc<Counters>,
    current: Option<Route>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &Url, idle: &IdlePolicy) -> Result<Navigation, BrowserError> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        let route = self
            .routes
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Route::NetError("net::ERR_NAME_NOT_RESOLVED".into()));

        // A settled page still waits out one quiescence window.
        tokio::time::sleep(idle.window.min(Duration::from_millis(5))).await;

        let navigation = match &route {
            Route::Html(_) | Route::BrokenContent | Route::HangingContent => {
                Navigation::html(url.clone())
            }
            Route::Status(code) => Navigation {
                status: Some(*code),
                ..Navigation::html(url.clone())
            },
            Route::ContentType(ct) => Navigation {
                content_type: Some(ct.clone()),
                ..Navigation::html(url.clone())
            },
            Route::NetError(reason) => return Err(BrowserError::navigation(reason.clone())),
            Route::Redirect { to, .. } => Navigation {
                url: Url::parse(to).map_err(|e| BrowserError::navigation(e.to_string()))?,
                redirected: true,
                ..Navigation::html(url.clone())
            },
            Route::Hang => std::future::pending().await,
        };
        self.current = Some(route);
        Ok(navigation)
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        match &self.current {
            Some(Route::Html(html)) | Some(Route::Redirect { html, .. }) => Ok(html.clone()),
            Some(Route::Status(code)) => Ok(format!("<html><body><h1>{code}</h1></body></html>")),
            Some(Route::BrokenContent) => Err(BrowserError::Session("target frame detached".into())),
            Some(Route::HangingContent) => std::future::pending().await,
            _ => Err(BrowserError::Session("nothing loaded".into())),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Readability wrapper that counts how often it is consulted.
#[derive(Debug, Default)]
pub struct CountingReader {
    inner: Readability,
    pub calls: AtomicUsize,
}

impl ContentExtractor for CountingReader {
    fn extract(&self, html: &str, base: &Url) -> Option<Article> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(html, base)
    }
}

/// Poll `check` until it holds or `within` elapses.
pub async fn eventually(within: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
