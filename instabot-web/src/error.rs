use instabot_drivers::instabot_browser::session::BrowserError;
use serde::Serialize;
use std::{fmt, time::Duration};

/// Coarse failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Environment,
    NavigationTimeout,
    Navigation,
    UnsupportedContentType,
    NoContentExtracted,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Environment => "environment",
            ErrorKind::NavigationTimeout => "navigation_timeout",
            ErrorKind::Navigation => "navigation",
            ErrorKind::UnsupportedContentType => "unsupported_content_type",
            ErrorKind::NoContentExtracted => "no_content_extracted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way an extraction can fail.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("invalid url {input:?}: {reason}")]
    InvalidInput { input: String, reason: String },

    #[error("browser unavailable: {0}")]
    Environment(String),

    #[error("navigation to {url} did not settle within {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("{url} is not an HTML document ({content_type})")]
    UnsupportedContentType { url: String, content_type: String },

    #[error("no article content found at {url}")]
    NoContentExtracted { url: String },
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ExtractionError::Environment(_) => ErrorKind::Environment,
            ExtractionError::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            ExtractionError::Navigation { .. } => ErrorKind::Navigation,
            ExtractionError::UnsupportedContentType { .. } => ErrorKind::UnsupportedContentType,
            ExtractionError::NoContentExtracted { .. } => ErrorKind::NoContentExtracted,
        }
    }

    /// HTTP status behind a navigation failure, when known.
    pub fn status(&self) -> Option<u16> {
        match self {
            ExtractionError::Navigation { status, .. } => *status,
            _ => None,
        }
    }

    /// Map a browser failure observed while handling `url`.
    ///
    /// Launch and dead-session failures are environmental; anything the page
    /// itself caused is a navigation failure.
    pub(crate) fn from_browser(url: &str, err: BrowserError) -> Self {
        match err {
            BrowserError::Launch(reason) | BrowserError::Session(reason) => {
                ExtractionError::Environment(reason)
            }
            BrowserError::Navigation { reason, status } => ExtractionError::Navigation {
                url: url.to_string(),
                status,
                reason,
            },
            BrowserError::Script(reason) => ExtractionError::Navigation {
                url: url.to_string(),
                status: None,
                reason,
            },
        }
    }
}
