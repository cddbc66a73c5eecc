//! The article extraction pipeline: URL in, readable text (or a typed error) out.
use crate::{
    browser::{capture_page, CaptureOptions},
    error::ExtractionError,
    readability::{Article, ContentExtractor},
};
use instabot_drivers::instabot_browser::session::{BrowserLauncher, IdlePolicy};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// A validated extraction target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Correlates the log lines of one extraction.
    pub id: Uuid,
    pub url: Url,
}

impl ExtractionRequest {
    /// Accept only non-empty, absolute `http`/`https` URLs with a host.
    pub fn parse(input: &str) -> Result<Self, ExtractionError> {
        let invalid = |reason: &str| ExtractionError::InvalidInput {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("url is empty"));
        }
        let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(&format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("url has no host"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            url,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Upper bound on navigation plus the network-idle wait.
    pub navigation_timeout: Duration,
    pub idle: IdlePolicy,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            idle: IdlePolicy::default(),
        }
    }
}

/// Runs the capture → parse → extract pipeline against injected capabilities.
#[derive(Clone)]
pub struct ArticleExtractor {
    launcher: Arc<dyn BrowserLauncher>,
    reader: Arc<dyn ContentExtractor>,
    options: ExtractionOptions,
}

impl ArticleExtractor {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        reader: Arc<dyn ContentExtractor>,
        options: ExtractionOptions,
    ) -> Self {
        Self {
            launcher,
            reader,
            options,
        }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Extract the main article of `url` with its metadata.
    pub async fn extract(&self, url: &str) -> Result<Article, ExtractionError> {
        let request = ExtractionRequest::parse(url)?;
        let span = tracing::info_span!(
            target: "extract.pipeline",
            "extract",
            request_id = %request.id,
            url = %request.url,
        );
        async move {
            let result = self.run(&request).await;
            match &result {
                Ok(article) => info!(
                    target: "extract.pipeline",
                    length = article.length,
                    title = article.title.as_deref().unwrap_or_default(),
                    "article extracted"
                ),
                Err(e) => warn!(
                    target: "extract.pipeline",
                    kind = %e.kind(),
                    error = %e,
                    "extraction failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Extract only the plain text of the main article.
    pub async fn extract_article(&self, url: &str) -> Result<String, ExtractionError> {
        self.extract(url).await.map(|article| article.text_content)
    }

    async fn run(&self, request: &ExtractionRequest) -> Result<Article, ExtractionError> {
        let capture = capture_page(
            self.launcher.as_ref(),
            &request.url,
            &CaptureOptions {
                navigation_timeout: self.options.navigation_timeout,
                idle: self.options.idle,
            },
        )
        .await?;

        info!(
            target: "extract.pipeline",
            final_url = %capture.base_url(),
            bytes = capture.html.len(),
            checksum = %blake3::hash(capture.html.as_bytes()).to_hex(),
            "page captured"
        );

        self.reader
            .extract(&capture.html, capture.base_url())
            .ok_or_else(|| ExtractionError::NoContentExtracted {
                url: capture.base_url().to_string(),
            })
    }
}
