//! Main-content extraction from rendered HTML.
//!
//! [`Readability`] scores the document's paragraphs, picks the container that
//! holds most of the prose and returns it as an [`Article`]. It is pure and
//! synchronous: the same HTML and base URL always produce the same result.
mod dom;
mod metadata;
mod scoring;

use dom::Dom;
use scoring::Scorer;
use scraper::Html;
use serde::Serialize;
use url::Url;

/// The readable part of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub lang: Option<String>,
    pub published_time: Option<String>,
    /// Cleaned HTML of the main content, links made absolute.
    pub content: String,
    /// Plain text of the main content; paragraphs separated by a blank line.
    pub text_content: String,
    /// Length of `text_content` in characters.
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadabilityOptions {
    /// Minimum characters of main-content text for a page to count as an article.
    pub char_threshold: usize,
    /// Refuse documents with more elements than this; `0` disables the limit.
    pub max_elements: usize,
}

impl Default for ReadabilityOptions {
    fn default() -> Self {
        Self {
            char_threshold: 250,
            max_elements: 0,
        }
    }
}

/// Something that can find the main content of an HTML document.
pub trait ContentExtractor: Send + Sync {
    /// `None` when the document has no identifiable main content.
    fn extract(&self, html: &str, base: &Url) -> Option<Article>;
}

#[derive(Debug, Clone, Default)]
pub struct Readability {
    options: ReadabilityOptions,
}

impl Readability {
    pub fn new(options: ReadabilityOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReadabilityOptions {
        &self.options
    }

    pub fn parse(&self, html: &str, base: &Url) -> Option<Article> {
        let doc = Html::parse_document(html);
        let dom = Dom::from_html(&doc);

        if self.options.max_elements > 0 && dom.element_count() > self.options.max_elements {
            tracing::debug!(
                target: "extract.readability",
                elements = dom.element_count(),
                max = self.options.max_elements,
                "document too large"
            );
            return None;
        }

        let selection = Scorer::new(&dom).select()?;
        let text_content = dom.render_text(&selection.roots, &selection.skip);
        let length = text_content.chars().count();
        if length < self.options.char_threshold {
            tracing::debug!(
                target: "extract.readability",
                length,
                threshold = self.options.char_threshold,
                "main content below threshold"
            );
            return None;
        }
        let content = dom.render_html(&selection.roots, &selection.skip, base);

        let meta = metadata::extract(&doc);
        let excerpt = meta.excerpt.or_else(|| {
            text_content
                .split("\n\n")
                .next()
                .map(str::to_string)
                .filter(|s| !s.is_empty())
        });

        Some(Article {
            title: meta.title,
            byline: meta.byline,
            excerpt,
            site_name: meta.site_name,
            lang: meta.lang,
            published_time: meta.published_time,
            content,
            text_content,
            length,
        })
    }
}

impl ContentExtractor for Readability {
    fn extract(&self, html: &str, base: &Url) -> Option<Article> {
        self.parse(html, base)
    }
}
