//! Suggested replies for a blog post.
use crate::traits::LlmClient;
use instabot_common::{Result, DEFAULT_BRAND_TONE};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Hard limit for a single suggested comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 280;

static COMMENT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*_#>-]*(?:comment|option|reply)\s*#?\d+\s*[*_]*\s*[:.)-]\s*[*_]*\s*")
        .expect("comment label pattern")
});

#[derive(Debug, Clone)]
pub struct CommentOptions {
    /// Completions requested per post.
    pub candidates: u32,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub default_tone: String,
    /// Post content beyond this many characters is cut before prompting.
    pub max_content_chars: usize,
}

impl Default for CommentOptions {
    fn default() -> Self {
        Self {
            candidates: 3,
            max_tokens: 150,
            temperature: None,
            default_tone: DEFAULT_BRAND_TONE.to_string(),
            max_content_chars: 12_000,
        }
    }
}

pub struct CommentGenerator {
    client: Arc<dyn LlmClient>,
    options: CommentOptions,
}

impl CommentGenerator {
    pub fn new(client: Arc<dyn LlmClient>, options: CommentOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &CommentOptions {
        &self.options
    }

    /// The instruction sent to the model for one post.
    pub fn build_prompt(&self, post_content: &str, brand_tone: &str) -> String {
        let content = truncate_chars(post_content.trim(), self.options.max_content_chars);
        format!(
            "System: You are a social media assistant for the {brand_tone} brand. \
             Generate three distinct, engaging comments for the following blog post. \
             Each comment should be under {MAX_COMMENT_CHARS} characters.\n\n\
             Post Content:\n{content}\n\n\
             Comment 1:\nComment 2:\nComment 3:"
        )
    }

    /// Ask the model for candidate comments and clean them up: labels are
    /// stripped, empties dropped, duplicates removed and each comment fits
    /// [`MAX_COMMENT_CHARS`].
    pub async fn generate_comments(
        &self,
        post_content: &str,
        brand_tone: Option<&str>,
    ) -> Result<Vec<String>> {
        let tone = brand_tone
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.options.default_tone);
        let prompt = self.build_prompt(post_content, tone);

        let responses = self
            .client
            .generate_candidates(
                &prompt,
                None,
                Some(self.options.max_tokens),
                self.options.temperature,
                self.options.candidates,
            )
            .await?;

        let mut comments: Vec<String> = Vec::new();
        for response in &responses {
            for comment in split_comments(&response.text) {
                if !comments.contains(&comment) {
                    comments.push(comment);
                }
            }
        }

        tracing::info!(
            target: "llm.comments",
            model = self.client.model_name(),
            tone,
            choices = responses.len(),
            comments = comments.len(),
            "comment suggestions generated"
        );
        Ok(comments)
    }
}

/// One model answer may hold several labelled comments (`Comment 1: ...`).
pub fn split_comments(text: &str) -> Vec<String> {
    COMMENT_LABEL
        .split(text)
        .map(clean_comment)
        .filter(|c| !c.is_empty())
        .collect()
}

fn clean_comment(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let unquoted = collapsed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(&collapsed)
        .trim();
    truncate_on_word(unquoted, MAX_COMMENT_CHARS)
}

/// Cut `text` to at most `max` characters, preferring the last word boundary.
pub fn truncate_on_word(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head = truncate_chars(text, max);
    let cut = match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head,
    };
    cut.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .to_string()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
