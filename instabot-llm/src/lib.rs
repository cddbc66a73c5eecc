//! LLM integration for Instabot.
//!
//! This crate exposes a provider-agnostic [`traits::LlmClient`] interface, the
//! OpenAI chat-completions client, and the [`comments::CommentGenerator`] that
//! turns an extracted article into suggested replies. [`ensure_llm_ready`]
//! builds a client from the `llm` section of the configuration.
//!
//! # Examples
//! ```no_run
//! use instabot_config::LlmSettings;
//! use instabot_llm::{comments::{CommentGenerator, CommentOptions}, ensure_llm_ready};
//!
//! # #[tokio::main]
//! # async fn main() -> instabot_common::Result<()> {
//! let settings: LlmSettings = serde_json::from_value(serde_json::json!({
//!     "provider": "openai",
//!     "auth_token": "sk-test",
//! })).unwrap();
//! let client = ensure_llm_ready(&settings).await?;
//! let generator = CommentGenerator::new(client, CommentOptions::from_settings(&settings));
//! let comments = generator.generate_comments("A post about espresso.", None).await?;
//! # Ok(())
//! # }
//! ```
pub mod comments;
pub mod openai;
pub mod traits;

use comments::CommentOptions;
use instabot_common::{InstabotError, DEFAULT_BRAND_TONE};
use instabot_config::LlmSettings;
use openai::OpenAiClient;
use std::sync::Arc;
use traits::LlmClient;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// Build the configured LLM client.
pub async fn ensure_llm_ready(
    settings: &LlmSettings,
) -> instabot_common::Result<Arc<dyn LlmClient>> {
    match settings {
        LlmSettings::Openai {
            model,
            auth_token,
            endpoint,
            ..
        } => {
            if auth_token.trim().is_empty() {
                return Err(InstabotError::Config(
                    "llm.auth_token is empty (set OPENAI_API_KEY or INSTABOT__LLM__AUTH_TOKEN)"
                        .to_string(),
                ));
            }
            let model = if model.trim().is_empty() {
                DEFAULT_OPENAI_MODEL.to_string()
            } else {
                model.clone()
            };
            let client = OpenAiClient::with_endpoint(auth_token.clone(), model, endpoint)?;
            tracing::debug!(target: "llm.openai", model = client.model_name(), %endpoint, "LLM client ready");
            Ok(Arc::new(client))
        }
    }
}

impl CommentOptions {
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            candidates: settings.candidates(),
            max_tokens: settings.max_tokens(),
            temperature: settings.temperature(),
            default_tone: settings
                .brand_tone()
                .unwrap_or(DEFAULT_BRAND_TONE)
                .to_string(),
            ..Self::default()
        }
    }
}
