use async_trait::async_trait;
use instabot_common::{InstabotError, Result};
use instabot_http::HttpError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Model returned no choices")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LlmError> for InstabotError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Http(HttpError::Network(msg)) => InstabotError::Network(msg),
            LlmError::Config(msg) => InstabotError::Config(msg),
            other => InstabotError::Api(other.to_string()),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Ask for `n` independent completions of the same prompt.
    ///
    /// Providers that can sample several choices in one request override
    /// this; the fallback issues `n` sequential requests.
    async fn generate_candidates(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        n: u32,
    ) -> Result<Vec<LlmResponse>> {
        let mut out = Vec::with_capacity(n as usize);
        for _ in 0..n {
            out.push(
                self.generate(prompt, system_prompt, max_tokens, temperature)
                    .await?,
            );
        }
        Ok(out)
    }

    /// Check if the LLM service is available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
