use crate::traits::{LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use instabot_common::{InstabotError, Result};
use instabot_http::{Auth, HttpClient, RequestOpts};
use serde::{Deserialize, Serialize};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: u32,
}

impl OpenAiClient {
    /// Client against the public OpenAI API.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_endpoint(api_key, model, OPENAI_API_BASE)
    }

    /// Client against any OpenAI-compatible endpoint (gateways, local proxies).
    pub fn with_endpoint(api_key: String, model: String, endpoint: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(InstabotError::Config("OpenAI auth token is empty".into()));
        }
        let base = format!("{}/", endpoint.trim_end_matches('/'));
        let client = HttpClient::new(&base)
            .map_err(|e| InstabotError::Config(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn chat(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        n: u32,
    ) -> std::result::Result<ChatCompletionResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            n: n.max(1),
            max_tokens,
            temperature,
        };

        tracing::debug!(
            target: "llm.openai",
            model = %self.model,
            n = req.n,
            max_tokens = ?max_tokens,
            prompt_chars = prompt.chars().count(),
            "chat completion request"
        );

        self.client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await
            .map_err(|e| match e.status().map(|s| s.as_u16()) {
                Some(429) => LlmError::RateLimit(e.to_string()),
                _ => LlmError::Http(e),
            })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.generate_candidates(prompt, system_prompt, max_tokens, temperature, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse.into())
    }

    async fn generate_candidates(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        n: u32,
    ) -> Result<Vec<LlmResponse>> {
        let resp = self
            .chat(prompt, system_prompt, max_tokens, temperature, n)
            .await?;
        if resp.choices.is_empty() {
            return Err(LlmError::EmptyResponse.into());
        }

        tracing::debug!(
            target: "llm.openai",
            id = %resp.id,
            choices = resp.choices.len(),
            total_tokens = ?resp.usage.as_ref().map(|u| u.total_tokens),
            "chat completion response"
        );

        let tokens_used = resp.usage.as_ref().map(|u| u.total_tokens);
        let model = resp.model.clone().or_else(|| Some(self.model.clone()));
        Ok(resp
            .choices
            .into_iter()
            .map(|choice| LlmResponse {
                text: choice.message.content.unwrap_or_default().trim().to_string(),
                model: model.clone(),
                tokens_used,
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let path = format!("models/{}", self.model);
        let opts = RequestOpts {
            auth: Some(Auth::Bearer(&self.api_key)),
            retries: Some(0),
            timeout: Some(std::time::Duration::from_secs(5)),
            ..Default::default()
        };
        match self.client.get_json::<serde_json::Value>(&path, opts).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(target: "llm.openai", error = %e, "OpenAI health check failed");
                Ok(false)
            }
        }
    }
}
