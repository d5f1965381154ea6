use std::time::Duration;

use prodex_core::error::AppError;
use prodex_core::models::ExtractionPrompt;
use prodex_core::traits::CompletionClient;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = prodex_core::config::DEFAULT_MODEL;
pub const DEFAULT_BASE_URL: &str = prodex_core::config::DEFAULT_BASE_URL;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a product data extraction specialist.";
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);
const TEMPERATURE: f32 = 0.0;
const MAX_TOKENS: u32 = 1500;

/// OpenAI-compatible chat completion client.
///
/// Decoding is fixed at temperature 0 with a 1500-token cap so replies are
/// as repeatable as the provider allows. The API key arrives with each call.
///
/// Works with any OpenAI-compatible API, including:
/// - OpenAI directly (`https://api.openai.com/v1`)
/// - Gemini via compatibility layer (`https://generativelanguage.googleapis.com/v1beta/openai`)
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    system_prompt: String,
}

impl OpenAiClient {
    pub fn new(model: &str) -> Result<Self, AppError> {
        Self::with_base_url(model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(model: &str, base_url: &str) -> Result<Self, AppError> {
        Self::build(model, base_url, DEFAULT_LLM_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        let rebuilt = Self::build(&self.model, &self.base_url, timeout)?;
        Ok(Self {
            system_prompt: self.system_prompt,
            ..rebuilt
        })
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build(model: &str, base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        })
    }
}

// ---- OpenAI API types ----

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &ExtractionPrompt, api_key: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &self.system_prompt,
                },
                Message {
                    role: "user",
                    content: prompt.as_str(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    format!("Connection failed: {e}")
                } else {
                    e.to_string()
                };
                AppError::LlmError {
                    message,
                    status_code: 0,
                    retryable: e.is_timeout() || e.is_connect(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));

            return Err(AppError::LlmError {
                message,
                status_code,
                retryable: status_code == 429 || status.is_server_error(),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| AppError::LlmError {
            message: format!("Failed to parse LLM response: {e}"),
            status_code: status.as_u16(),
            retryable: false,
        })?;

        let reply = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::LlmError {
                message: "Empty response from LLM".into(),
                status_code: status.as_u16(),
                retryable: false,
            })?;

        tracing::debug!(model = %self.model, reply_len = reply.len(), "LLM reply received");
        Ok(reply)
    }
}
