//! Groq client wrapper speaking the OpenAI-compatible chat completions API.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentcrew::client_wrapper::{ClientWrapper, Message, Role};
//! use agentcrew::clients::groq::{GroqClient, Model};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = std::env::var("GROQ_API_KEY")?;
//!     let client = GroqClient::new_with_model_enum(&key, Model::Llama3_70b8192);
//!     let reply = client
//!         .send_message(&[Message::new(Role::User, "Olá!")])
//!         .await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

use crate::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use crate::clients::common::{get_shared_http_client, parse_wait_hint};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::Mutex;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Models offered in the chat sidebar.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    /// `llama3-70b-8192`
    Llama3_70b8192,
    /// `llama3-8b-8192`
    Llama3_8b8192,
    /// `mixtral-8x7b-32768`
    Mixtral8x7b32768,
    /// `gemma-7b-it`
    Gemma7bIt,
}

impl Model {
    pub const ALL: [Model; 4] = [
        Model::Llama3_70b8192,
        Model::Llama3_8b8192,
        Model::Mixtral8x7b32768,
        Model::Gemma7bIt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Llama3_70b8192 => "llama3-70b-8192",
            Model::Llama3_8b8192 => "llama3-8b-8192",
            Model::Mixtral8x7b32768 => "mixtral-8x7b-32768",
            Model::Gemma7bIt => "gemma-7b-it",
        }
    }

    /// Per-window token ceiling used to seed the [`RateLimiter`](crate::RateLimiter).
    pub fn default_ceiling(&self) -> u64 {
        match self {
            Model::Llama3_70b8192 => 6_000,
            Model::Llama3_8b8192 => 30_000,
            Model::Mixtral8x7b32768 => 5_000,
            Model::Gemma7bIt => 15_000,
        }
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown model '{}'", s))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

/// Client wrapper for Groq's hosted models.
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    token_usage: Mutex<Option<TokenUsage>>,
}

impl GroqClient {
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, model.as_str())
    }

    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, GROQ_BASE_URL)
    }

    /// Point the wrapper at any OpenAI-compatible base URL (e.g. a local proxy).
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        GroqClient {
            http: get_shared_http_client().clone(),
            api_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    /// Use `http` instead of the shared pooled client.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}

#[async_trait]
impl ClientWrapper for GroqClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: m.content.as_ref(),
                })
                .collect(),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("GroqClient::send_message(...): transport error: {}", e);
                ClientError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let wait = parse_wait_hint(retry_after.as_deref(), &body);
                log::warn!(
                    "GroqClient::send_message(...): rate limited on {} (wait hint: {:?})",
                    self.model,
                    wait
                );
                return Err(ClientError::RateLimited {
                    wait,
                    message: body,
                });
            }

            log::error!(
                "GroqClient::send_message(...): API error {} for {}: {}",
                status,
                self.model,
                body
            );
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            *self.token_usage.lock().await = Some(TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            });
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClientError::InvalidResponse("no choices in response".to_string()))?;

        Ok(Message::new(Role::Assistant, content))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_round_trip_through_from_str() {
        for model in Model::ALL {
            assert_eq!(model.as_str().parse::<Model>(), Ok(model));
        }
        assert!("gpt-4o".parse::<Model>().is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = GroqClient::new_with_base_url("key", "llama3-8b-8192", "http://localhost:9/v1/");
        assert_eq!(client.base_url, "http://localhost:9/v1");
        assert_eq!(client.model_name(), "llama3-8b-8192");
    }
}
