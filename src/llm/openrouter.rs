//! OpenRouter-compatible chat completions client.
//!
//! Implements the LlmClient trait for any endpoint speaking the
//! `{model, messages, max_tokens}` -> `choices[0].message.content` protocol.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::LlmConfig;
use crate::error::{Result, SmartLineError};
use crate::llm::types::{CompletionRequest, Message};
use crate::llm::LlmClient;

/// OpenRouter client configuration.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// Chat completions URL.
    pub api_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Request timeout in seconds. `None` keeps the transport default.
    pub timeout_secs: Option<u64>,
}

impl OpenRouterConfig {
    /// Creates a new config with the given endpoint and API key.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            timeout_secs: None,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Builds a config from the `[llm]` section, reading the key from the environment.
    pub fn from_llm_config(llm: &LlmConfig) -> Result<Self> {
        Ok(Self {
            api_url: llm.api_url.clone(),
            api_key: llm.api_key()?,
            timeout_secs: llm.timeout_secs,
        })
    }
}

/// HTTP client for the completion endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SmartLineError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Endpoint this client posts to.
    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Turns a non-success response into a Remote error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> SmartLineError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return SmartLineError::remote(format!(
                "Authentication failed ({status}). Check the API key."
            ));
        }

        if let Ok(error_response) = serde_json::from_str::<WireErrorResponse>(body) {
            return SmartLineError::remote(format!(
                "Completion API error ({status}): {}",
                error_response.error.message
            ));
        }

        SmartLineError::remote(format!("Completion API error ({status}): {body}"))
    }

    fn parse_response(body: &str) -> Result<String> {
        let response: WireResponse = serde_json::from_str(body)
            .map_err(|e| SmartLineError::remote(format!("Failed to parse response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SmartLineError::remote("No choices in completion response"))
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = WireRequest {
            model: &request.model,
            messages: Self::convert_messages(&request.messages),
            max_tokens: request.max_tokens,
        };

        debug!(model = %request.model, max_tokens = request.max_tokens, "Sending completion request");

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let err = if e.is_timeout() {
                    SmartLineError::remote("Request timed out")
                } else if e.is_connect() {
                    SmartLineError::remote(format!(
                        "Failed to connect to {}: {e}",
                        self.config.api_url
                    ))
                } else {
                    SmartLineError::remote(format!("Request failed: {e}"))
                };
                error!(model = %request.model, "{err}");
                err
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SmartLineError::remote(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let err = Self::parse_error(status, &text);
            error!(model = %request.model, status = status.as_u16(), "{err}");
            return Err(err);
        }

        Self::parse_response(&text).inspect_err(|e| error!(model = %request.model, "{e}"))
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireErrorResponse {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}
