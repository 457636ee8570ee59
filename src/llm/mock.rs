//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns and records
//! every request it receives.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{Result, SmartLineError};
use crate::llm::types::CompletionRequest;
use crate::llm::LlmClient;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Status(u16),
}

/// Mock LLM client that returns canned responses based on input patterns.
///
/// A pattern matches when it occurs (case-insensitively) in the model name or
/// in the prompt. Rules are checked in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    rules: Vec<(String, Reply)>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// When the input contains `pattern`, the mock returns `response`.
    pub fn with_response(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules
            .push((pattern.into(), Reply::Text(response.into())));
        self
    }

    /// When the input contains `pattern`, the mock fails as if the endpoint
    /// answered with `status`.
    pub fn with_failure(mut self, pattern: impl Into<String>, status: u16) -> Self {
        self.rules.push((pattern.into(), Reply::Status(status)));
        self
    }

    /// Requests received so far, across all clones.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn reply_for(&self, request: &CompletionRequest) -> Reply {
        let model = request.model.to_lowercase();
        let prompt = request.prompt().to_lowercase();

        self.rules
            .iter()
            .find(|(pattern, _)| {
                let pattern = pattern.to_lowercase();
                model.contains(&pattern) || prompt.contains(&pattern)
            })
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| {
                Reply::Text("I don't understand that request. Could you rephrase it?".to_string())
            })
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.reply_for(request) {
            Reply::Text(text) => Ok(text),
            Reply::Status(status) => Err(SmartLineError::remote(format!(
                "Completion API error ({status})"
            ))),
        }
    }
}
