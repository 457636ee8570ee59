//! SQL synthesis from a request and its plan.

use std::sync::Arc;
use tracing::{debug, error};

use crate::auth::User;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::llm::prompt::build_sql_prompt;
use crate::llm::types::CompletionRequest;
use crate::llm::LlmClient;

/// Asks the remote model for one fenced SQL statement.
pub struct Synthesizer {
    client: Arc<dyn LlmClient>,
    model: ModelConfig,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn LlmClient>, model: ModelConfig) -> Self {
        Self { client, model }
    }

    /// Returns the raw reply, fence included. An empty plan is still sent.
    pub async fn synthesize(&self, request: &str, plan: &str, user: &User) -> Result<String> {
        let prompt = build_sql_prompt(request, plan, user);
        let completion = CompletionRequest::single(&self.model.model, prompt, self.model.max_tokens);

        self.client
            .complete(&completion)
            .await
            .inspect(|sql| debug!(model = %self.model.model, "Synthesized:\n{sql}"))
            .inspect_err(|e| error!(model = %self.model.model, "Synthesis failed: {e}"))
    }
}
