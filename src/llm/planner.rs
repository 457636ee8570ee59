//! Decomposition of a request into natural-language sub-steps.

use std::sync::Arc;
use tracing::{error, info};

use crate::auth::User;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::llm::prompt::build_plan_prompt;
use crate::llm::types::CompletionRequest;
use crate::llm::LlmClient;

/// Asks the remote model for a plan.
pub struct Planner {
    client: Arc<dyn LlmClient>,
    model: ModelConfig,
}

impl Planner {
    pub fn new(client: Arc<dyn LlmClient>, model: ModelConfig) -> Self {
        Self { client, model }
    }

    /// Returns the plan text exactly as the model produced it.
    pub async fn plan(&self, request: &str, user: &User) -> Result<String> {
        let prompt = build_plan_prompt(request, user);
        let completion = CompletionRequest::single(&self.model.model, prompt, self.model.max_tokens);

        match self.client.complete(&completion).await {
            Ok(plan) => {
                info!(model = %self.model.model, "Plan:\n{plan}");
                Ok(plan)
            }
            Err(e) => {
                error!(model = %self.model.model, "Planning failed: {e}");
                Err(e)
            }
        }
    }
}
