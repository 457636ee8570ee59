//! Remote completion layer for smart-line.
//!
//! A natural-language request travels through two chained calls: the
//! [`Planner`] asks for a list of sub-steps, then the [`Synthesizer`] turns
//! the request and the plan into one SQL statement wrapped in a code fence.

pub mod fence;
pub mod mock;
pub mod openrouter;
pub mod planner;
pub mod prompt;
pub mod synthesizer;
pub mod types;

pub use fence::strip_fence;
pub use mock::MockLlmClient;
pub use openrouter::{OpenRouterClient, OpenRouterConfig};
pub use planner::Planner;
pub use synthesizer::Synthesizer;
pub use types::{CompletionRequest, Message, Role};

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;

/// Trait for clients that can produce a completion.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends one request and returns the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Collapses a failed remote call to the empty string.
///
/// The failure has already been logged where it happened; an empty string
/// downstream means "no result", never a valid plan or statement.
pub fn or_empty(result: Result<String>) -> String {
    result.unwrap_or_else(|e| {
        warn!("{}: continuing with an empty result", e.category());
        String::new()
    })
}
