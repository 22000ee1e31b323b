//! Chat model access: statement generation, validation and summaries.
//!
//! Generation is the only call whose failure aborts a request. The
//! summarizer calls degrade to fixed placeholder text.

pub mod client;
pub mod prompts;

pub use client::AzureChatClient;

use crate::config::ModelConfig;
use crate::error::GenerationError;
use crate::models::{BatchRequest, ExecutionOutcome, ModelVariant, RequestMode};
use async_trait::async_trait;
use tracing::{debug, error, warn};

/// Returned when the refinement call fails.
pub const REFINE_FAILED_MESSAGE: &str =
    "The statements ran, but a summary of the results could not be generated.";

pub const HISTORY_FAILED_MESSAGE: &str = "Error summarizing history.";

pub const HISTORY_EMPTY_MESSAGE: &str = "No prior history available.";

/// One system + user exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        variant: ModelVariant,
        request: &ChatRequest,
    ) -> Result<String, GenerationError>;
}

/// Ask the selected model for statements answering `request`.
pub async fn generate_statements(
    model: &dyn ChatModel,
    config: &ModelConfig,
    request: &BatchRequest,
) -> Result<String, GenerationError> {
    let (system, max_tokens) = match request.mode {
        RequestMode::Query => (prompts::QUERY_SYSTEM_PROMPT, config.max_tokens),
        RequestMode::Action => (prompts::ACTION_SYSTEM_PROMPT, config.action_max_tokens),
    };
    let chat = ChatRequest {
        system: system.to_string(),
        user: prompts::generation_message(&request.request, request.history.as_deref()),
        max_tokens,
        temperature: config.temperature,
    };

    let text = model.complete(request.variant, &chat).await?;
    debug!("Generated statements:\n{}", text);
    Ok(text)
}

/// Second pass over generated read statements.
///
/// A failed pass keeps the unvalidated text.
pub async fn validate_statements(model: &dyn ChatModel, config: &ModelConfig, generated: &str) -> String {
    let chat = ChatRequest {
        system: prompts::VALIDATION_SYSTEM_PROMPT.to_string(),
        user: prompts::validation_message(generated),
        max_tokens: config.max_tokens,
        temperature: 0.5,
    };

    match model.complete(ModelVariant::Primary, &chat).await {
        Ok(validated) => validated,
        Err(e) => {
            warn!("Statement validation failed, using unvalidated text: {}", e);
            generated.to_string()
        }
    }
}

/// Narrative over the outcomes of a batch.
pub async fn refine_results(
    model: &dyn ChatModel,
    config: &ModelConfig,
    request: &BatchRequest,
    outcomes: &[ExecutionOutcome],
) -> String {
    let history = request.history.as_deref().unwrap_or("");
    let chat = match request.mode {
        RequestMode::Query => ChatRequest {
            system: prompts::QUERY_REFINE_SYSTEM_PROMPT.to_string(),
            user: prompts::query_refine_message(&request.request, outcomes, history),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        },
        RequestMode::Action => ChatRequest {
            system: prompts::ACTION_REFINE_SYSTEM_PROMPT.to_string(),
            user: prompts::action_refine_message(&request.request, outcomes, history),
            max_tokens: config.action_max_tokens,
            temperature: config.temperature,
        },
    };

    match model.complete(ModelVariant::Primary, &chat).await {
        Ok(narrative) => narrative,
        Err(e) => {
            error!("Refinement failed: {}", e);
            REFINE_FAILED_MESSAGE.to_string()
        }
    }
}

/// Compress prior history plus the latest narrative into a short summary.
pub async fn compress_history(
    model: &dyn ChatModel,
    config: &ModelConfig,
    prior: Option<&str>,
    narrative: &str,
) -> String {
    let text = format!("{} {}", prior.unwrap_or(""), narrative);
    let text = text.trim();
    if text.is_empty() {
        return HISTORY_EMPTY_MESSAGE.to_string();
    }

    let chat = ChatRequest {
        system: prompts::HISTORY_SYSTEM_PROMPT.to_string(),
        user: text.to_string(),
        max_tokens: config.summary_max_tokens,
        temperature: 0.5,
    };

    match model.complete(ModelVariant::Primary, &chat).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("History summarization failed: {}", e);
            HISTORY_FAILED_MESSAGE.to_string()
        }
    }
}
