use anyhow::Result;
use async_trait::async_trait;

/// One completion request to the hosted model.
///
/// This is the whole boundary: a system instruction, a single user
/// message, and sampling parameters. Conversation state never spans
/// requests.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// System instruction
    pub system: String,

    /// User message
    pub user: String,

    /// Sampling temperature (0.0-1.0)
    pub temperature: f64,

    /// Maximum output tokens
    pub max_tokens: u32,
}

/// Completed response: generated text plus token accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Port trait for the generation/judgment model.
///
/// The sole network-facing boundary of the crate. Adapters own retry
/// behaviour for transient failures; an error returned here is terminal
/// and aborts the run.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one request and wait for the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}
