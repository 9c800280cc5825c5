use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::prompt::{NewPromptVersion, PromptStats, StoredPrompt};

/// Port trait for the prompt version store.
///
/// The store owns the append-only version history and the current-best
/// snapshot; all other components go through these operations and never
/// mutate stored state directly.
#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// The current-best prompt, or `None` when the store is empty.
    ///
    /// Retrieval is best-effort: adapters treat missing or unreadable
    /// state as an empty store rather than failing, so callers can
    /// always fall back to the baseline prompt at version 0.
    async fn current_best(&self) -> Result<Option<StoredPrompt>>;

    /// Persist a new prompt version.
    ///
    /// Assigns the next monotonic version number (max existing + 1, or 1
    /// for an empty store), appends to the history unconditionally, and
    /// overwrites the current-best snapshot only when the new score
    /// strictly exceeds the existing best. Returns the stored record
    /// with its assigned version.
    async fn persist(&self, new: NewPromptVersion) -> Result<StoredPrompt>;

    /// Full version history, oldest first.
    async fn history(&self) -> Result<Vec<StoredPrompt>>;

    /// Aggregate statistics over the version history.
    async fn stats(&self) -> Result<PromptStats>;
}
