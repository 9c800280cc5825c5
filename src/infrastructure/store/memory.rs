//! In-memory prompt store, primarily for tests and dry runs.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::models::prompt::{NewPromptVersion, PromptStats, StoredPrompt};
use crate::domain::ports::PromptRepository;

#[derive(Default)]
struct State {
    history: Vec<StoredPrompt>,
    current_best: Option<StoredPrompt>,
}

/// Prompt store with the same semantics as the file-backed adapter but
/// no persistence across process restarts.
#[derive(Default)]
pub struct InMemoryPromptStore {
    state: RwLock<State>,
}

impl InMemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store with an existing record, for tests that need a
    /// non-empty baseline.
    pub async fn seed(&self, prompt: StoredPrompt) {
        let mut state = self.state.write().await;
        let replace_best = state
            .current_best
            .as_ref()
            .is_none_or(|best| prompt.score > best.score);
        if replace_best {
            state.current_best = Some(prompt.clone());
        }
        state.history.push(prompt);
    }
}

#[async_trait]
impl PromptRepository for InMemoryPromptStore {
    async fn current_best(&self) -> anyhow::Result<Option<StoredPrompt>> {
        Ok(self.state.read().await.current_best.clone())
    }

    async fn persist(&self, new: NewPromptVersion) -> anyhow::Result<StoredPrompt> {
        let mut state = self.state.write().await;
        let version = state.history.iter().map(|p| p.version).max().unwrap_or(0) + 1;

        let stored = StoredPrompt {
            system_prompt: new.system_prompt,
            score: new.score,
            timestamp: Utc::now(),
            scripture_text: new.scripture_text,
            iteration: new.iteration,
            tokens_used: new.tokens_used,
            version,
            parent_version: new.parent_version,
            improvements: new.improvements,
        };

        state.history.push(stored.clone());
        let replace_best = state
            .current_best
            .as_ref()
            .is_none_or(|best| stored.score > best.score);
        if replace_best {
            state.current_best = Some(stored.clone());
        }

        Ok(stored)
    }

    async fn history(&self) -> anyhow::Result<Vec<StoredPrompt>> {
        Ok(self.state.read().await.history.clone())
    }

    async fn stats(&self) -> anyhow::Result<PromptStats> {
        Ok(PromptStats::from_history(&self.state.read().await.history))
    }
}
