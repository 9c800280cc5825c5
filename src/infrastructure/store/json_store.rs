//! JSON-file prompt store: an append-only history file plus a
//! single-record current-best snapshot.
//!
//! Both files are replaced through a write-temp-then-rename so a crashed
//! write never leaves a half-written record behind. Writers within one
//! process are serialized by a mutex; concurrent processes are not
//! coordinated and get last-writer-wins semantics on the snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::models::prompt::{NewPromptVersion, PromptStats, StoredPrompt};
use crate::domain::ports::PromptRepository;

const HISTORY_FILE: &str = "prompt_history.json";
const CURRENT_BEST_FILE: &str = "current_best.json";

/// File-backed prompt store rooted at a directory.
pub struct JsonPromptStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonPromptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    fn current_best_path(&self) -> PathBuf {
        self.dir.join(CURRENT_BEST_FILE)
    }

    async fn load_history(&self) -> Result<Vec<StoredPrompt>> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Best-effort read of the current-best snapshot. Missing or
    /// unreadable state counts as an empty store.
    async fn load_current_best(&self) -> Option<StoredPrompt> {
        let path = self.current_best_path();
        if !path.exists() {
            return None;
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(prompt) => Some(prompt),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring unparseable current-best snapshot");
                    None
                }
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable current-best snapshot");
                None
            }
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes =
            serde_json::to_vec_pretty(value).context("failed to serialize store record")?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl PromptRepository for JsonPromptStore {
    async fn current_best(&self) -> Result<Option<StoredPrompt>> {
        Ok(self.load_current_best().await)
    }

    async fn persist(&self, new: NewPromptVersion) -> Result<StoredPrompt> {
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let mut history = self.load_history().await?;
        let version = history.iter().map(|p| p.version).max().unwrap_or(0) + 1;

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

        history.push(stored.clone());
        self.write_json(&self.history_path(), &history).await?;

        let current_best = self.load_current_best().await;
        if current_best.is_none_or(|best| stored.score > best.score) {
            self.write_json(&self.current_best_path(), &stored).await?;
            info!(version, score = stored.score, "new best prompt stored");
        }

        Ok(stored)
    }

    async fn history(&self) -> Result<Vec<StoredPrompt>> {
        self.load_history().await
    }

    async fn stats(&self) -> Result<PromptStats> {
        Ok(PromptStats::from_history(&self.load_history().await?))
    }
}
