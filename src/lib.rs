//! Predikant - iterative Dutch sermon generation in the style of
//! Eberhard Jüngel.
//!
//! A hosted large-language-model serves as both generator and judge:
//! each iteration generates a candidate sermon, scores it by blending
//! deterministic text statistics with an LLM verdict, and folds the
//! feedback of low-scoring attempts back into the instruction prompt.
//! The best prompt of a run is persisted so later runs start from a
//! better baseline.
//!
//! # Architecture
//!
//! - **Domain layer** (`domain`): data models and port traits
//! - **Service layer** (`services`): scoring, evolution, and the
//!   iteration controller
//! - **Infrastructure layer** (`infrastructure`): Claude HTTP adapter,
//!   configuration loading, prompt store, run artifacts
//! - **CLI layer** (`cli`): command-line interface

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CandidateAttempt, Config, GenerationTask, NewPromptVersion, PromptStats, ScoreBreakdown,
    Solution, StoredPrompt,
};
pub use domain::ports::{Completion, CompletionClient, CompletionRequest, PromptRepository};
pub use infrastructure::claude::{ClaudeApiError, ClaudeClient, ClaudeClientConfig};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::store::{InMemoryPromptStore, JsonPromptStore};
pub use services::{RunOutcome, RunReport, SermonGenerator, SermonScorer};
