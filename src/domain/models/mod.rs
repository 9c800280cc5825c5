//! Domain models.

pub mod attempt;
pub mod config;
pub mod prompt;
pub mod score;

pub use attempt::{CandidateAttempt, GenerationTask, Solution};
pub use config::{
    ApiConfig, Config, ExamplesConfig, IterationConfig, LoggingConfig, MetricTarget, ModelsConfig,
    RetryConfig, SamplingConfig, StoreConfig, StylometryConfig,
};
pub use prompt::{NewPromptVersion, PromptStats, StoredPrompt};
pub use score::{DimensionScores, ScoreBreakdown};
