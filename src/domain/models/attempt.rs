use serde::{Deserialize, Serialize};

use super::score::ScoreBreakdown;

/// Immutable input to one generation run.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    /// Scripture reference the sermon is about (e.g. "Jakobus 5:13-18")
    pub scripture_text: String,

    /// The scripture passage itself
    pub scripture_context: String,

    /// Full texts of reference sermons used as style examples
    pub reference_sermons: Vec<String>,

    /// Iteration budget for this run
    pub max_iterations: u32,

    /// Composite score at which the run terminates early
    pub target_score: f64,
}

/// One generation result within a run.
///
/// Immutable after creation; the best-scoring attempt across a run is
/// what the controller ultimately returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAttempt {
    /// Generated sermon text
    pub text: String,

    /// Full score breakdown
    pub score: ScoreBreakdown,

    /// 1-based iteration index within the run
    pub iteration: u32,

    /// Cumulative input tokens across the run up to and including this attempt
    pub input_tokens: u64,

    /// Cumulative output tokens across the run up to and including this attempt
    pub output_tokens: u64,

    /// The exact instruction prompt that produced this attempt
    pub system_prompt: String,

    /// Version of the stored prompt this attempt descended from
    /// (0 when the run started from the baseline asset)
    pub prompt_version: u32,
}

/// A retained (text, feedback, score) triple used to construct feedback
/// blocks for later iterations. Accumulated within one run, discarded at
/// run end.
#[derive(Debug, Clone)]
pub struct Solution {
    pub sermon: String,
    pub feedback: String,
    pub score: f64,
}
