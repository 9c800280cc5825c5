use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted instruction-prompt version with its observed score.
///
/// Records are immutable once written; the version history is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPrompt {
    /// Full instruction-prompt text
    pub system_prompt: String,

    /// Composite score this prompt achieved
    pub score: f64,

    /// Creation timestamp
    pub timestamp: DateTime<Utc>,

    /// Scripture reference of the originating run
    pub scripture_text: String,

    /// Iteration at which the score was achieved
    pub iteration: u32,

    /// Cumulative tokens spent by the originating run
    pub tokens_used: u64,

    /// Monotonic version number, global across the store, starting at 1
    pub version: u32,

    /// Version this prompt evolved from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<u32>,

    /// Learnings spliced into this prompt, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvements: Option<Vec<String>>,
}

/// Payload for persisting a new prompt version. The store assigns the
/// version number and timestamp.
#[derive(Debug, Clone)]
pub struct NewPromptVersion {
    pub system_prompt: String,
    pub score: f64,
    pub scripture_text: String,
    pub iteration: u32,
    pub tokens_used: u64,
    pub parent_version: Option<u32>,
    pub improvements: Option<Vec<String>>,
}

/// Aggregate view over the prompt version history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptStats {
    pub total_versions: usize,
    pub best_score: f64,
    pub avg_score: f64,
    pub latest_version: u32,
    /// Score delta between the first and latest version; 0 when fewer
    /// than two versions exist
    pub score_improvement: f64,
}

impl PromptStats {
    /// Compute aggregates from a history slice, oldest first.
    pub fn from_history(history: &[StoredPrompt]) -> Self {
        if history.is_empty() {
            return Self::default();
        }

        let scores: Vec<f64> = history.iter().map(|p| p.score).collect();
        let best_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg_score = scores.iter().sum::<f64>() / scores.len() as f64;
        let score_improvement = if scores.len() > 1 {
            scores[scores.len() - 1] - scores[0]
        } else {
            0.0
        };

        Self {
            total_versions: history.len(),
            best_score,
            avg_score,
            latest_version: history.last().map_or(0, |p| p.version),
            score_improvement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(version: u32, score: f64) -> StoredPrompt {
        StoredPrompt {
            system_prompt: format!("prompt v{version}"),
            score,
            timestamp: Utc::now(),
            scripture_text: "Johannes 3:16".to_string(),
            iteration: 1,
            tokens_used: 1000,
            version,
            parent_version: None,
            improvements: None,
        }
    }

    #[test]
    fn test_stats_empty_history() {
        let stats = PromptStats::from_history(&[]);
        assert_eq!(stats.total_versions, 0);
        assert!(stats.best_score.abs() < f64::EPSILON);
        assert_eq!(stats.latest_version, 0);
    }

    #[test]
    fn test_stats_single_version_has_zero_improvement() {
        let stats = PromptStats::from_history(&[stored(1, 0.6)]);
        assert_eq!(stats.total_versions, 1);
        assert!((stats.best_score - 0.6).abs() < f64::EPSILON);
        assert!(stats.score_improvement.abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_improvement_is_first_to_latest() {
        let history = vec![stored(1, 0.5), stored(2, 0.8), stored(3, 0.7)];
        let stats = PromptStats::from_history(&history);
        assert_eq!(stats.total_versions, 3);
        assert!((stats.best_score - 0.8).abs() < f64::EPSILON);
        assert_eq!(stats.latest_version, 3);
        assert!((stats.score_improvement - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_stored_prompt_roundtrip() {
        let mut prompt = stored(4, 0.91);
        prompt.parent_version = Some(2);
        prompt.improvements = Some(vec!["Gebruik meer retorische vragen.".to_string()]);

        let json = serde_json::to_string(&prompt).unwrap();
        let parsed: StoredPrompt = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, prompt);
    }
}
