use serde::{Deserialize, Serialize};

/// Blend weight of the stylometric composite in the overall score.
pub const STYLOMETRIC_BLEND: f64 = 0.3;

/// Blend weight of the qualitative composite in the overall score.
pub const QUALITATIVE_BLEND: f64 = 0.7;

/// The eight qualitative dimensions rated by the judge, each normalized
/// to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DimensionScores {
    pub theological: f64,
    pub metaphorical: f64,
    pub transformation: f64,
    pub rhetorical: f64,
    pub coherence: f64,
    pub language: f64,
    pub flow: f64,
    pub humor: f64,
}

impl DimensionScores {
    /// Fixed weights per dimension; sums to 1.0.
    pub const WEIGHTS: [(f64, fn(&Self) -> f64); 8] = [
        (0.20, |d| d.theological),
        (0.15, |d| d.metaphorical),
        (0.15, |d| d.transformation),
        (0.15, |d| d.rhetorical),
        (0.10, |d| d.coherence),
        (0.10, |d| d.language),
        (0.10, |d| d.flow),
        (0.05, |d| d.humor),
    ];

    /// Weighted qualitative composite in [0, 1].
    pub fn weighted_composite(&self) -> f64 {
        Self::WEIGHTS
            .iter()
            .map(|(weight, dim)| weight * dim(self))
            .sum()
    }
}

/// Full score breakdown for one candidate sermon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoreBreakdown {
    /// Overall composite score in [0, 1]
    pub overall: f64,

    /// Deterministic stylometric composite in [0, 1]
    pub stylometric: f64,

    /// Weighted qualitative composite in [0, 1]
    pub qualitative: f64,

    /// Discipline multiplier in [0, 1]; penalizes explicit use of
    /// forbidden terminology
    pub discipline: f64,

    /// Per-dimension judge scores
    pub dimensions: DimensionScores,

    /// Itemized stylometric deviation feedback
    pub stylometric_feedback: String,

    /// Assembled judge feedback
    pub judge_feedback: String,
}

impl ScoreBreakdown {
    /// Blend the stylometric and qualitative composites into the overall
    /// score: `(0.3 * stylometric + 0.7 * qualitative) * discipline`.
    pub fn blend(stylometric: f64, qualitative: f64, discipline: f64) -> f64 {
        (STYLOMETRIC_BLEND * stylometric + QUALITATIVE_BLEND * qualitative) * discipline
    }

    /// Stylometric and judge feedback combined into the single feedback
    /// string carried by a [`super::Solution`].
    pub fn combined_feedback(&self) -> String {
        format!(
            "Stilometrie: {}\nLLM feedback: {}",
            self.stylometric_feedback, self.judge_feedback
        )
    }
}
