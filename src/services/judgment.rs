//! LLM-based qualitative judgment of generated sermons.
//!
//! Builds the judge request, parses the structured verdict, and blends
//! the qualitative composite with the stylometric composite into one
//! [`ScoreBreakdown`]. A malformed judge response never fails the run:
//! the verdict falls back to midpoint sub-scores with a parse-error
//! marker, and the iteration continues on degraded signal.

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::models::config::{Config, SamplingConfig, StylometryConfig};
use crate::domain::models::score::{DimensionScores, ScoreBreakdown};
use crate::domain::ports::{CompletionClient, CompletionRequest};
use crate::services::stylometry;

/// Judge instruction payload.
pub const JUDGE_SYSTEM_PROMPT: &str = include_str!("../../prompts/judge_system.txt");

const PARSE_ERROR_FEEDBACK: &str = "Kon response niet parsen";
const PARSE_ERROR_DETAIL: &str = "Parsing error";
const PARSE_ERROR_ASSESSMENT: &str = "Kon LLM response niet parsen.";

fn default_dimension() -> f64 {
    5.0
}

fn default_discipline_score() -> f64 {
    10.0
}

fn default_detail() -> String {
    "N/A".to_string()
}

/// The "show, don't tell" rating: score plus cited violations.
#[derive(Debug, Clone, Deserialize)]
pub struct DisciplineRating {
    #[serde(default = "default_discipline_score")]
    pub score: f64,

    #[serde(default)]
    pub feedback: String,
}

impl Default for DisciplineRating {
    fn default() -> Self {
        Self {
            score: default_discipline_score(),
            feedback: String::new(),
        }
    }
}

/// Per-dimension feedback strings from the judge.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackDetails {
    #[serde(default = "default_detail")]
    pub theological: String,
    #[serde(default = "default_detail")]
    pub metaphorical: String,
    #[serde(default = "default_detail")]
    pub transformation: String,
    #[serde(default = "default_detail")]
    pub rhetorical: String,
    #[serde(default = "default_detail")]
    pub coherence: String,
    #[serde(default = "default_detail")]
    pub language_and_flow: String,
    #[serde(default = "default_detail")]
    pub humor: String,
}

impl Default for FeedbackDetails {
    fn default() -> Self {
        Self {
            theological: default_detail(),
            metaphorical: default_detail(),
            transformation: default_detail(),
            rhetorical: default_detail(),
            coherence: default_detail(),
            language_and_flow: default_detail(),
            humor: default_detail(),
        }
    }
}

/// The judge's structured verdict, on its native 0-10 scale.
///
/// Missing fields in an otherwise parseable response fall back to the
/// midpoint (5) per dimension; a missing discipline rating counts as
/// clean (10).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JudgeRating {
    #[serde(default)]
    pub show_dont_tell_discipline: DisciplineRating,

    #[serde(default = "default_dimension")]
    pub theological_score: f64,
    #[serde(default = "default_dimension")]
    pub metaphorical_score: f64,
    #[serde(default = "default_dimension")]
    pub transformation_score: f64,
    #[serde(default = "default_dimension")]
    pub rhetorical_score: f64,
    #[serde(default = "default_dimension")]
    pub coherence_score: f64,
    #[serde(default = "default_dimension")]
    pub language_score: f64,
    #[serde(default = "default_dimension")]
    pub flow_score: f64,
    #[serde(default = "default_dimension")]
    pub humor_score: f64,
    #[serde(default = "default_dimension")]
    pub length_score: f64,

    #[serde(default)]
    pub feedback_details: FeedbackDetails,

    #[serde(default)]
    pub overall_assessment: String,
}

impl JudgeRating {
    /// Neutral rating substituted when the response cannot be parsed.
    fn fallback() -> Self {
        let detail = |_: &str| PARSE_ERROR_DETAIL.to_string();
        Self {
            show_dont_tell_discipline: DisciplineRating {
                score: 5.0,
                feedback: PARSE_ERROR_FEEDBACK.to_string(),
            },
            theological_score: 5.0,
            metaphorical_score: 5.0,
            transformation_score: 5.0,
            rhetorical_score: 5.0,
            coherence_score: 5.0,
            language_score: 5.0,
            flow_score: 5.0,
            humor_score: 5.0,
            length_score: 5.0,
            feedback_details: FeedbackDetails {
                theological: detail("theological"),
                metaphorical: detail("metaphorical"),
                transformation: detail("transformation"),
                rhetorical: detail("rhetorical"),
                coherence: detail("coherence"),
                language_and_flow: detail("language_and_flow"),
                humor: detail("humor"),
            },
            overall_assessment: PARSE_ERROR_ASSESSMENT.to_string(),
        }
    }
}

/// Outcome of the parse boundary, decided exactly once per response.
#[derive(Debug, Clone)]
pub enum JudgeVerdict {
    /// The response contained a parseable JSON object.
    Parsed(JudgeRating),
    /// The response could not be parsed; neutral defaults apply.
    Fallback,
}

impl JudgeVerdict {
    pub fn into_rating(self) -> JudgeRating {
        match self {
            Self::Parsed(rating) => rating,
            Self::Fallback => JudgeRating::fallback(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// Parse the judge response into a verdict.
///
/// Judges sometimes wrap the JSON object in prose, so the parse window
/// runs from the first `{` to the last `}`.
pub fn parse_verdict(response: &str) -> JudgeVerdict {
    let Some(start) = response.find('{') else {
        return JudgeVerdict::Fallback;
    };
    let Some(end) = response.rfind('}') else {
        return JudgeVerdict::Fallback;
    };
    if end < start {
        return JudgeVerdict::Fallback;
    }

    match serde_json::from_str::<JudgeRating>(&response[start..=end]) {
        Ok(rating) => JudgeVerdict::Parsed(rating),
        Err(err) => {
            debug!(error = %err, "judge response did not parse as a rating");
            JudgeVerdict::Fallback
        }
    }
}

fn normalize(score: f64) -> f64 {
    (score / 10.0).clamp(0.0, 1.0)
}

/// Combined qualitative + stylometric scorer for candidate sermons.
pub struct SermonScorer {
    client: Arc<dyn CompletionClient>,
    model: String,
    sampling: SamplingConfig,
    stylometry: StylometryConfig,
    discipline_floor: f64,
}

impl SermonScorer {
    pub fn new(client: Arc<dyn CompletionClient>, config: &Config) -> Self {
        Self {
            client,
            model: config.models.judge.clone(),
            sampling: config.judge.clone(),
            stylometry: config.stylometry.clone(),
            discipline_floor: config.iteration.discipline_floor,
        }
    }

    /// Score a candidate sermon against its originating scripture.
    ///
    /// One judge call per invocation; the stylometric side is computed
    /// locally. Only an unrecovered client error propagates.
    pub async fn score(&self, sermon: &str, scripture: &str) -> Result<ScoreBreakdown> {
        let analysis = stylometry::analyze(sermon);
        let stylometric = stylometry::compute_score(&analysis, &self.stylometry);
        let stylometric_feedback = stylometry::deviation_feedback(&analysis, &self.stylometry);

        let user = format!(
            "Beoordeel de volgende preek:\n\nBIJBELTEKST: {scripture}\n\nPREEK:\n{sermon}\n\n\
             Geef je beoordeling in het gevraagde JSON-formaat."
        );

        let completion = self
            .client
            .complete(CompletionRequest {
                model: self.model.clone(),
                system: JUDGE_SYSTEM_PROMPT.to_string(),
                user,
                temperature: self.sampling.temperature,
                max_tokens: self.sampling.max_tokens,
            })
            .await?;

        let verdict = parse_verdict(&completion.text);
        if verdict.is_fallback() {
            warn!("judge response unparseable, continuing with midpoint sub-scores");
        }
        let rating = verdict.into_rating();

        let dimensions = DimensionScores {
            theological: normalize(rating.theological_score),
            metaphorical: normalize(rating.metaphorical_score),
            transformation: normalize(rating.transformation_score),
            rhetorical: normalize(rating.rhetorical_score),
            coherence: normalize(rating.coherence_score),
            language: normalize(rating.language_score),
            flow: normalize(rating.flow_score),
            humor: normalize(rating.humor_score),
        };
        let qualitative = dimensions.weighted_composite();
        let discipline = normalize(rating.show_dont_tell_discipline.score).max(self.discipline_floor);

        let judge_feedback = assemble_feedback(&rating);
        let overall = ScoreBreakdown::blend(stylometric.score, qualitative, discipline);

        Ok(ScoreBreakdown {
            overall,
            stylometric: stylometric.score,
            qualitative,
            discipline,
            dimensions,
            stylometric_feedback,
            judge_feedback,
        })
    }
}

fn assemble_feedback(rating: &JudgeRating) -> String {
    let details = &rating.feedback_details;
    let mut feedback = format!(
        "Overall: {}\nTheologisch: {}\nMetaforisch: {}\nTransformatie: {}\nRetoriek: {}\n\
         Coherentie: {}\nTaal/Flow: {}\nHumor: {}",
        rating.overall_assessment,
        details.theological,
        details.metaphorical,
        details.transformation,
        details.rhetorical,
        details.coherence,
        details.language_and_flow,
        details.humor,
    );

    if !rating.show_dont_tell_discipline.feedback.is_empty() {
        feedback.push_str(&format!(
            "\nShow don't tell: {}",
            rating.show_dont_tell_discipline.feedback
        ));
    }

    feedback
}
