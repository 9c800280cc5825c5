//! Stylometric analysis and deviation scoring for generated sermons.
//!
//! Pure computation over text surface statistics: no I/O, no failure
//! modes. Degenerate input (empty text, zero sentences) degrades to
//! zero-valued ratio metrics instead of raising.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::config::{MetricTarget, StylometryConfig};

/// Leading scripture header emitted by the reference corpus export.
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^NBV21\[.*?\]").expect("valid header regex"));

/// Sentence terminator runs.
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));

/// Alphanumeric word tokens (unicode-aware).
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Surface metrics extracted from one sermon text.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StylometricMetrics {
    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_sentence_length: f64,
    pub sentence_length_std: f64,
    pub question_count: usize,
    pub question_ratio: f64,
    pub exclamation_count: usize,
    pub unique_words: usize,
    pub lexical_diversity: f64,
    pub comma_per_sentence: f64,
    pub colon_count: usize,
}

/// Analysis result: metrics plus the case-folded word tokens, which the
/// keyword-frequency scorer consumes separately.
#[derive(Debug, Clone)]
pub struct SermonAnalysis {
    pub metrics: StylometricMetrics,
    pub words: Vec<String>,
}

/// Analyze stylometric characteristics of a sermon.
pub fn analyze(text: &str) -> SermonAnalysis {
    let text = HEADER_RE.replace(text, "");
    let text = text.trim();

    // Sentences: split on terminator runs, discard short fragments
    let sentences: Vec<&str> = SENTENCE_RE
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > 5)
        .collect();

    let words: Vec<String> = WORD_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect();

    let sentence_lengths: Vec<usize> = sentences
        .iter()
        .map(|s| s.split_whitespace().count())
        .collect();

    let sentence_count = sentences.len();
    let question_count = text.matches('?').count();
    let unique_words = words
        .iter()
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    let metrics = StylometricMetrics {
        char_count: text.chars().count(),
        word_count: words.len(),
        sentence_count,
        avg_sentence_length: mean(&sentence_lengths),
        sentence_length_std: sample_std(&sentence_lengths),
        question_count,
        question_ratio: ratio(question_count, sentence_count),
        exclamation_count: text.matches('!').count(),
        unique_words,
        lexical_diversity: ratio(unique_words, words.len()),
        comma_per_sentence: ratio(text.matches(',').count(), sentence_count),
        colon_count: text.matches(':').count(),
    };

    SermonAnalysis { metrics, words }
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

/// Sample standard deviation; 0 for fewer than two values.
fn sample_std(values: &[usize]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values
        .iter()
        .map(|&v| (v as f64 - m).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Score how close a metric lies to its target distribution.
///
/// 1.0 within one standard deviation of the mean, linearly decaying to
/// 0.0 at three standard deviations. A zero-std target scores 1.0 only
/// on exact match.
pub fn score_metric_deviation(value: f64, target: &MetricTarget) -> f64 {
    if target.std == 0.0 {
        return if (value - target.mean).abs() < f64::EPSILON {
            1.0
        } else {
            0.0
        };
    }

    let z = (value - target.mean).abs() / target.std;
    if z <= 1.0 {
        1.0
    } else if z >= 3.0 {
        0.0
    } else {
        1.0 - (z - 1.0) / 2.0
    }
}

/// Observed frequency per 1000 words for each target keyword.
pub fn keyword_frequencies(
    words: &[String],
    targets: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    if words.is_empty() {
        return targets.keys().map(|w| (w.clone(), 0.0)).collect();
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for word in words {
        *counts.entry(word.as_str()).or_default() += 1;
    }

    let total = words.len() as f64;
    targets
        .keys()
        .map(|word| {
            let count = counts.get(word.as_str()).copied().unwrap_or(0);
            (word.clone(), count as f64 / total * 1000.0)
        })
        .collect()
}

/// Score an observed keyword rate against its target rate.
///
/// Within 0.5x-2x of target scores 1.0; within 0.25x-4x scores 0.5;
/// otherwise 0.0. A zero target scores 1.0 when the observed rate stays
/// below 1, else 0.5.
pub fn score_keyword_rate(observed: f64, target: f64) -> f64 {
    if target == 0.0 {
        return if observed < 1.0 { 1.0 } else { 0.5 };
    }

    let ratio = observed / target;
    if (0.5..=2.0).contains(&ratio) {
        1.0
    } else if (0.25..=4.0).contains(&ratio) {
        0.5
    } else {
        0.0
    }
}

/// Composite stylometric score with its per-metric components.
#[derive(Debug, Clone)]
pub struct StylometricScore {
    /// Weighted composite in [0, 1]
    pub score: f64,

    /// Per-metric deviation scores, keyed by metric name
    pub individual: BTreeMap<String, f64>,

    /// Observed keyword frequencies per 1000 words
    pub keyword_frequencies: BTreeMap<String, f64>,
}

/// Fixed weights per metric. Length and core vocabulary weigh heaviest;
/// structural ratios weigh lower.
const METRIC_WEIGHTS: [(&str, f64); 7] = [
    ("char_count", 2.0),
    ("avg_sentence_length", 1.5),
    ("sentence_length_std", 1.0),
    ("question_ratio", 1.0),
    ("lexical_diversity", 1.5),
    ("comma_per_sentence", 0.5),
    ("theological_vocabulary", 2.0),
];

fn metric_targets(config: &StylometryConfig) -> [(&'static str, MetricTarget); 6] {
    [
        ("char_count", config.char_count),
        ("avg_sentence_length", config.avg_sentence_length),
        ("sentence_length_std", config.sentence_length_std),
        ("question_ratio", config.question_ratio),
        ("lexical_diversity", config.lexical_diversity),
        ("comma_per_sentence", config.comma_per_sentence),
    ]
}

fn metric_value(metrics: &StylometricMetrics, name: &str) -> f64 {
    match name {
        "char_count" => metrics.char_count as f64,
        "avg_sentence_length" => metrics.avg_sentence_length,
        "sentence_length_std" => metrics.sentence_length_std,
        "question_ratio" => metrics.question_ratio,
        "lexical_diversity" => metrics.lexical_diversity,
        "comma_per_sentence" => metrics.comma_per_sentence,
        _ => 0.0,
    }
}

/// Compute the weighted stylometric composite for an analyzed sermon.
pub fn compute_score(analysis: &SermonAnalysis, config: &StylometryConfig) -> StylometricScore {
    let mut individual = BTreeMap::new();

    for (name, target) in metric_targets(config) {
        let value = metric_value(&analysis.metrics, name);
        individual.insert(name.to_string(), score_metric_deviation(value, &target));
    }

    let frequencies = keyword_frequencies(&analysis.words, &config.word_targets);
    let keyword_scores: Vec<f64> = config
        .word_targets
        .iter()
        .map(|(word, &target)| {
            score_keyword_rate(frequencies.get(word).copied().unwrap_or(0.0), target)
        })
        .collect();
    let vocabulary_score = if keyword_scores.is_empty() {
        0.5
    } else {
        keyword_scores.iter().sum::<f64>() / keyword_scores.len() as f64
    };
    individual.insert("theological_vocabulary".to_string(), vocabulary_score);

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for (name, weight) in METRIC_WEIGHTS {
        if let Some(score) = individual.get(name) {
            weighted += score * weight;
            total_weight += weight;
        }
    }

    StylometricScore {
        score: if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        },
        individual,
        keyword_frequencies: frequencies,
    }
}

/// Generate itemized Dutch feedback on stylometric deviations.
///
/// Each deviation is an independent sentence; a single default message
/// is returned when nothing deviates.
pub fn deviation_feedback(analysis: &SermonAnalysis, config: &StylometryConfig) -> String {
    let scored = compute_score(analysis, config);
    let metrics = &analysis.metrics;
    let mut parts: Vec<String> = Vec::new();

    let char_count = metrics.char_count as f64;
    let target = &config.char_count;
    if char_count < target.min {
        parts.push(format!(
            "De preek is te kort ({} karakters). Jüngel-preken zijn typisch {:.0}-{:.0} karakters.",
            metrics.char_count, target.min, target.max
        ));
    } else if char_count > target.max {
        parts.push(format!(
            "De preek is te lang ({} karakters). Jüngel-preken zijn typisch {:.0}-{:.0} karakters.",
            metrics.char_count, target.min, target.max
        ));
    }

    let target = &config.avg_sentence_length;
    if metrics.avg_sentence_length < target.min {
        parts.push(format!(
            "Zinnen zijn gemiddeld te kort ({:.1} woorden). Streef naar ~{:.0} woorden per zin.",
            metrics.avg_sentence_length, target.mean
        ));
    } else if metrics.avg_sentence_length > target.max {
        parts.push(format!(
            "Zinnen zijn gemiddeld te lang ({:.1} woorden). Streef naar ~{:.0} woorden per zin.",
            metrics.avg_sentence_length, target.mean
        ));
    }

    if scored
        .individual
        .get("sentence_length_std")
        .is_some_and(|&s| s < 0.5)
    {
        parts.push(
            "Er is te weinig variatie in zinslengte. Jüngel wisselt korte en lange zinnen af \
             voor retorisch effect."
                .to_string(),
        );
    }

    if scored
        .individual
        .get("question_ratio")
        .is_some_and(|&s| s < 0.5)
    {
        if metrics.question_count == 0 {
            parts.push(
                "De preek bevat geen retorische vragen. Jüngel gebruikt regelmatig vragen om de \
                 hoorder te betrekken."
                    .to_string(),
            );
        } else if metrics.question_count > 20 {
            parts.push(
                "Te veel vragen. Jüngel gebruikt vragen spaarzaam maar effectief.".to_string(),
            );
        }
    }

    let freq = |word: &str| scored.keyword_frequencies.get(word).copied().unwrap_or(0.0);
    if freq("god") < 5.0 {
        parts.push(
            "Het woord 'God' komt weinig voor. In Jüngel-preken is God het centrale onderwerp."
                .to_string(),
        );
    }
    if freq("jezus") + freq("christus") < 3.0 {
        parts.push(
            "Jezus/Christus wordt weinig genoemd. Jüngel preekt christocentrisch.".to_string(),
        );
    }

    if parts.is_empty() {
        "Stilometrisch gezien ligt de preek dicht bij Jüngels stijl.".to_string()
    } else {
        parts.join("\n")
    }
}
