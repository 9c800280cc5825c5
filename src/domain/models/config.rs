use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Main configuration structure for Predikant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Model identifiers per role
    #[serde(default)]
    pub models: ModelsConfig,

    /// Sampling parameters for sermon generation
    #[serde(default = "default_generator_sampling")]
    pub generator: SamplingConfig,

    /// Sampling parameters for sermon judgment
    #[serde(default = "default_judge_sampling")]
    pub judge: SamplingConfig,

    /// Iteration loop configuration
    #[serde(default)]
    pub iteration: IterationConfig,

    /// Reference example sampling configuration
    #[serde(default)]
    pub examples: ExamplesConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Prompt store and output paths
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Anthropic API endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Stylometric target distributions
    #[serde(default)]
    pub stylometry: StylometryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            generator: default_generator_sampling(),
            judge: default_judge_sampling(),
            iteration: IterationConfig::default(),
            examples: ExamplesConfig::default(),
            retry: RetryConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            stylometry: StylometryConfig::default(),
        }
    }
}

/// Model identifiers per role
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelsConfig {
    /// Model used for sermon generation
    #[serde(default = "default_generator_model")]
    pub generator: String,

    /// Model used for judging candidates (cheaper than the generator)
    #[serde(default = "default_judge_model")]
    pub judge: String,
}

fn default_generator_model() -> String {
    "claude-opus-4-5".to_string()
}

fn default_judge_model() -> String {
    "claude-sonnet-4-5".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            generator: default_generator_model(),
            judge: default_judge_model(),
        }
    }
}

/// Sampling parameters for one model role
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SamplingConfig {
    /// Sampling temperature (0.0-1.0)
    pub temperature: f64,

    /// Maximum output tokens per request
    pub max_tokens: u32,
}

fn default_generator_sampling() -> SamplingConfig {
    SamplingConfig {
        temperature: 0.8,
        max_tokens: 8000,
    }
}

fn default_judge_sampling() -> SamplingConfig {
    SamplingConfig {
        temperature: 0.3,
        max_tokens: 2000,
    }
}

/// Iteration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IterationConfig {
    /// Maximum generation attempts per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Composite score at which a run terminates early
    #[serde(default = "default_target_score")]
    pub target_score: f64,

    /// Number of highest-scoring prior solutions eligible for the feedback block
    #[serde(default = "default_max_solutions_in_feedback")]
    pub max_solutions_in_feedback: usize,

    /// Independent inclusion probability per eligible solution
    #[serde(default = "default_selection_probability")]
    pub selection_probability: f64,

    /// Lower clamp on the discipline multiplier. 0.0 lets a single
    /// terminology violation zero out the composite score.
    #[serde(default)]
    pub discipline_floor: f64,
}

const fn default_max_iterations() -> u32 {
    5
}

const fn default_target_score() -> f64 {
    0.85
}

const fn default_max_solutions_in_feedback() -> usize {
    3
}

const fn default_selection_probability() -> f64 {
    0.8
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            target_score: default_target_score(),
            max_solutions_in_feedback: default_max_solutions_in_feedback(),
            selection_probability: default_selection_probability(),
            discipline_floor: 0.0,
        }
    }
}

/// Reference example sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExamplesConfig {
    /// Number of reference sermons sampled per generation request
    #[serde(default = "default_example_count")]
    pub count: usize,

    /// Fragment start offset in characters (skips the scripture header)
    #[serde(default = "default_fragment_start")]
    pub fragment_start: usize,

    /// Fragment window length in characters
    #[serde(default = "default_fragment_length")]
    pub fragment_length: usize,
}

const fn default_example_count() -> usize {
    5
}

const fn default_fragment_start() -> usize {
    100
}

const fn default_fragment_length() -> usize {
    12_000
}

impl Default for ExamplesConfig {
    fn default() -> Self {
        Self {
            count: default_example_count(),
            fragment_start: default_fragment_start(),
            fragment_length: default_fragment_length(),
        }
    }
}

/// Retry policy configuration
///
/// Each transient failure class has its own back-off base: rate limits
/// and generic server errors back off linearly, overload exponentially.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear back-off base for 429 responses, in milliseconds
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    /// Exponential back-off base for 529 responses, in milliseconds
    #[serde(default = "default_overload_backoff_ms")]
    pub overload_backoff_ms: u64,

    /// Linear back-off base for other transient errors, in milliseconds
    #[serde(default = "default_server_error_backoff_ms")]
    pub server_error_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_rate_limit_backoff_ms() -> u64 {
    30_000
}

const fn default_overload_backoff_ms() -> u64 {
    15_000
}

const fn default_server_error_backoff_ms() -> u64 {
    5_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            overload_backoff_ms: default_overload_backoff_ms(),
            server_error_backoff_ms: default_server_error_backoff_ms(),
        }
    }
}

/// Prompt store and run output paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Directory holding prompt history and the current-best snapshot
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,

    /// Directory for run artifacts and final sermons
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_prompts_dir() -> String {
    ".predikant/prompts".to_string()
}

fn default_output_dir() -> String {
    ".predikant/output".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prompts_dir: default_prompts_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Anthropic API endpoint configuration
///
/// The API key itself is never part of the config files; it is read from
/// the `ANTHROPIC_API_KEY` environment variable at client construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiConfig {
    /// Base URL for the Messages API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Target distribution for one stylometric metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricTarget {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricTarget {
    pub const fn new(mean: f64, std: f64, min: f64, max: f64) -> Self {
        Self {
            mean,
            std,
            min,
            max,
        }
    }
}

/// Stylometric target distributions, derived from corpus analysis of the
/// reference sermons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StylometryConfig {
    /// Total character count
    #[serde(default = "default_char_count")]
    pub char_count: MetricTarget,

    /// Mean sentence length in words
    #[serde(default = "default_avg_sentence_length")]
    pub avg_sentence_length: MetricTarget,

    /// Standard deviation of sentence lengths
    #[serde(default = "default_sentence_length_std")]
    pub sentence_length_std: MetricTarget,

    /// Questions per sentence
    #[serde(default = "default_question_ratio")]
    pub question_ratio: MetricTarget,

    /// Unique words over total words
    #[serde(default = "default_lexical_diversity")]
    pub lexical_diversity: MetricTarget,

    /// Commas per sentence
    #[serde(default = "default_comma_per_sentence")]
    pub comma_per_sentence: MetricTarget,

    /// Target frequency per 1000 words for theological core vocabulary
    #[serde(default = "default_word_targets")]
    pub word_targets: BTreeMap<String, f64>,
}

const fn default_char_count() -> MetricTarget {
    MetricTarget::new(14_278.0, 3_145.0, 9_600.0, 21_500.0)
}

const fn default_avg_sentence_length() -> MetricTarget {
    MetricTarget::new(15.88, 1.83, 13.0, 21.0)
}

const fn default_sentence_length_std() -> MetricTarget {
    MetricTarget::new(10.27, 1.72, 7.0, 15.0)
}

const fn default_question_ratio() -> MetricTarget {
    MetricTarget::new(0.05, 0.04, 0.0, 0.14)
}

const fn default_lexical_diversity() -> MetricTarget {
    MetricTarget::new(0.29, 0.03, 0.22, 0.36)
}

const fn default_comma_per_sentence() -> MetricTarget {
    MetricTarget::new(0.78, 0.20, 0.37, 1.31)
}

fn default_word_targets() -> BTreeMap<String, f64> {
    [
        ("god", 9.7),
        ("jezus", 5.3),
        ("christus", 3.7),
        ("liefde", 2.7),
        ("leven", 4.8),
        ("dood", 2.5),
        ("wereld", 5.5),
        ("woord", 1.5),
    ]
    .into_iter()
    .map(|(word, freq)| (word.to_string(), freq))
    .collect()
}

impl Default for StylometryConfig {
    fn default() -> Self {
        Self {
            char_count: default_char_count(),
            avg_sentence_length: default_avg_sentence_length(),
            sentence_length_std: default_sentence_length_std(),
            question_ratio: default_question_ratio(),
            lexical_diversity: default_lexical_diversity(),
            comma_per_sentence: default_comma_per_sentence(),
            word_targets: default_word_targets(),
        }
    }
}
