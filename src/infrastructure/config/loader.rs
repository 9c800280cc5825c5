use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid temperature: {0}. Must be between 0.0 and 1.0")]
    InvalidTemperature(f64),

    #[error("Invalid target_score: {0}. Must be between 0.0 and 1.0")]
    InvalidTargetScore(f64),

    #[error("Invalid selection_probability: {0}. Must be between 0.0 and 1.0")]
    InvalidSelectionProbability(f64),

    #[error("Invalid discipline_floor: {0}. Must be between 0.0 and 1.0")]
    InvalidDisciplineFloor(f64),

    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error("Invalid fragment_length: {0}. Must be at least 1")]
    InvalidFragmentLength(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Prompts directory cannot be empty")]
    EmptyPromptsDir,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .predikant/config.yaml (project config)
    /// 3. .predikant/local.yaml (local overrides, optional)
    /// 4. Environment variables (`PREDIKANT_*` prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".predikant/config.yaml"))
            .merge(Yaml::file(".predikant/local.yaml"))
            .merge(Env::prefixed("PREDIKANT_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        for temperature in [config.generator.temperature, config.judge.temperature] {
            if !(0.0..=1.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(temperature));
            }
        }

        let iteration = &config.iteration;
        if !(0.0..=1.0).contains(&iteration.target_score) {
            return Err(ConfigError::InvalidTargetScore(iteration.target_score));
        }
        if !(0.0..=1.0).contains(&iteration.selection_probability) {
            return Err(ConfigError::InvalidSelectionProbability(
                iteration.selection_probability,
            ));
        }
        if !(0.0..=1.0).contains(&iteration.discipline_floor) {
            return Err(ConfigError::InvalidDisciplineFloor(
                iteration.discipline_floor,
            ));
        }
        if iteration.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(iteration.max_iterations));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.examples.fragment_length == 0 {
            return Err(ConfigError::InvalidFragmentLength(
                config.examples.fragment_length,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.store.prompts_dir.is_empty() {
            return Err(ConfigError::EmptyPromptsDir);
        }

        for (metric, target) in [
            ("char_count", &config.stylometry.char_count),
            ("avg_sentence_length", &config.stylometry.avg_sentence_length),
            ("sentence_length_std", &config.stylometry.sentence_length_std),
            ("question_ratio", &config.stylometry.question_ratio),
            ("lexical_diversity", &config.stylometry.lexical_diversity),
            ("comma_per_sentence", &config.stylometry.comma_per_sentence),
        ] {
            if target.std < 0.0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "stylometry target '{metric}' has negative std {}",
                    target.std
                )));
            }
            if target.min > target.max {
                return Err(ConfigError::ValidationFailed(format!(
                    "stylometry target '{metric}' has min {} above max {}",
                    target.min, target.max
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        ConfigLoader::validate(&config).expect("default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
models:
  generator: claude-opus-4-5
  judge: claude-sonnet-4-5
iteration:
  max_iterations: 8
  target_score: 0.9
examples:
  count: 3
  fragment_length: 6000
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.iteration.max_iterations, 8);
        assert!((config.iteration.target_score - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.examples.count, 3);
        assert_eq!(config.examples.fragment_length, 6000);
        // Sections absent from the file keep their defaults
        assert_eq!(config.retry.max_retries, 5);

        ConfigLoader::validate(&config).expect("parsed config should be valid");
    }

    #[test]
    fn test_validate_temperature_out_of_range() {
        let mut config = Config::default();
        config.generator.temperature = 1.5;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidTemperature(_)
        ));
    }

    #[test]
    fn test_validate_target_score_out_of_range() {
        let mut config = Config::default();
        config.iteration.target_score = 1.2;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidTargetScore(_)
        ));
    }

    #[test]
    fn test_validate_zero_iterations() {
        let mut config = Config::default();
        config.iteration.max_iterations = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxIterations(0)
        ));
    }

    #[test]
    fn test_validate_zero_retries() {
        let mut config = Config::default();
        config.retry.max_retries = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxRetries(0)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        let result = ConfigLoader::validate(&config);
        match result.unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_negative_std() {
        let mut config = Config::default();
        config.stylometry.question_ratio.std = -0.1;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationFailed(_)
        ));
    }

    #[test]
    fn test_validate_empty_prompts_dir() {
        let mut config = Config::default();
        config.store.prompts_dir = String::new();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::EmptyPromptsDir));
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "iteration:\n  max_iterations: 3\n  target_score: 0.7"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "iteration:\n  max_iterations: 9").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.iteration.max_iterations, 9, "override should win");
        assert!(
            (config.iteration.target_score - 0.7).abs() < f64::EPSILON,
            "base value should persist when not overridden"
        );
    }
}
