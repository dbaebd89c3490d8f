use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Solid rows consumed by the practice stage before measurement.
    pub practice_solid_trials: usize,
    /// Dashed rows consumed by the practice stage before measurement.
    pub practice_dashed_trials: usize,
    /// Inclusive bounds of the random wait before the arrow appears.
    pub arrow_delay_range_ms: (u64, u64),
    /// Arrow visible, dashes still: the gap before motion starts.
    pub arrow_lead_ms: u64,
    pub observation_window_ms: u64,
    /// Pause after a prompt or stimulus before input is accepted.
    pub prompt_settle_ms: u64,
    pub solid_lead_ms: u64,
    pub dashed_lead_ms: u64,
    pub trials_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            practice_solid_trials: 1,
            practice_dashed_trials: 21,
            arrow_delay_range_ms: (6000, 10000),
            arrow_lead_ms: 500,
            observation_window_ms: 2000,
            prompt_settle_ms: 300,
            solid_lead_ms: 500,
            dashed_lead_ms: 300,
            trials_dir: PathBuf::from("Trials"),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExperimentConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (lo, hi) = self.arrow_delay_range_ms;
        if lo > hi {
            return Err(ConfigError::Invalid {
                field: "arrow_delay_range_ms",
                reason: format!("lower bound {} exceeds upper bound {}", lo, hi),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ExperimentConfig::from_toml_str("").unwrap();
        assert_eq!(config, ExperimentConfig::default());
        assert_eq!(config.practice_dashed_trials, 21);
        assert_eq!(config.arrow_delay_range_ms, (6000, 10000));
    }

    #[test]
    fn partial_override() {
        let config = ExperimentConfig::from_toml_str(
            r#"
            practice_dashed_trials = 2
            arrow_delay_range_ms = [100, 200]
            output_dir = "out"
            "#,
        )
        .unwrap();
        assert_eq!(config.practice_dashed_trials, 2);
        assert_eq!(config.practice_solid_trials, 1);
        assert_eq!(config.arrow_delay_range_ms, (100, 200));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn inverted_delay_range_is_rejected() {
        let err = ExperimentConfig::from_toml_str("arrow_delay_range_ms = [10, 5]").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "arrow_delay_range_ms",
                ..
            }
        ));
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = ExperimentConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
