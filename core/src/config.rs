//! Configuration types for rune-infer.

use serde::Deserialize;

use crate::error::{Result, RuneError};
use crate::labels::LabelMapping;

/// Top-level configuration.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    /// Model configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// Inference configuration.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Ordered index to rune-name table.
    #[serde(default)]
    pub labels: LabelMapping,
}

/// Model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to a dense model description.
    #[serde(default)]
    pub path: Option<String>,

    /// Input shape used when the model declares none. `-1` marks the batch axis.
    #[serde(default = "default_input_shape")]
    pub input_shape: Vec<i64>,

    /// Number of elements every feature vector must have.
    #[serde(default = "default_input_len")]
    pub input_len: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            input_shape: default_input_shape(),
            input_len: default_input_len(),
        }
    }
}

/// Inference configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Scores below this value are relabelled as `Unknown`.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Class count used when neither the model nor the label table provide one.
    #[serde(default = "default_num_classes")]
    pub default_num_classes: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            default_num_classes: default_num_classes(),
        }
    }
}

fn default_input_shape() -> Vec<i64> {
    vec![-1, 64, 64, 1]
}

fn default_input_len() -> usize {
    4096
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_num_classes() -> usize {
    2
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RuneError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !self.inference.confidence_threshold.is_finite() {
            return Err(RuneError::config(format!(
                "confidence_threshold must be finite, got {}",
                self.inference.confidence_threshold
            )));
        }
        if self.inference.default_num_classes == 0 {
            return Err(RuneError::config("default_num_classes must be positive"));
        }
        if self.model.input_len == 0 {
            return Err(RuneError::config("input_len must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_drawing_canvas() {
        let config = Config::default();
        assert_eq!(config.model.input_len, 4096);
        assert_eq!(config.model.input_shape, vec![-1, 64, 64, 1]);
        assert_eq!(config.inference.confidence_threshold, 0.5);
        assert_eq!(config.inference.default_num_classes, 2);
        assert!(config.labels.is_empty());
    }

    #[test]
    fn parses_partial_yaml() {
        let yaml = r#"
inference:
  confidence_threshold: 0.7
labels:
  - { index: 0, name: Fire }
  - { index: 1, name: Water }
  - { index: 2, name: Unknown }
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.inference.confidence_threshold, 0.7);
        assert_eq!(config.inference.default_num_classes, 2);
        assert_eq!(config.model.input_len, 4096);
        assert_eq!(config.labels.len(), 3);
        assert_eq!(config.labels.unknown_index(), Some(2));
    }

    #[test]
    fn rejects_zero_input_len() {
        let err = Config::from_yaml_str("model:\n  input_len: 0\n").unwrap_err();
        assert!(matches!(err, RuneError::Config(_)));
    }

    #[test]
    fn rejects_non_finite_threshold() {
        let err =
            Config::from_yaml_str("inference:\n  confidence_threshold: .nan\n").unwrap_err();
        assert!(matches!(err, RuneError::Config(_)));
    }
}
