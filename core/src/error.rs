//! Error types for rune-infer.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rune-infer operations.
pub type Result<T> = std::result::Result<T, RuneError>;

/// Errors that can occur while classifying a feature vector.
#[derive(Debug, Error)]
pub enum RuneError {
    /// No model instance is bound to the classifier.
    #[error("Model unavailable: no model instance is loaded")]
    ModelUnavailable,

    /// Feature vector length does not match the expected element count.
    #[error("Invalid input shape: expected {expected} elements, received {actual}")]
    InvalidInputShape { expected: usize, actual: usize },

    /// The runtime rejected the concrete input shape.
    #[error("Shape negotiation failed: {0}")]
    ShapeNegotiationFailed(String),

    /// The runtime returned a non-success status while running the model.
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    /// The runtime produced no scores to decode.
    #[error("No valid output data received from the model")]
    NoOutputData,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

/// The pipeline failure kinds a single classification call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ModelUnavailable,
    InvalidInputShape,
    ShapeNegotiationFailed,
    InferenceFailed,
    NoOutputData,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ModelUnavailable => "model_unavailable",
            Self::InvalidInputShape => "invalid_input_shape",
            Self::ShapeNegotiationFailed => "shape_negotiation_failed",
            Self::InferenceFailed => "inference_failed",
            Self::NoOutputData => "no_output_data",
        };
        f.write_str(name)
    }
}

impl RuneError {
    /// Create a shape negotiation error.
    pub fn shape_negotiation(msg: impl Into<String>) -> Self {
        Self::ShapeNegotiationFailed(msg.into())
    }

    /// Create an inference error.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::InferenceFailed(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Pipeline kind of this error, if it is one of the per-call failures.
    ///
    /// Loading and configuration errors return `None`.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::ModelUnavailable => Some(ErrorKind::ModelUnavailable),
            Self::InvalidInputShape { .. } => Some(ErrorKind::InvalidInputShape),
            Self::ShapeNegotiationFailed(_) => Some(ErrorKind::ShapeNegotiationFailed),
            Self::InferenceFailed(_) => Some(ErrorKind::InferenceFailed),
            Self::NoOutputData => Some(ErrorKind::NoOutputData),
            _ => None,
        }
    }
}
