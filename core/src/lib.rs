//! rune-infer: classify hand-drawn runes with a pre-trained model.
//!
//! A feature vector (a flattened 64x64 grayscale canvas by default) is
//! validated, bound to a model instance, run once, and decoded into a
//! [`PredictionResult`]: the argmax class, gated by a confidence threshold
//! towards the table's `Unknown` entry, resolved to a name through a
//! [`LabelMapping`]. A [`UsageAggregator`] keeps running per-label statistics.
//!
//! The model runtime is anything implementing [`ModelInstance`]. A dense
//! reference runtime, [`DenseModel`], is included.
//!
//! # Example
//!
//! ```ignore
//! use rune_infer::{Config, DenseModel, RuneClassifier, UsageAggregator};
//!
//! let config = Config::from_yaml_file("runes.yaml")?;
//! let model = DenseModel::load("model.yaml")?;
//! let mut classifier = RuneClassifier::with_model(model, &config);
//! let stats = UsageAggregator::new();
//!
//! let features = rune_infer::features::load("rune.png", config.model.input_len)?;
//! let result = classifier.classify_recorded(&features, &stats);
//! println!("{} ({:.2})", result.label, result.confidence);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod labels;
pub mod pipeline;
pub mod stats;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorKind, Result, RuneError};
pub use inference::{DenseModel, ModelInstance, PredictionResult};
pub use labels::{LabelMapping, LabelMappingEntry, UNKNOWN_LABEL};
pub use pipeline::RuneClassifier;
pub use stats::{RunningStat, UsageAggregator};
