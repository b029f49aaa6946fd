//! Classification pipeline.
//!
//! [`RuneClassifier`] owns the model handle and the live configuration. Each
//! call snapshots the label table and threshold, then runs the shape
//! adapter, the invoker and the score decoder. The output buffer is dropped
//! on every exit path before the call returns.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, RuneError};
use crate::inference::{
    bind, invoke, BindingRequest, ModelInstance, PredictionResult, ScoreDecoder, SymbolicShape,
};
use crate::labels::LabelMapping;
use crate::stats::UsageAggregator;

/// Immutable view of the settings one call works with.
#[derive(Debug, Clone)]
struct Settings {
    labels: Arc<LabelMapping>,
    threshold: f32,
}

/// Classifies feature vectors with a bound model instance.
///
/// # Example
///
/// ```ignore
/// use rune_infer::{Config, DenseModel, RuneClassifier};
///
/// let config = Config::from_yaml_file("runes.yaml")?;
/// let model = DenseModel::load("model.yaml")?;
/// let mut classifier = RuneClassifier::with_model(model, &config);
///
/// let result = classifier.classify(&features);
/// println!("{} ({:.2})", result.label, result.confidence);
/// ```
pub struct RuneClassifier<M = Box<dyn ModelInstance>> {
    model: Option<M>,
    settings: Settings,
    input_len: usize,
    input_shape: SymbolicShape,
    default_num_classes: usize,
}

impl<M: ModelInstance> RuneClassifier<M> {
    /// Classifier with no model bound; every call fails with `ModelUnavailable`.
    pub fn new(config: &Config) -> Self {
        Self {
            model: None,
            settings: Settings {
                labels: Arc::new(config.labels.clone()),
                threshold: config.inference.confidence_threshold,
            },
            input_len: config.model.input_len,
            input_shape: SymbolicShape::new(config.model.input_shape.clone()),
            default_num_classes: config.inference.default_num_classes,
        }
    }

    /// Classifier bound to `model`.
    pub fn with_model(model: M, config: &Config) -> Self {
        let mut classifier = Self::new(config);
        classifier.set_model(model);
        classifier
    }

    /// Bind `model`, returning the previously bound instance.
    pub fn set_model(&mut self, model: M) -> Option<M> {
        for desc in model.input_tensor_descs() {
            info!("Model input {}: shape {}", desc.name, desc.shape);
        }
        for desc in model.output_tensor_descs() {
            info!("Model output {}: shape {}", desc.name, desc.shape);
        }
        self.model.replace(model)
    }

    /// Unbind and return the model.
    pub fn take_model(&mut self) -> Option<M> {
        self.model.take()
    }

    /// Get the bound model, if any.
    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    /// Check if a model is bound.
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Replace the label table used by subsequent calls.
    pub fn set_labels(&mut self, labels: LabelMapping) {
        self.settings.labels = Arc::new(labels);
    }

    /// Get the current label table.
    pub fn labels(&self) -> Arc<LabelMapping> {
        Arc::clone(&self.settings.labels)
    }

    /// Replace the confidence threshold used by subsequent calls.
    pub fn set_confidence_threshold(&mut self, threshold: f32) -> Result<()> {
        if !threshold.is_finite() {
            return Err(RuneError::config(format!(
                "confidence threshold must be finite, got {}",
                threshold
            )));
        }
        self.settings.threshold = threshold;
        Ok(())
    }

    /// Get the current confidence threshold.
    pub fn confidence_threshold(&self) -> f32 {
        self.settings.threshold
    }

    /// Get the expected feature vector length.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Classify `features`, reporting failures as errors.
    ///
    /// `Ok` results always have `success == true`; an `Unknown` label is a
    /// valid outcome.
    pub fn try_classify(&mut self, features: &[f32]) -> Result<PredictionResult> {
        let settings = self.settings.clone();
        let model = self.model.as_mut().ok_or(RuneError::ModelUnavailable)?;

        let request = BindingRequest {
            input_len: self.input_len,
            fallback_input_shape: &self.input_shape,
            default_num_classes: self.default_num_classes,
        };
        let mut bindings = bind(model, features, &settings.labels, request)?;
        debug!(
            "Bound input {} with {:?} output classes",
            bindings.input_shape(),
            bindings.class_count()
        );

        invoke(model, &mut bindings)?;

        ScoreDecoder::new(settings.threshold, &settings.labels)
            .try_decode(Some(bindings.output().as_slice()))
    }

    /// Classify `features`; any failure yields [`PredictionResult::failed`].
    pub fn classify(&mut self, features: &[f32]) -> PredictionResult {
        match self.try_classify(features) {
            Ok(result) => {
                info!(
                    "Predicted rune: {} (index: {}, confidence: {:.2})",
                    result.label, result.index, result.confidence
                );
                result
            }
            Err(e) => {
                warn!("Classification failed: {}", e);
                PredictionResult::failed()
            }
        }
    }

    /// Classify `features` and fold the result into `stats`.
    pub fn classify_recorded(
        &mut self,
        features: &[f32],
        stats: &UsageAggregator,
    ) -> PredictionResult {
        let result = self.classify(features);
        stats.record(&result);
        result
    }
}
