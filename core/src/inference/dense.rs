//! Dense reference runtime.
//!
//! A single fully connected layer with an optional softmax, evaluated with
//! `ndarray`. It implements [`ModelInstance`] so the classifier and the CLI can
//! run end to end without an external engine. The YAML description is a plain
//! weight listing:
//!
//! ```yaml
//! input_shape: [-1, 2, 2, 1]
//! activation: softmax
//! weights:
//!   - [1.0, 0.0, 0.0, 0.0]
//!   - [0.0, 1.0, 0.0, 0.0]
//! bias: [0.0, 0.0]
//! ```

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::{Result, RuneError};

use super::runtime::{InputBinding, ModelInstance, OutputBinding, TensorDesc, TensorShape};

/// Output non-linearity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Raw logits.
    Identity,
    /// Normalized class probabilities.
    #[default]
    Softmax,
}

#[derive(Debug, Deserialize)]
struct DenseDescription {
    input_shape: Vec<i64>,
    weights: Vec<Vec<f32>>,
    #[serde(default)]
    bias: Vec<f32>,
    #[serde(default)]
    activation: Activation,
}

/// Fully connected classifier: `scores = activation(W · x + b)`.
#[derive(Debug, Clone)]
pub struct DenseModel {
    inputs: Vec<TensorDesc>,
    outputs: Vec<TensorDesc>,
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
    bound_shape: Option<TensorShape>,
}

impl DenseModel {
    /// Build a model from a `(classes, features)` weight matrix.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the bias length or the declared
    /// input shape disagree with the weight matrix.
    pub fn new(
        input_shape: Vec<i64>,
        weights: Array2<f32>,
        bias: Array1<f32>,
        activation: Activation,
    ) -> Result<Self> {
        let (classes, features) = weights.dim();
        if classes == 0 || features == 0 {
            return Err(RuneError::config("dense model has an empty weight matrix"));
        }
        if bias.len() != classes {
            return Err(RuneError::config(format!(
                "bias has {} entries for {} classes",
                bias.len(),
                classes
            )));
        }
        let per_sample = input_shape
            .iter()
            .filter(|&&d| d > 0)
            .try_fold(1usize, |acc, &d| acc.checked_mul(usize::try_from(d).ok()?));
        if input_shape.is_empty() || per_sample != Some(features) {
            return Err(RuneError::config(format!(
                "input shape {:?} does not match {} weight columns",
                input_shape, features
            )));
        }

        Ok(Self {
            inputs: vec![TensorDesc::new("input", input_shape)],
            outputs: vec![TensorDesc::new("scores", vec![-1, classes as i64])],
            weights,
            bias,
            activation,
            bound_shape: None,
        })
    }

    /// Load a model description from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RuneError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let model = Self::from_yaml_str(&content)?;
        info!(
            "Loaded dense model {} ({} classes, {} features)",
            path.display(),
            model.num_classes(),
            model.num_features()
        );
        Ok(model)
    }

    /// Parse a model description from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let desc: DenseDescription = serde_yaml::from_str(yaml)?;
        let classes = desc.weights.len();
        let features = desc.weights.first().map_or(0, Vec::len);
        if desc.weights.iter().any(|row| row.len() != features) {
            return Err(RuneError::config("weight rows have different lengths"));
        }

        let flat: Vec<f32> = desc.weights.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((classes, features), flat)
            .map_err(|e| RuneError::config(format!("weight matrix: {}", e)))?;
        let bias = if desc.bias.is_empty() {
            Array1::zeros(classes)
        } else {
            Array1::from(desc.bias)
        };

        Self::new(desc.input_shape, weights, bias, desc.activation)
    }

    /// Get the number of output classes.
    pub fn num_classes(&self) -> usize {
        self.weights.nrows()
    }

    /// Get the number of input features per sample.
    pub fn num_features(&self) -> usize {
        self.weights.ncols()
    }

    fn forward(&self, x: ArrayView1<'_, f32>) -> Array1<f32> {
        let logits = self.weights.dot(&x) + &self.bias;
        match self.activation {
            Activation::Identity => logits,
            Activation::Softmax => softmax(logits),
        }
    }
}

fn softmax(logits: Array1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let exp = logits.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

impl ModelInstance for DenseModel {
    fn input_tensor_descs(&self) -> &[TensorDesc] {
        &self.inputs
    }

    fn output_tensor_descs(&self) -> &[TensorDesc] {
        &self.outputs
    }

    fn set_input_tensor_shapes(&mut self, shapes: &[TensorShape]) -> Result<()> {
        let [shape] = shapes else {
            return Err(RuneError::shape_negotiation(format!(
                "expected 1 input shape, got {}",
                shapes.len()
            )));
        };
        let batch = shape.dims().first().copied().unwrap_or(0);
        if batch != 1 || shape.volume() != Some(self.num_features()) {
            return Err(RuneError::shape_negotiation(format!(
                "shape {} is not a single sample of {} features",
                shape,
                self.num_features()
            )));
        }
        self.bound_shape = Some(shape.clone());
        Ok(())
    }

    fn run_sync(
        &mut self,
        inputs: &[InputBinding<'_>],
        outputs: &mut [OutputBinding<'_>],
    ) -> Result<()> {
        let bound = self
            .bound_shape
            .as_ref()
            .ok_or_else(|| RuneError::inference("input shape was not set"))?;
        let [input] = inputs else {
            return Err(RuneError::inference("expected exactly 1 input binding"));
        };
        let [output] = outputs else {
            return Err(RuneError::inference("expected exactly 1 output binding"));
        };
        if input.shape != bound || input.data.len() != self.num_features() {
            return Err(RuneError::inference(format!(
                "input binding {} does not match bound shape {}",
                input.shape, bound
            )));
        }
        if output.data.len() != self.num_classes() {
            return Err(RuneError::inference(format!(
                "output binding holds {} floats, model writes {}",
                output.data.len(),
                self.num_classes()
            )));
        }

        let scores = self.forward(ArrayView1::from(input.data));
        for (dst, src) in output.data.iter_mut().zip(scores.iter()) {
            *dst = *src;
        }
        Ok(())
    }
}
