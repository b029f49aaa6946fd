//! Contract between the classifier and the model runtime.
//!
//! The runtime is an opaque synchronous compute service. It declares the
//! symbolic shapes of its tensors, accepts a concrete input shape, and runs
//! once per call against caller-owned buffers.

use std::fmt;

use crate::error::Result;

/// Dimension value marking a dynamic (wildcard) axis.
pub const WILDCARD_DIM: i64 = -1;

/// A tensor shape as declared by the model, possibly containing wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicShape(Vec<i64>);

impl SymbolicShape {
    /// Create a symbolic shape from its dimensions.
    pub fn new(dims: impl Into<Vec<i64>>) -> Self {
        Self(dims.into())
    }

    /// Get the declared dimensions.
    pub fn dims(&self) -> &[i64] {
        &self.0
    }

    /// Get the number of dimensions.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// True when every dimension is positive.
    pub fn is_concrete(&self) -> bool {
        self.0.iter().all(|&d| d > 0)
    }
}

impl fmt::Display for SymbolicShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "[{}]", dims.join(", "))
    }
}

/// A fully resolved tensor shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape(Vec<usize>);

impl TensorShape {
    /// Create a concrete shape from its dimensions.
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    /// Get the dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Total number of elements, or `None` if it overflows `usize`.
    pub fn volume(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "[{}]", dims.join(", "))
    }
}

/// Name and declared shape of one model tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDesc {
    pub name: String,
    pub shape: SymbolicShape,
}

impl TensorDesc {
    /// Create a descriptor named `name` with the given declared dimensions.
    pub fn new(name: impl Into<String>, dims: impl Into<Vec<i64>>) -> Self {
        Self {
            name: name.into(),
            shape: SymbolicShape::new(dims),
        }
    }
}

/// Read-only input tensor handed to the runtime.
#[derive(Debug)]
pub struct InputBinding<'a> {
    pub data: &'a [f32],
    pub shape: &'a TensorShape,
}

/// Writable output tensor the runtime fills with scores.
#[derive(Debug)]
pub struct OutputBinding<'a> {
    pub data: &'a mut [f32],
}

/// A model instance that can be run synchronously.
///
/// Errors returned here are reported to callers as shape negotiation or
/// inference failures; implementations only need to describe what went wrong.
pub trait ModelInstance {
    /// Declared input tensors.
    fn input_tensor_descs(&self) -> &[TensorDesc];

    /// Declared output tensors.
    fn output_tensor_descs(&self) -> &[TensorDesc];

    /// Fix the concrete shapes of the inputs for subsequent runs.
    fn set_input_tensor_shapes(&mut self, shapes: &[TensorShape]) -> Result<()>;

    /// Run the model once, writing results into `outputs`.
    fn run_sync(&mut self, inputs: &[InputBinding<'_>], outputs: &mut [OutputBinding<'_>])
        -> Result<()>;
}

impl<M: ModelInstance + ?Sized> ModelInstance for Box<M> {
    fn input_tensor_descs(&self) -> &[TensorDesc] {
        (**self).input_tensor_descs()
    }

    fn output_tensor_descs(&self) -> &[TensorDesc] {
        (**self).output_tensor_descs()
    }

    fn set_input_tensor_shapes(&mut self, shapes: &[TensorShape]) -> Result<()> {
        (**self).set_input_tensor_shapes(shapes)
    }

    fn run_sync(
        &mut self,
        inputs: &[InputBinding<'_>],
        outputs: &mut [OutputBinding<'_>],
    ) -> Result<()> {
        (**self).run_sync(inputs, outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_display_and_volume() {
        let symbolic = SymbolicShape::new(vec![WILDCARD_DIM, 64, 64, 1]);
        assert_eq!(symbolic.to_string(), "[-1, 64, 64, 1]");
        assert!(!symbolic.is_concrete());
        assert_eq!(symbolic.rank(), 4);

        let concrete = TensorShape::new(vec![1, 64, 64, 1]);
        assert_eq!(concrete.volume(), Some(4096));
        assert_eq!(concrete.to_string(), "[1, 64, 64, 1]");
    }

    #[test]
    fn volume_overflow_is_none() {
        let huge = TensorShape::new(vec![1, 1 << 33, 1 << 33, 1 << 33]);
        assert_eq!(huge.volume(), None);
    }
}
