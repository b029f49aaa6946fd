//! Shape and binding adapter.
//!
//! Validates the feature vector, derives the concrete input shape, resolves
//! how many class scores the model will write, and owns the output buffer
//! for the duration of one call.

use crate::error::{Result, RuneError};
use crate::labels::LabelMapping;

use super::runtime::{InputBinding, ModelInstance, OutputBinding, SymbolicShape, TensorShape, WILDCARD_DIM};

/// Batch size substituted for the wildcard batch dimension.
pub const BATCH_SIZE: usize = 1;

/// Axis of the output shape holding the class count.
const CLASS_AXIS: usize = 1;

/// Reject feature vectors whose length differs from the expected element count.
pub fn validate_input(features: &[f32], expected: usize) -> Result<()> {
    if features.len() != expected {
        return Err(RuneError::InvalidInputShape {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

/// Replace a wildcard batch dimension with [`BATCH_SIZE`].
///
/// Only axis 0 may be dynamic; any other non-positive dimension is a
/// configuration error.
pub fn resolve_concrete_shape(shape: &SymbolicShape) -> Result<TensorShape> {
    if shape.rank() == 0 {
        return Err(RuneError::config("model declares a rank-0 input"));
    }
    let mut dims = Vec::with_capacity(shape.rank());
    for (axis, &dim) in shape.dims().iter().enumerate() {
        match dim {
            d if d > 0 => dims.push(usize::try_from(d).map_err(|_| {
                RuneError::config(format!("dimension {} on axis {} exceeds usize", d, axis))
            })?),
            WILDCARD_DIM if axis == 0 => dims.push(BATCH_SIZE),
            d => {
                return Err(RuneError::config(format!(
                    "unresolvable dimension {} on axis {} of input shape {}",
                    d, axis, shape
                )))
            }
        }
    }
    Ok(TensorShape::new(dims))
}

/// Where the class count of a call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassCount {
    /// Positive class dimension declared by the model output.
    ModelDeclared(usize),
    /// Size of the label table; the model did not declare one.
    LabelTable(usize),
    /// Configured default; neither the model nor the table provided one.
    Default(usize),
}

impl ClassCount {
    /// Get the resolved number of classes.
    pub fn get(self) -> usize {
        match self {
            Self::ModelDeclared(n) | Self::LabelTable(n) | Self::Default(n) => n,
        }
    }
}

/// Resolve the class count: model metadata, then table size, then `default`.
///
/// The label-table branch trusts configuration over schema; callers should
/// treat it as degraded metadata, not as validation.
pub fn resolve_class_count(
    output_shape: Option<&SymbolicShape>,
    labels: &LabelMapping,
    default: usize,
) -> ClassCount {
    let declared = output_shape
        .and_then(|shape| shape.dims().get(CLASS_AXIS).copied())
        .filter(|&dim| dim > 0);

    match declared {
        Some(dim) => match usize::try_from(dim) {
            Ok(n) => ClassCount::ModelDeclared(n),
            Err(_) if !labels.is_empty() => ClassCount::LabelTable(labels.len()),
            Err(_) => ClassCount::Default(default),
        },
        None if !labels.is_empty() => ClassCount::LabelTable(labels.len()),
        None => ClassCount::Default(default),
    }
}

#[cfg(test)]
thread_local! {
    static LIVE_BUFFERS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Score buffer owned by a single call; released when dropped.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Vec<f32>,
}

impl OutputBuffer {
    /// Allocate a zeroed buffer of `len` floats.
    pub fn new(len: usize) -> Self {
        #[cfg(test)]
        LIVE_BUFFERS.with(|live| live.set(live.get() + 1));
        Self {
            data: vec![0.0; len],
        }
    }

    /// Get the scores written so far.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Get the number of floats in the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the buffer size in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Number of buffers alive on the current thread.
    #[cfg(test)]
    pub(crate) fn live() -> usize {
        LIVE_BUFFERS.with(|live| live.get())
    }
}

impl Drop for OutputBuffer {
    fn drop(&mut self) {
        #[cfg(test)]
        LIVE_BUFFERS.with(|live| live.set(live.get() - 1));
    }
}

/// Input and output bindings ready for one run.
#[derive(Debug)]
pub struct Bindings<'a> {
    input: &'a [f32],
    input_shape: TensorShape,
    output: OutputBuffer,
    class_count: ClassCount,
}

impl<'a> Bindings<'a> {
    /// Get the concrete input shape.
    pub fn input_shape(&self) -> &TensorShape {
        &self.input_shape
    }

    /// Get the resolved class count and its source.
    pub fn class_count(&self) -> ClassCount {
        self.class_count
    }

    /// Get the output buffer.
    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    /// Borrow the buffers in the form the runtime expects.
    pub(crate) fn split(&mut self) -> ([InputBinding<'_>; 1], [OutputBinding<'_>; 1]) {
        (
            [InputBinding {
                data: self.input,
                shape: &self.input_shape,
            }],
            [OutputBinding {
                data: &mut self.output.data,
            }],
        )
    }
}

/// Parameters the adapter needs besides the model.
#[derive(Debug, Clone, Copy)]
pub struct BindingRequest<'a> {
    pub input_len: usize,
    pub fallback_input_shape: &'a SymbolicShape,
    pub default_num_classes: usize,
}

/// Validate `features`, fix the model's input shape, and allocate the output.
///
/// Nothing is allocated and the model is not touched when validation fails.
pub fn bind<'a, M: ModelInstance + ?Sized>(
    model: &mut M,
    features: &'a [f32],
    labels: &LabelMapping,
    request: BindingRequest<'_>,
) -> Result<Bindings<'a>> {
    validate_input(features, request.input_len)?;

    let declared = model
        .input_tensor_descs()
        .first()
        .map(|desc| desc.shape.clone())
        .unwrap_or_else(|| request.fallback_input_shape.clone());
    let input_shape = resolve_concrete_shape(&declared)?;
    let volume = input_shape.volume().ok_or_else(|| {
        RuneError::config(format!("input shape {} overflows the element count", input_shape))
    })?;
    if volume != request.input_len {
        return Err(RuneError::config(format!(
            "input shape {} holds {} elements but input_len is {}",
            input_shape, volume, request.input_len
        )));
    }

    model
        .set_input_tensor_shapes(std::slice::from_ref(&input_shape))
        .map_err(|e| match e {
            RuneError::ShapeNegotiationFailed(msg) => RuneError::ShapeNegotiationFailed(msg),
            other => RuneError::shape_negotiation(other.to_string()),
        })?;

    let class_count = resolve_class_count(
        model.output_tensor_descs().first().map(|desc| &desc.shape),
        labels,
        request.default_num_classes,
    );

    Ok(Bindings {
        input: features,
        input_shape,
        output: OutputBuffer::new(class_count.get()),
        class_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::runtime::TensorDesc;

    struct ShapeOnly {
        inputs: Vec<TensorDesc>,
        outputs: Vec<TensorDesc>,
        accept: bool,
        set_calls: usize,
    }

    impl ShapeOnly {
        fn new(input: &[i64], output: &[i64]) -> Self {
            Self {
                inputs: vec![TensorDesc::new("input", input.to_vec())],
                outputs: vec![TensorDesc::new("output", output.to_vec())],
                accept: true,
                set_calls: 0,
            }
        }
    }

    impl ModelInstance for ShapeOnly {
        fn input_tensor_descs(&self) -> &[TensorDesc] {
            &self.inputs
        }

        fn output_tensor_descs(&self) -> &[TensorDesc] {
            &self.outputs
        }

        fn set_input_tensor_shapes(&mut self, _shapes: &[TensorShape]) -> Result<()> {
            self.set_calls += 1;
            if self.accept {
                Ok(())
            } else {
                Err(RuneError::config("shape rejected"))
            }
        }

        fn run_sync(
            &mut self,
            _inputs: &[InputBinding<'_>],
            _outputs: &mut [OutputBinding<'_>],
        ) -> Result<()> {
            Ok(())
        }
    }

    fn request(fallback: &SymbolicShape) -> BindingRequest<'_> {
        BindingRequest {
            input_len: 4,
            fallback_input_shape: fallback,
            default_num_classes: 2,
        }
    }

    #[test]
    fn wildcard_batch_becomes_one() {
        let shape = SymbolicShape::new(vec![-1, 64, 64, 1]);
        let concrete = resolve_concrete_shape(&shape).unwrap();
        assert_eq!(concrete.dims(), &[1, 64, 64, 1]);
        assert_eq!(concrete.volume(), Some(4096));
    }

    #[test]
    fn wildcard_outside_batch_is_config_error() {
        let shape = SymbolicShape::new(vec![1, -1, 64, 1]);
        let err = resolve_concrete_shape(&shape).unwrap_err();
        assert!(matches!(err, RuneError::Config(_)));

        let shape = SymbolicShape::new(vec![-2, 64, 64, 1]);
        assert!(resolve_concrete_shape(&shape).is_err());
    }

    #[test]
    fn class_count_priority() {
        let labels: LabelMapping = [(0, "Fire"), (1, "Water"), (2, "Earth")]
            .into_iter()
            .collect();
        let declared = SymbolicShape::new(vec![-1, 5]);
        let dynamic = SymbolicShape::new(vec![-1, -1]);
        let flat = SymbolicShape::new(vec![7]);

        assert_eq!(
            resolve_class_count(Some(&declared), &labels, 2),
            ClassCount::ModelDeclared(5)
        );
        assert_eq!(
            resolve_class_count(Some(&dynamic), &labels, 2),
            ClassCount::LabelTable(3)
        );
        assert_eq!(
            resolve_class_count(Some(&flat), &labels, 2),
            ClassCount::LabelTable(3)
        );
        assert_eq!(
            resolve_class_count(None, &LabelMapping::default(), 2),
            ClassCount::Default(2)
        );
        assert_eq!(ClassCount::Default(2).get(), 2);
    }

    #[test]
    fn bind_rejects_wrong_length_before_touching_model() {
        let mut model = ShapeOnly::new(&[-1, 2, 2, 1], &[-1, 3]);
        let fallback = SymbolicShape::new(vec![-1, 2, 2, 1]);
        let features = [0.0_f32; 3];

        let err = bind(&mut model, &features, &LabelMapping::default(), request(&fallback))
            .unwrap_err();
        assert!(matches!(
            err,
            RuneError::InvalidInputShape {
                expected: 4,
                actual: 3
            }
        ));
        assert_eq!(model.set_calls, 0);
        assert_eq!(OutputBuffer::live(), 0);
    }

    #[test]
    fn bind_allocates_declared_classes() {
        let mut model = ShapeOnly::new(&[-1, 2, 2, 1], &[-1, 3]);
        let fallback = SymbolicShape::new(vec![-1, 2, 2, 1]);
        let features = [0.25_f32; 4];

        let bindings =
            bind(&mut model, &features, &LabelMapping::default(), request(&fallback)).unwrap();
        assert_eq!(bindings.input_shape().dims(), &[1, 2, 2, 1]);
        assert_eq!(bindings.class_count(), ClassCount::ModelDeclared(3));
        assert_eq!(bindings.output().len(), 3);
        assert_eq!(bindings.output().size_in_bytes(), 12);
        assert_eq!(OutputBuffer::live(), 1);
        drop(bindings);
        assert_eq!(OutputBuffer::live(), 0);
    }

    #[test]
    fn bind_uses_fallback_shape_when_model_declares_none() {
        let mut model = ShapeOnly::new(&[], &[]);
        model.inputs.clear();
        model.outputs.clear();
        let fallback = SymbolicShape::new(vec![-1, 2, 2, 1]);
        let features = [0.0_f32; 4];

        let bindings =
            bind(&mut model, &features, &LabelMapping::default(), request(&fallback)).unwrap();
        assert_eq!(bindings.input_shape().dims(), &[1, 2, 2, 1]);
        assert_eq!(bindings.class_count(), ClassCount::Default(2));
    }

    #[test]
    fn bind_reports_rejected_shape() {
        let mut model = ShapeOnly::new(&[-1, 2, 2, 1], &[-1, 3]);
        model.accept = false;
        let fallback = SymbolicShape::new(vec![-1, 2, 2, 1]);
        let features = [0.0_f32; 4];

        let err = bind(&mut model, &features, &LabelMapping::default(), request(&fallback))
            .unwrap_err();
        assert!(matches!(err, RuneError::ShapeNegotiationFailed(_)));
        assert_eq!(OutputBuffer::live(), 0);
    }

    #[test]
    fn bind_rejects_overflowing_shape() {
        let huge = 1_i64 << 33;
        let mut model = ShapeOnly::new(&[-1, huge, huge, huge], &[-1, 3]);
        let fallback = SymbolicShape::new(vec![-1, 2, 2, 1]);
        let features = [0.0_f32; 4];

        let err = bind(&mut model, &features, &LabelMapping::default(), request(&fallback))
            .unwrap_err();
        assert!(matches!(err, RuneError::Config(_)));
        assert_eq!(model.set_calls, 0);
        assert_eq!(OutputBuffer::live(), 0);
    }

    #[test]
    fn bind_rejects_shape_volume_mismatch() {
        let mut model = ShapeOnly::new(&[-1, 3, 3, 1], &[-1, 3]);
        let fallback = SymbolicShape::new(vec![-1, 2, 2, 1]);
        let features = [0.0_f32; 4];

        let err = bind(&mut model, &features, &LabelMapping::default(), request(&fallback))
            .unwrap_err();
        assert!(matches!(err, RuneError::Config(_)));
        assert_eq!(model.set_calls, 0);
    }
}
