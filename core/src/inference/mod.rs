//! Model inference module.
//!
//! The runtime contract lives in `runtime`; a call flows through the shape
//! adapter, the invoker and the score decoder in that order.

mod decoder;
mod dense;
mod invoker;
mod runtime;
mod shape;

pub use decoder::{argmax, PredictionResult, ScoreDecoder, UNRESOLVED_INDEX};
pub use dense::{Activation, DenseModel};
pub use invoker::invoke;
pub use runtime::{
    InputBinding, ModelInstance, OutputBinding, SymbolicShape, TensorDesc, TensorShape,
    WILDCARD_DIM,
};
pub use shape::{
    bind, resolve_class_count, resolve_concrete_shape, validate_input, BindingRequest, Bindings,
    ClassCount, OutputBuffer, BATCH_SIZE,
};

#[cfg(test)]
pub(crate) fn live_output_buffers() -> usize {
    OutputBuffer::live()
}
