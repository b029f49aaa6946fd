//! Single synchronous model invocation.

use crate::error::{Result, RuneError};

use super::runtime::ModelInstance;
use super::shape::Bindings;

/// Run `model` exactly once against `bindings`.
///
/// Any runtime failure becomes [`RuneError::InferenceFailed`]; the output
/// buffer must then be treated as holding no scores. There are no retries.
pub fn invoke<M: ModelInstance + ?Sized>(model: &mut M, bindings: &mut Bindings<'_>) -> Result<()> {
    let (inputs, mut outputs) = bindings.split();
    model
        .run_sync(&inputs, &mut outputs)
        .map_err(|e| match e {
            RuneError::InferenceFailed(msg) => RuneError::InferenceFailed(msg),
            other => RuneError::inference(other.to_string()),
        })
}
