//! Score decoding.
//!
//! Turns the raw per-class scores of one run into a [`PredictionResult`]:
//! argmax, confidence gating towards the `Unknown` entry, then label lookup.

use serde::Serialize;

use crate::error::{Result, RuneError};
use crate::labels::{LabelMapping, UNKNOWN_LABEL};

/// Index reported when no class could be resolved.
pub const UNRESOLVED_INDEX: i32 = -1;

/// Outcome of one classification call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Rune name, or `Unknown`.
    pub label: String,
    /// Class index, or [`UNRESOLVED_INDEX`].
    pub index: i32,
    /// Winning score; `0.0` when the prediction was gated or failed.
    pub confidence: f32,
    /// Whether scores were available to decode.
    pub success: bool,
}

impl PredictionResult {
    /// The result of a call that produced no usable scores.
    pub fn failed() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            index: UNRESOLVED_INDEX,
            confidence: 0.0,
            success: false,
        }
    }
}

impl Default for PredictionResult {
    fn default() -> Self {
        Self::failed()
    }
}

/// Index and value of the greatest score, lowest index on ties.
///
/// NaN never wins, so an all-NaN slice yields `None`.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    let mut best_score = f32::NEG_INFINITY;
    for (i, &score) in scores.iter().enumerate() {
        if score > best_score {
            best_score = score;
            best = Some((i, score));
        }
    }
    best
}

/// Class index as reported in results; indices past `i32::MAX` are unresolved.
fn class_index(i: usize) -> i32 {
    i32::try_from(i).unwrap_or(UNRESOLVED_INDEX)
}

/// Applies argmax, threshold gating and label lookup.
#[derive(Debug, Clone)]
pub struct ScoreDecoder<'a> {
    threshold: f32,
    labels: &'a LabelMapping,
}

impl<'a> ScoreDecoder<'a> {
    /// Create a decoder gating at `threshold` and naming classes from `labels`.
    pub fn new(threshold: f32, labels: &'a LabelMapping) -> Self {
        Self { threshold, labels }
    }

    /// Decode `scores`, failing with [`RuneError::NoOutputData`] when absent or empty.
    pub fn try_decode(&self, scores: Option<&[f32]>) -> Result<PredictionResult> {
        let scores = match scores {
            Some(s) if !s.is_empty() => s,
            _ => return Err(RuneError::NoOutputData),
        };

        let (mut index, mut confidence) = match argmax(scores) {
            Some((i, score)) => (class_index(i), score),
            None => (UNRESOLVED_INDEX, f32::NEG_INFINITY),
        };

        if confidence < self.threshold {
            index = self.labels.unknown_index().unwrap_or(UNRESOLVED_INDEX);
            confidence = 0.0;
        }

        let label = self.labels.lookup(index).unwrap_or(UNKNOWN_LABEL).to_string();

        Ok(PredictionResult {
            label,
            index,
            confidence,
            success: true,
        })
    }

    /// Decode `scores`; missing output becomes [`PredictionResult::failed`].
    pub fn decode(&self, scores: Option<&[f32]>) -> PredictionResult {
        self.try_decode(scores)
            .unwrap_or_else(|_| PredictionResult::failed())
    }
}
