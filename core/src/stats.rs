//! Per-label usage statistics.
//!
//! Folds successful predictions into running count, mean, minimum and
//! maximum confidence per label, without keeping the observations.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::inference::PredictionResult;

/// Running statistic for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningStat {
    pub label: String,
    pub count: u64,
    pub average_confidence: f32,
    pub lowest_confidence: f32,
    pub highest_confidence: f32,
}

impl RunningStat {
    /// Statistic seeded by the first observation of `label`.
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            count: 1,
            average_confidence: confidence,
            lowest_confidence: confidence,
            highest_confidence: confidence,
        }
    }

    /// Fold one more observation in.
    ///
    /// A single observation moves at most one bound: the upper bound is only
    /// checked when the value did not lower the minimum.
    pub fn observe(&mut self, confidence: f32) {
        let n = self.count as f32;
        self.average_confidence = (self.average_confidence * n + confidence) / (n + 1.0);
        if confidence < self.lowest_confidence {
            self.lowest_confidence = confidence;
        } else if confidence > self.highest_confidence {
            self.highest_confidence = confidence;
        }
        self.count += 1;
    }
}

#[derive(Debug, Default)]
struct Table {
    order: Vec<RunningStat>,
    by_label: HashMap<String, usize>,
}

/// Session-long aggregator shared by any number of callers.
///
/// Each update is a read-modify-write under one lock, so concurrent callers
/// see exactly the sequential arithmetic.
#[derive(Debug, Default)]
pub struct UsageAggregator {
    table: Mutex<Table>,
}

impl UsageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a prediction. Failed predictions are ignored and return `false`.
    pub fn record(&self, result: &PredictionResult) -> bool {
        if !result.success {
            return false;
        }
        self.observe(&result.label, result.confidence);
        true
    }

    /// Record a confidence value for `label`.
    pub fn observe(&self, label: &str, confidence: f32) {
        let mut table = self.lock();
        match table.by_label.get(label).copied() {
            Some(slot) => table.order[slot].observe(confidence),
            None => {
                let slot = table.order.len();
                table.order.push(RunningStat::new(label, confidence));
                table.by_label.insert(label.to_string(), slot);
            }
        }
    }

    /// Copy of the statistic for `label`.
    pub fn get(&self, label: &str) -> Option<RunningStat> {
        let table = self.lock();
        table.by_label.get(label).map(|&slot| table.order[slot].clone())
    }

    /// Copy of every statistic in first-observation order.
    pub fn snapshot(&self) -> Vec<RunningStat> {
        self.lock().order.clone()
    }

    /// Number of distinct labels seen.
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of recorded observations.
    pub fn total(&self) -> u64 {
        self.lock().order.iter().map(|s| s.count).sum()
    }
}

/// Render a snapshot as a plain-text report, one label per line.
pub fn render_text(stats: &[RunningStat]) -> String {
    let mut out = String::new();
    let total: u64 = stats.iter().map(|s| s.count).sum();
    let _ = writeln!(out, "Rune statistics ({} predictions)", total);
    for stat in stats {
        let _ = writeln!(
            out,
            "{}: count={} avg={:.2} min={:.2} max={:.2}",
            stat.label,
            stat.count,
            stat.average_confidence,
            stat.lowest_confidence,
            stat.highest_confidence
        );
    }
    out
}
