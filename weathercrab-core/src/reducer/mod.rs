//! # Reducers
//!
//! Incremental aggregation strategies applied to the records of one window.
//!
//! Every reducer implements the same three-step contract:
//!
//! - [`Reducer::initial`]: fresh state for a newly opened window
//! - [`Reducer::update`]: fold one record into the state, field by field
//! - [`Reducer::finalize`]: turn the state into the emitted [`WindowResult`]
//!
//! The pipeline is generic over [`Reducer`], so adding a reducer never touches
//! the finalizer or the orchestrator.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{FieldValue, Record};

mod mean;
mod ohlc;

pub use mean::*;
pub use ohlc::*;

/// Incremental, per-window aggregation function.
pub trait Reducer: Send {
    /// Per-window accumulator.
    type State: Send;

    /// Create the state for a window that has just received its first record.
    fn initial(&self) -> Self::State;

    /// Fold `record` into `state`.
    ///
    /// A field that is missing or not a finite number is left untouched and
    /// reported through `rejected`; the remaining fields still update.
    fn update(&self, state: &mut Self::State, record: &Record, rejected: &mut Vec<FieldRejection>);

    /// Compute the window result. Does not consume the state: the caller evicts
    /// it only once the result has been published.
    fn finalize(&self, state: &Self::State) -> WindowResult;
}

/// Which reducer a pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducerKind {
    Mean,
    Ohlc,
}

impl FromStr for ReducerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "average" => Ok(ReducerKind::Mean),
            "ohlc" => Ok(ReducerKind::Ohlc),
            other => Err(ConfigError::UnknownReducer(other.to_string())),
        }
    }
}

impl std::fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReducerKind::Mean => f.write_str("mean"),
            ReducerKind::Ohlc => f.write_str("ohlc"),
        }
    }
}

/// Why a field of a record was not applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    Missing,
    NotNumeric(FieldValue),
}

/// A field skipped by [`Reducer::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRejection {
    pub field: String,
    pub reason: RejectReason,
}

impl std::fmt::Display for FieldRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            RejectReason::Missing => write!(f, "field '{}' is missing", self.field),
            RejectReason::NotNumeric(value) => {
                write!(f, "field '{}' is not a finite number: {:?}", self.field, value)
            }
        }
    }
}

/// Open/high/low/close summary of one field over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// The finalized value of a window, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reducer", content = "fields", rename_all = "lowercase")]
pub enum WindowResult {
    Mean(BTreeMap<String, f64>),
    Ohlc(BTreeMap<String, Ohlc>),
}

impl WindowResult {
    /// Number of fields that produced a value in this window.
    pub fn len(&self) -> usize {
        match self {
            WindowResult::Mean(fields) => fields.len(),
            WindowResult::Ohlc(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read `name` from `record` as a finite number, or describe why it can't be used.
pub(crate) fn numeric_field(record: &Record, name: &str) -> Result<f64, FieldRejection> {
    match record.field(name) {
        None => Err(FieldRejection {
            field: name.to_string(),
            reason: RejectReason::Missing,
        }),
        Some(value) => value.as_finite().ok_or_else(|| FieldRejection {
            field: name.to_string(),
            reason: RejectReason::NotNumeric(value.clone()),
        }),
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
