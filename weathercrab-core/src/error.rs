//! Error taxonomy for the aggregation engine.
//!
//! Malformed fields and late records are absorbed inside the pipeline (logged
//! and counted), so only the fatal classes are represented here.

use std::time::Duration;

use crate::window::WindowKey;

/// Invalid configuration. Raised at startup, before any record is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("window duration must be at least 1ms, got {0:?}")]
    NonPositiveWindow(Duration),

    #[error("window duration {0:?} does not fit in a millisecond timestamp")]
    WindowTooLarge(Duration),

    #[error("grace period {0:?} does not fit in a millisecond timestamp")]
    GraceTooLarge(Duration),

    #[error("unknown reducer kind '{0}', expected one of: mean, ohlc")]
    UnknownReducer(String),

    #[error("at least one field name is required")]
    NoFields,

    #[error("field name '{0}' is listed more than once")]
    DuplicateField(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// A single failed publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("sink is disconnected")]
    Disconnected,

    #[error("sink rejected the window: {0}")]
    Rejected(String),
}

/// Fatal pipeline failure surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("publishing window {window} failed after {attempts} attempts: {source}")]
    Sink {
        window: WindowKey,
        attempts: u32,
        #[source]
        source: PublishError,
    },

    #[error("pipeline aborted, open windows were discarded")]
    Aborted,

    #[error("ingestion failed: {0}")]
    Ingestion(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl PipelineError {
    pub fn ingestion(err: anyhow::Error) -> Self {
        PipelineError::Ingestion(err.into())
    }
}
