//! # Pipeline
//!
//! Drives window assignment, accumulation and finalization for a stream of
//! records, and hands finalized windows to a sink.
//!
//! ```text
//! loop {
//!     record = source.next_record(poll_timeout)
//!     match record {
//!         Some(r) => late? drop : store.update() -> finalizer.sweep() -> publish
//!         None    => source closed? break
//!     }
//!     tick due? -> finalizer.observe(now) -> sweep -> publish
//! }
//! flush: close every open window -> publish
//! ```
//!
//! - [`WindowPipeline`]: the orchestrator, one per worker
//! - [`IngestionAdapter`] / [`EmissionSink`]: the seams to the outside world
//! - [`RetryPolicy`]: bounded backoff for failed publishes
//! - [`ShutdownSignal`]: cooperative stop, observed between records

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ahash::AHashMap;
use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use crate::config::AggregationConfig;
use crate::error::{ConfigError, PipelineError, PublishError};
use crate::finalizer::{Admission, FinalizedWindow, Finalizer, WindowPhase};
use crate::metrics::PipelineMetrics;
use crate::reducer::{FieldRejection, Reducer};
use crate::state::AccumulatorStore;
use crate::time::Clock;
use crate::types::{EventTime, PartitionKey, Record};
use crate::window::{TumblingWindows, WindowKey};

mod aggregator;
mod orchestrator;
mod retry;
mod shutdown;
mod sink;
mod source;

pub use aggregator::*;
pub use orchestrator::*;
pub use retry::*;
pub use shutdown::*;
pub use sink::*;
pub use source::*;

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
