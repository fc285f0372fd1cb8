//! Time tracking for window finalization.
//!
//! - [`LogicalClock`]: monotonic clock advanced by record timestamps and ticks
//! - [`CloseSchedule`]: open windows ordered by the clock value that closes them
//! - [`Clock`]: source of processing time for periodic ticks

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::EventTime;
use crate::window::WindowKey;

mod clock;
mod close_schedule;

pub use clock::*;
pub use close_schedule::*;

#[cfg(test)]
#[path = "tests/time_tests.rs"]
mod tests;
