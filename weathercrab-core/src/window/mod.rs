//! Tumbling window assignment.
//!
//! A record is mapped to exactly one [`WindowKey`] by a pure function of its
//! timestamp and the configured window size.

use std::time::Duration;

use crate::error::ConfigError;
use crate::types::EventTime;

mod assigner;
mod primitives;

pub use assigner::*;
pub use primitives::*;

#[cfg(test)]
#[path = "tests/window_tests.rs"]
mod tests;
