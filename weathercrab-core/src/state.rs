//! # State Management
//!
//! Per-window accumulator state for one ordered record stream.
//!
//! Each worker owns exactly one [`AccumulatorStore`]; it is created when the
//! worker starts and dropped when the worker stops. Nothing is shared between
//! workers, and `&mut` access serializes updates to the same window.

use ahash::AHashMap;

use crate::reducer::{FieldRejection, Reducer, WindowResult};
use crate::types::Record;
use crate::window::WindowKey;

pub mod accumulator;

pub use accumulator::AccumulatorStore;
