//! Parallel execution: one sequential worker thread per partition.
//!
//! - [`KeyPartitioner`]: maps a record's partition key to a worker index
//! - [`PartitionedRuntime`]: spawns workers, each owning its own pipeline
//! - [`RecordRouter`]: feeds records to the worker that owns their key

pub mod partitioner;
pub mod worker;

pub use partitioner::*;
pub use worker::*;
