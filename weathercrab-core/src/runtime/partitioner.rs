//! # Partitioner
//!
//! Routes records between parallel workers.

use std::hash::{Hash, Hasher};

use ahash::AHasher;

use crate::types::Record;

/// Hash-based partitioner over [`Record::key`].
///
/// Uses ahash with fixed keys, so a key maps to the same worker for the
/// lifetime of the process and every record of a key-stream is handled by
/// one worker, in arrival order. Records without a key all share one worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyPartitioner;

impl KeyPartitioner {
    pub fn new() -> Self {
        Self
    }

    /// Determine which partition (0..num_partitions) `key` belongs to.
    pub fn partition_key(&self, key: Option<&str>, num_partitions: usize) -> usize {
        debug_assert!(num_partitions > 0);
        let mut hasher = AHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % num_partitions
    }

    pub fn partition(&self, record: &Record, num_partitions: usize) -> usize {
        self.partition_key(record.key.as_deref(), num_partitions)
    }
}

#[cfg(test)]
#[path = "tests/partitioner_tests.rs"]
mod tests;
