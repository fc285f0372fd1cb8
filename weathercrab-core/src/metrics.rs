//! Per-worker counters.

use serde::Serialize;

/// Counters kept by one pipeline. Workers report theirs on shutdown and the
/// runtime sums them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetrics {
    pub records_processed: u64,
    pub late_records: u64,
    pub malformed_fields: u64,
    pub windows_opened: u64,
    pub windows_emitted: u64,
    pub publish_retries: u64,
    pub ticks: u64,
}

impl PipelineMetrics {
    /// Add another worker's counters into this one.
    pub fn merge(&mut self, other: &PipelineMetrics) {
        self.records_processed += other.records_processed;
        self.late_records += other.late_records;
        self.malformed_fields += other.malformed_fields;
        self.windows_opened += other.windows_opened;
        self.windows_emitted += other.windows_emitted;
        self.publish_retries += other.publish_retries;
        self.ticks += other.ticks;
    }
}

impl std::fmt::Display for PipelineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "records={} late={} malformed_fields={} opened={} emitted={} retries={}",
            self.records_processed,
            self.late_records,
            self.malformed_fields,
            self.windows_opened,
            self.windows_emitted,
            self.publish_retries
        )
    }
}
