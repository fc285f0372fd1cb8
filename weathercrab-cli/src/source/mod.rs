//! Line-oriented record sources.
//!
//! A [`LineSource`] reads one line at a time and hands it to a [`LineParser`];
//! lines the parser does not recognise are skipped. The source then applies
//! the timestamp mode and the partition key before yielding the record.

use std::io::BufRead;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use weathercrab_core::pipeline::IngestionAdapter;
use weathercrab_core::time::Clock;
use weathercrab_core::types::{EventTime, PartitionKey, Record};

mod csv;
mod open_meteo;

pub use csv::CsvParser;
pub use open_meteo::OpenMeteoParser;

/// Where a record's event time comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimestampMode {
    /// The time written in the input, read as UTC.
    Embedded,
    /// Wall-clock time when the line is read.
    Arrival,
}

/// Turns one input line into a record.
pub trait LineParser: Send {
    /// `None` means the line is not a reading (a header, a blank or corrupt
    /// line) and is skipped.
    fn parse(&self, line: &str) -> Option<Record>;

    /// Short name for log messages.
    fn name(&self) -> &'static str;
}

/// Adapts any buffered reader to an [`IngestionAdapter`].
pub struct LineSource<P> {
    reader: Box<dyn BufRead + Send>,
    parser: P,
    timestamps: TimestampMode,
    clock: Box<dyn Clock>,
    key: Option<PartitionKey>,
    replay_interval: Option<Duration>,
    last_emit: Option<Instant>,
    line_no: u64,
    skipped: u64,
    closed: bool,
    buf: String,
}

impl<P: LineParser> LineSource<P> {
    pub fn new(
        reader: Box<dyn BufRead + Send>,
        parser: P,
        timestamps: TimestampMode,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            reader,
            parser,
            timestamps,
            clock,
            key: None,
            replay_interval: None,
            last_emit: None,
            line_no: 0,
            skipped: 0,
            closed: false,
            buf: String::new(),
        }
    }

    /// Partition key for records that do not carry one.
    pub fn with_key(mut self, key: Option<PartitionKey>) -> Self {
        self.key = key;
        self
    }

    /// Minimum delay between two records, to replay a file at sensor pace.
    pub fn with_replay_interval(mut self, interval: Option<Duration>) -> Self {
        self.replay_interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Lines skipped so far.
    #[cfg(test)]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn pace(&mut self) {
        if let (Some(interval), Some(last)) = (self.replay_interval, self.last_emit) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_emit = Some(Instant::now());
    }
}

impl<P: LineParser> IngestionAdapter for LineSource<P> {
    fn next_record(&mut self, _timeout: Duration) -> Result<Option<Record>> {
        while !self.closed {
            self.buf.clear();
            let line_no = self.line_no + 1;
            let read = self
                .reader
                .read_line(&mut self.buf)
                .with_context(|| format!("failed to read line {line_no}"))?;
            if read == 0 {
                self.closed = true;
                tracing::info!(
                    source = self.parser.name(),
                    lines = self.line_no,
                    skipped = self.skipped,
                    "input exhausted"
                );
                break;
            }
            self.line_no += 1;

            let line = self.buf.trim();
            let Some(mut record) = self.parser.parse(line) else {
                self.skipped += 1;
                tracing::debug!(
                    source = self.parser.name(),
                    line = self.line_no,
                    "skipping invalid line"
                );
                continue;
            };

            if self.timestamps == TimestampMode::Arrival {
                record.timestamp = self.clock.now_ms();
            }
            if record.key.is_none() {
                record.key = self.key.clone();
            }
            self.pace();
            return Ok(Some(record));
        }
        Ok(None)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Parse a naive timestamp as UTC milliseconds, trying each format in turn.
pub(crate) fn parse_naive_utc(value: &str, formats: &[&str]) -> Option<EventTime> {
    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|time| time.and_utc().timestamp_millis())
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
