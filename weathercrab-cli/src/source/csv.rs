use weathercrab_core::types::Record;

use super::{parse_naive_utc, LineParser};

/// Field names, in column order after the timestamp.
const COLUMNS: [&str; 3] = ["temperature", "humidity", "wind_speed"];

/// Parses `YYYY-MM-DDTHH:MM,temperature,humidity,wind_speed` lines.
///
/// All three readings must be numbers; anything else (including the header
/// row) is rejected as a whole line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvParser;

impl LineParser for CsvParser {
    fn parse(&self, line: &str) -> Option<Record> {
        let mut columns = line.split(',');
        let time = columns.next()?;
        let timestamp = parse_naive_utc(time.trim(), &["%Y-%m-%dT%H:%M"])?;

        let mut record = Record::new(timestamp);
        for name in COLUMNS {
            let value: f64 = columns.next()?.trim().parse().ok()?;
            record = record.with_field(name, value);
        }
        if columns.next().is_some() {
            return None;
        }
        Some(record)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
