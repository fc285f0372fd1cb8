use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use weathercrab_core::types::{EventTime, FieldValue, Record};

use super::{parse_naive_utc, LineParser};

/// Timestamp layouts seen in forecast payloads, after RFC 3339.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Payload field to record field.
const FIELD_MAP: [(&str, &str); 3] = [
    ("temperature_2m", "temperature"),
    ("relative_humidity_2m", "humidity"),
    ("wind_speed_10m", "wind_speed"),
];

#[derive(Debug, Deserialize)]
struct Forecast {
    current: Current,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Current {
    time: String,
    #[serde(flatten)]
    values: serde_json::Map<String, Value>,
}

/// Parses one Open-Meteo "current weather" response per line.
///
/// A reading that is present but not a number is kept as text so the reducer
/// can report it; the line itself is only skipped when it is not a forecast.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMeteoParser;

impl LineParser for OpenMeteoParser {
    fn parse(&self, line: &str) -> Option<Record> {
        if line.is_empty() {
            return None;
        }
        let forecast: Forecast = match serde_json::from_str(line) {
            Ok(forecast) => forecast,
            Err(err) => {
                tracing::debug!("not a forecast payload: {err}");
                return None;
            }
        };

        let mut record = Record::new(parse_time(&forecast.current.time)?);
        record.key = forecast.key;
        for (source, target) in FIELD_MAP {
            match forecast.current.values.get(source) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    record = record.with_field(target, field_value(value));
                }
            }
        }
        Some(record)
    }

    fn name(&self) -> &'static str {
        "open-meteo"
    }
}

fn parse_time(value: &str) -> Option<EventTime> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(time) => Some(time.timestamp_millis()),
        Err(_) => parse_naive_utc(value, &NAIVE_FORMATS),
    }
}

fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(FieldValue::Number)
            .unwrap_or_else(|| FieldValue::Text(n.to_string())),
        Value::String(s) => FieldValue::Text(s.clone()),
        other => FieldValue::Text(other.to_string()),
    }
}
