use std::io::{Cursor, Write};

use weathercrab_core::time::ManualClock;
use weathercrab_core::types::FieldValue;

use super::*;

const MINUTE: i64 = 60_000;

fn csv_source(input: &str, timestamps: TimestampMode, clock: ManualClock) -> LineSource<CsvParser> {
    LineSource::new(
        Box::new(Cursor::new(input.to_string())),
        CsvParser,
        timestamps,
        Box::new(clock),
    )
}

fn drain<P: LineParser>(source: &mut LineSource<P>) -> Vec<Record> {
    let mut records = Vec::new();
    while let Some(record) = source.next_record(Duration::ZERO).unwrap() {
        records.push(record);
    }
    assert!(source.is_closed());
    records
}

#[test]
fn test_csv_line_parses_as_utc() {
    let record = CsvParser.parse("1970-01-01T00:02,-3.5,81,12.0").unwrap();
    assert_eq!(record.timestamp, 2 * MINUTE);
    assert_eq!(record.field("temperature"), Some(&FieldValue::Number(-3.5)));
    assert_eq!(record.field("humidity"), Some(&FieldValue::Number(81.0)));
    assert_eq!(record.field("wind_speed"), Some(&FieldValue::Number(12.0)));
    assert_eq!(record.key, None);
}

#[test]
fn test_csv_rejects_malformed_lines() {
    for line in [
        "time,temperature_2m,relative_humidity_2m,wind_speed_10m",
        "",
        "1970-01-01T00:02,-3.5,81",
        "1970-01-01T00:02,-3.5,81,12.0,7",
        "1970-01-01T00:02,warm,81,12.0",
        "yesterday,1.0,2,3.0",
    ] {
        assert!(CsvParser.parse(line).is_none(), "accepted {line:?}");
    }
}

#[test]
fn test_line_source_skips_invalid_lines_and_closes() {
    let input = "time,temperature_2m,relative_humidity_2m,wind_speed_10m\n\
                 1970-01-01T00:00,10.0,50,5.0\n\
                 garbage\n\
                 1970-01-01T00:01,20.0,55,6.0\n";
    let mut source = csv_source(input, TimestampMode::Embedded, ManualClock::new(0));

    let records = drain(&mut source);
    let timestamps: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![0, MINUTE]);
    assert_eq!(source.skipped(), 2);
}

#[test]
fn test_arrival_mode_restamps_with_clock() {
    let clock = ManualClock::new(1_700_000_000_000);
    let input = "2020-06-01T12:00,10.0,50,5.0\n";
    let mut source = csv_source(input, TimestampMode::Arrival, clock.clone());

    let records = drain(&mut source);
    assert_eq!(records[0].timestamp, 1_700_000_000_000);
}

#[test]
fn test_default_key_does_not_override_payload_key() {
    let input = concat!(
        r#"{"key": "Montreal", "current": {"time": "2024-05-01T10:00", "temperature_2m": 1.0}}"#,
        "\n",
        r#"{"current": {"time": "2024-05-01T10:15", "temperature_2m": 2.0}}"#,
        "\n",
    );
    let mut source = LineSource::new(
        Box::new(Cursor::new(input.to_string())),
        OpenMeteoParser,
        TimestampMode::Embedded,
        Box::new(ManualClock::new(0)),
    )
    .with_key(Some("St-Jean".to_string()));

    let keys: Vec<Option<String>> = drain(&mut source).into_iter().map(|r| r.key).collect();
    assert_eq!(keys, vec![Some("Montreal".into()), Some("St-Jean".into())]);
}

#[test]
fn test_open_meteo_maps_current_fields() {
    let line = r#"{"latitude": 45.3, "current": {"time": "2024-05-01T10:15", "interval": 900,
        "temperature_2m": 14.2, "relative_humidity_2m": 63, "wind_speed_10m": 9.7}}"#
        .replace('\n', "");
    let record = OpenMeteoParser.parse(&line).unwrap();

    assert_eq!(record.timestamp, 1_714_558_500_000);
    assert_eq!(record.field("temperature"), Some(&FieldValue::Number(14.2)));
    assert_eq!(record.field("humidity"), Some(&FieldValue::Number(63.0)));
    assert_eq!(record.field("wind_speed"), Some(&FieldValue::Number(9.7)));
    assert_eq!(record.field("interval"), None);
}

#[test]
fn test_open_meteo_keeps_non_numeric_values_as_text() {
    let line = r#"{"current": {"time": "2024-05-01T10:15:00Z", "temperature_2m": "n/a", "wind_speed_10m": null}}"#;
    let record = OpenMeteoParser.parse(line).unwrap();

    assert_eq!(record.field("temperature"), Some(&FieldValue::Text("n/a".into())));
    assert_eq!(record.field("wind_speed"), None);
    assert_eq!(record.field("humidity"), None);
}

#[test]
fn test_open_meteo_time_formats() {
    let parse = |time: &str| {
        let line = format!(r#"{{"current": {{"time": "{time}"}}}}"#);
        OpenMeteoParser.parse(&line).map(|r| r.timestamp)
    };
    let expected = Some(1_714_558_500_000);
    assert_eq!(parse("2024-05-01T10:15"), expected);
    assert_eq!(parse("2024-05-01T10:15:00"), expected);
    assert_eq!(parse("2024-05-01T12:15:00+02:00"), expected);
    assert_eq!(parse("2024-05-01 10:15:00.000000"), expected);
    assert_eq!(parse("not a time"), None);
}

#[test]
fn test_open_meteo_rejects_non_forecast_lines() {
    assert!(OpenMeteoParser.parse("").is_none());
    assert!(OpenMeteoParser.parse("{not json").is_none());
    assert!(OpenMeteoParser.parse(r#"{"latitude": 45}"#).is_none());
}

#[test]
fn test_csv_file_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "1970-01-01T00:00,1.0,10,1.0").unwrap();
    writeln!(file, "1970-01-01T00:00,3.0,30,3.0").unwrap();
    file.flush().unwrap();

    let reader = std::io::BufReader::new(std::fs::File::open(file.path()).unwrap());
    let mut source = LineSource::new(
        Box::new(reader),
        CsvParser,
        TimestampMode::Embedded,
        Box::new(ManualClock::new(0)),
    );
    assert_eq!(drain(&mut source).len(), 2);
}
