//! Writing finalized windows as JSON lines.

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use crossbeam_channel::Receiver;
use weathercrab_core::finalizer::FinalizedWindow;
use weathercrab_core::reducer::WindowResult;

/// Field converted by [`TemperatureUnit`].
const TEMPERATURE_FIELD: &str = "temperature";

/// Display unit for the `temperature` field. Readings are taken in Celsius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    /// Convert a Celsius value, rounded to two decimals.
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => round2(celsius * 9.0 / 5.0 + 32.0),
            TemperatureUnit::Kelvin => round2(celsius + 273.15),
        }
    }

    /// Rewrite the temperature values of `window` in this unit.
    pub fn apply(self, window: &mut FinalizedWindow) {
        if self == TemperatureUnit::Celsius {
            return;
        }
        match &mut window.result {
            WindowResult::Mean(fields) => {
                if let Some(value) = fields.get_mut(TEMPERATURE_FIELD) {
                    *value = self.from_celsius(*value);
                }
            }
            WindowResult::Ohlc(fields) => {
                if let Some(ohlc) = fields.get_mut(TEMPERATURE_FIELD) {
                    ohlc.open = self.from_celsius(ohlc.open);
                    ohlc.high = self.from_celsius(ohlc.high);
                    ohlc.low = self.from_celsius(ohlc.low);
                    ohlc.close = self.from_celsius(ohlc.close);
                }
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Writes one JSON object per finalized window.
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    unit: TemperatureUnit,
    written: u64,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W, unit: TemperatureUnit) -> Self {
        Self {
            writer,
            unit,
            written: 0,
        }
    }

    pub fn write(&mut self, window: &FinalizedWindow) -> Result<()> {
        let mut window = window.clone();
        self.unit.apply(&mut window);
        serde_json::to_writer(&mut self.writer, &window).context("failed to encode window")?;
        self.writer.write_all(b"\n")?;
        // Each line is flushed so a downstream reader sees windows as they close.
        self.writer.flush().context("failed to flush output")?;
        self.written += 1;
        Ok(())
    }

    /// Write every window received until all senders are gone.
    pub fn drain(&mut self, windows: &Receiver<FinalizedWindow>) -> Result<u64> {
        for window in windows.iter() {
            self.write(&window)?;
        }
        Ok(self.written)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use weathercrab_core::reducer::Ohlc;
    use weathercrab_core::window::WindowKey;

    use super::*;

    fn mean_window(temperature: f64) -> FinalizedWindow {
        FinalizedWindow {
            partition: Some("St-Jean".to_string()),
            window: WindowKey::new(0, 60_000),
            result: WindowResult::Mean(BTreeMap::from([
                ("temperature".to_string(), temperature),
                ("humidity".to_string(), 40.0),
            ])),
        }
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(TemperatureUnit::Celsius.from_celsius(21.456), 21.456);
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(100.0), 212.0);
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(-40.0), -40.0);
        assert_eq!(TemperatureUnit::Kelvin.from_celsius(0.0), 273.15);
        assert_eq!(TemperatureUnit::Kelvin.from_celsius(21.456), 294.61);
    }

    #[test]
    fn test_apply_only_touches_temperature() {
        let mut window = mean_window(10.0);
        TemperatureUnit::Fahrenheit.apply(&mut window);
        let WindowResult::Mean(fields) = &window.result else {
            panic!("expected mean");
        };
        assert_eq!(fields["temperature"], 50.0);
        assert_eq!(fields["humidity"], 40.0);
    }

    #[test]
    fn test_apply_converts_every_ohlc_component() {
        let mut window = FinalizedWindow {
            partition: None,
            window: WindowKey::new(0, 60_000),
            result: WindowResult::Ohlc(BTreeMap::from([(
                "temperature".to_string(),
                Ohlc {
                    open: 0.0,
                    high: 10.0,
                    low: -10.0,
                    close: 5.0,
                },
            )])),
        };
        TemperatureUnit::Kelvin.apply(&mut window);
        let WindowResult::Ohlc(fields) = &window.result else {
            panic!("expected ohlc");
        };
        let ohlc = fields["temperature"];
        assert_eq!((ohlc.open, ohlc.high, ohlc.low, ohlc.close), (273.15, 283.15, 263.15, 278.15));
    }

    #[test]
    fn test_writer_emits_one_line_per_window() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        sender.send(mean_window(1.0)).unwrap();
        sender.send(mean_window(2.0)).unwrap();
        drop(sender);

        let mut writer = JsonLinesWriter::new(Vec::new(), TemperatureUnit::Celsius);
        assert_eq!(writer.drain(&receiver).unwrap(), 2);

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: FinalizedWindow = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, mean_window(1.0));
        assert!(lines[1].contains(r#""partition":"St-Jean""#));
    }
}
