//! Aggregation configuration.
//!
//! Built once at startup (by the CLI or a test) and validated before any
//! record is processed; every failure here is a [`ConfigError`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reducer::{MeanReducer, OhlcReducer, ReducerKind};
use crate::window::TumblingWindows;

/// Default bounded channel size, matching the local channel default.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Every option the aggregation engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    #[serde(with = "millis")]
    pub window_duration: Duration,
    /// How long past a window's end late records are still accepted.
    #[serde(with = "millis")]
    pub grace: Duration,
    pub reducer_kind: ReducerKind,
    /// Fields to aggregate, in output order.
    pub field_names: Vec<String>,
    /// Publish attempts after the first one before a sink failure is fatal.
    pub max_publish_retries: u32,
    #[serde(with = "millis")]
    pub retry_backoff: Duration,
    #[serde(with = "millis")]
    pub max_retry_backoff: Duration,
    #[serde(with = "millis_opt")]
    pub publish_timeout: Option<Duration>,
    #[serde(with = "millis")]
    pub poll_timeout: Duration,
    /// Periodic sweep interval. `None` (the default) disables
    /// processing-time ticks, so windows only close as record timestamps
    /// advance. Only enable it when timestamps come from the same clock the
    /// ticks read, or a tick will close every window of older event time.
    #[serde(with = "millis_opt")]
    pub tick_interval: Option<Duration>,
    /// Number of parallel workers.
    pub partitions: usize,
    pub channel_capacity: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            window_duration: Duration::from_secs(60),
            grace: Duration::ZERO,
            reducer_kind: ReducerKind::Mean,
            field_names: vec!["temperature".to_string()],
            max_publish_retries: 3,
            retry_backoff: Duration::from_millis(100),
            max_retry_backoff: Duration::from_secs(5),
            publish_timeout: None,
            poll_timeout: Duration::from_millis(500),
            tick_interval: None,
            partitions: 1,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl AggregationConfig {
    /// Check every option. Call once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.windows()?;
        self.grace_ms()?;

        if self.field_names.is_empty() {
            return Err(ConfigError::NoFields);
        }
        for (i, name) in self.field_names.iter().enumerate() {
            if self.field_names[..i].contains(name) {
                return Err(ConfigError::DuplicateField(name.clone()));
            }
        }
        if self.partitions == 0 {
            return Err(ConfigError::Zero("partitions"));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Zero("channel_capacity"));
        }
        if self.tick_interval == Some(Duration::ZERO) {
            return Err(ConfigError::Zero("tick_interval"));
        }
        Ok(())
    }

    /// The window assigner for this configuration.
    pub fn windows(&self) -> Result<TumblingWindows, ConfigError> {
        TumblingWindows::new(self.window_duration)
    }

    pub fn grace_ms(&self) -> Result<i64, ConfigError> {
        i64::try_from(self.grace.as_millis()).map_err(|_| ConfigError::GraceTooLarge(self.grace))
    }

    pub fn mean_reducer(&self) -> MeanReducer {
        MeanReducer::new(self.field_names.clone())
    }

    pub fn ohlc_reducer(&self) -> OhlcReducer {
        OhlcReducer::new(self.field_names.clone())
    }
}

/// Serialize a `Duration` as integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod millis_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(AggregationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_default_config_has_no_processing_time_ticks() {
        assert_eq!(AggregationConfig::default().tick_interval, None);
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let config = AggregationConfig {
            tick_interval: Some(Duration::ZERO),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("tick_interval")));
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let config = AggregationConfig {
            window_duration: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveWindow(Duration::ZERO))
        );
    }

    #[test]
    fn test_field_list_must_be_non_empty_and_unique() {
        let mut config = AggregationConfig {
            field_names: vec![],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoFields));

        config.field_names = vec!["temperature".into(), "humidity".into(), "temperature".into()];
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateField("temperature".into()))
        );
    }

    #[test]
    fn test_zero_partitions_rejected() {
        let config = AggregationConfig {
            partitions: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("partitions")));
    }

    #[test]
    fn test_deserialize_from_millis_with_defaults() {
        let config: AggregationConfig = serde_json::from_str(
            r#"{"window_duration": 300000, "grace": 5000, "reducer_kind": "ohlc",
                "field_names": ["temperature", "wind_speed"], "tick_interval": null}"#,
        )
        .unwrap();
        assert_eq!(config.window_duration, Duration::from_secs(300));
        assert_eq!(config.grace_ms(), Ok(5_000));
        assert_eq!(config.reducer_kind, ReducerKind::Ohlc);
        assert_eq!(config.tick_interval, None);
        assert_eq!(config.max_publish_retries, 3);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_unknown_reducer_kind_fails_to_deserialize() {
        let result: Result<AggregationConfig, _> =
            serde_json::from_str(r#"{"reducer_kind": "median"}"#);
        assert!(result.is_err());
    }
}
