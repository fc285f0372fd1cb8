use super::*;

/// Fixed-size, non-overlapping event-time windows aligned to multiples of the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TumblingWindows {
    size_ms: i64,
}

impl TumblingWindows {
    /// Create tumbling windows of the given `size`.
    ///
    /// Fails for sizes that round down to zero milliseconds or do not fit in
    /// an [`EventTime`]; this is checked once at startup, never per record.
    pub fn new(size: Duration) -> Result<Self, ConfigError> {
        let size_ms = i64::try_from(size.as_millis())
            .map_err(|_| ConfigError::WindowTooLarge(size))?;
        if size_ms <= 0 {
            return Err(ConfigError::NonPositiveWindow(size));
        }
        Ok(Self { size_ms })
    }

    pub fn size_ms(&self) -> i64 {
        self.size_ms
    }

    /// Map `timestamp` to the window containing it.
    pub fn assign(&self, timestamp: EventTime) -> WindowKey {
        assign(timestamp, self.size_ms)
    }
}

/// `start = floor(timestamp / size) * size`, using Euclidean flooring so
/// timestamps before the epoch land in the window below them.
pub fn assign(timestamp: EventTime, size_ms: i64) -> WindowKey {
    debug_assert!(size_ms > 0);
    let start = timestamp - timestamp.rem_euclid(size_ms);
    WindowKey::new(start, size_ms)
}
