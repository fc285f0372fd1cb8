use super::*;

/// A half-open tumbling window `[start, start + duration_ms)`.
///
/// Ordering is by `start` first, so a sorted collection of keys with the same
/// duration is in emission order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct WindowKey {
    pub start: EventTime,
    pub duration_ms: i64,
}

impl WindowKey {
    pub fn new(start: EventTime, duration_ms: i64) -> Self {
        Self { start, duration_ms }
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> EventTime {
        self.start.saturating_add(self.duration_ms)
    }

    /// Return true if `timestamp` falls inside this window.
    pub fn contains(&self, timestamp: EventTime) -> bool {
        timestamp >= self.start && timestamp < self.end()
    }

    /// The clock value at which this window stops accepting records.
    pub fn close_at(&self, grace_ms: i64) -> EventTime {
        self.end().saturating_add(grace_ms)
    }
}

impl std::fmt::Display for WindowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}
