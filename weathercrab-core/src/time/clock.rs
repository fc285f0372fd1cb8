use super::*;

/// Monotonic logical clock.
///
/// Starts unset and only moves forward: observing an older timestamp
/// (an out-of-order record, a tick behind event time) leaves it unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalClock {
    current: Option<EventTime>,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `timestamp` if it is later than the current value.
    ///
    /// Returns true if the clock moved.
    pub fn advance(&mut self, timestamp: EventTime) -> bool {
        match self.current {
            Some(now) if now >= timestamp => false,
            _ => {
                self.current = Some(timestamp);
                true
            }
        }
    }

    /// Current value, or `None` before the first observation.
    pub fn now(&self) -> Option<EventTime> {
        self.current
    }

    /// Return true if a window closing at `close_at` is already closed.
    pub fn has_reached(&self, close_at: EventTime) -> bool {
        self.current.is_some_and(|now| now >= close_at)
    }
}

/// Source of processing time used to drive periodic ticks.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> EventTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> EventTime {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as EventTime)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: EventTime) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, now: EventTime) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> EventTime {
        self.now.load(Ordering::SeqCst)
    }
}
