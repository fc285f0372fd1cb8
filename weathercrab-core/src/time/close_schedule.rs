use super::*;

/// Open windows indexed by the clock value at which they close.
///
/// A `BTreeMap` keeps close times sorted, so draining due windows is a range
/// scan and yields them in ascending order. With a single window size, close
/// order is also window start order.
///
/// # Invariant
/// A `(close_at, key)` pair is registered at most once; re-registering the
/// same pair is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CloseSchedule {
    pending: BTreeMap<EventTime, BTreeSet<WindowKey>>,
}

impl CloseSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to close once the clock reaches `close_at`.
    pub fn register(&mut self, key: WindowKey, close_at: EventTime) {
        self.pending.entry(close_at).or_default().insert(key);
    }

    /// Remove and return every window with `close_at <= clock`, in ascending
    /// `(close_at, key)` order.
    pub fn drain_due(&mut self, clock: EventTime) -> Vec<WindowKey> {
        let due_times: Vec<EventTime> = self
            .pending
            .range(..=clock)
            .map(|(close_at, _)| *close_at)
            .collect();

        let mut due = Vec::new();
        for close_at in due_times {
            if let Some(keys) = self.pending.remove(&close_at) {
                due.extend(keys);
            }
        }
        due
    }

    /// Remove and return every scheduled window regardless of the clock.
    pub fn drain_all(&mut self) -> Vec<WindowKey> {
        std::mem::take(&mut self.pending)
            .into_values()
            .flatten()
            .collect()
    }

    /// Total number of scheduled windows.
    pub fn len(&self) -> usize {
        self.pending.values().map(|keys| keys.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
