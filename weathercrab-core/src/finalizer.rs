//! # Finalizer
//!
//! Decides when windows close.
//!
//! Each window moves through `Open → Closed → Emitted → Evicted`:
//!
//! ```text
//! record for a new key   -> Open      (close time registered)
//! clock >= end + grace   -> Closed    (returned by sweep, in start order)
//! result published       -> Emitted   (mark_emitted)
//! state removed          -> Evicted   (terminal, key never reopens)
//! ```
//!
//! The clock is logical: the maximum record timestamp or tick time seen so far.

use serde::{Deserialize, Serialize};

use crate::reducer::WindowResult;
use crate::time::{CloseSchedule, LogicalClock};
use crate::types::{EventTime, PartitionKey};
use crate::window::WindowKey;

/// Lifecycle phase of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowPhase {
    Open,
    Closed,
    Emitted,
    Evicted,
}

/// The result of a closed window, handed to the sink exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionKey>,
    pub window: WindowKey,
    pub result: WindowResult,
}

/// Whether a record may still update its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    /// The window's close boundary has already been reached.
    Late { close_at: EventTime },
}

/// Close-time bookkeeping for the windows of one ordered stream.
#[derive(Debug, Clone)]
pub struct Finalizer {
    grace_ms: i64,
    clock: LogicalClock,
    schedule: CloseSchedule,
    last_emitted: Option<WindowKey>,
}

impl Finalizer {
    /// Create a finalizer that keeps windows open for `grace_ms` past their end.
    pub fn new(grace_ms: i64) -> Self {
        debug_assert!(grace_ms >= 0);
        Self {
            grace_ms,
            clock: LogicalClock::new(),
            schedule: CloseSchedule::new(),
            last_emitted: None,
        }
    }

    pub fn grace_ms(&self) -> i64 {
        self.grace_ms
    }

    pub fn clock(&self) -> Option<EventTime> {
        self.clock.now()
    }

    /// Check whether `key` can still accept records.
    ///
    /// A key is late once the clock has reached its close time, or once a
    /// window at or after it has been emitted (which covers windows closed
    /// by a flush before the clock got there).
    pub fn admit(&self, key: &WindowKey) -> Admission {
        let close_at = key.close_at(self.grace_ms);
        let emitted_past = self.last_emitted.is_some_and(|last| *key <= last);
        if self.clock.has_reached(close_at) || emitted_past {
            Admission::Late { close_at }
        } else {
            Admission::Accept
        }
    }

    /// Start tracking a newly opened window.
    pub fn track(&mut self, key: WindowKey) {
        self.schedule.register(key, key.close_at(self.grace_ms));
    }

    /// Advance the clock. Returns true if it moved.
    pub fn observe(&mut self, timestamp: EventTime) -> bool {
        self.clock.advance(timestamp)
    }

    /// Windows whose close time the clock has reached, in ascending start order.
    ///
    /// Returned windows are `Closed`: they are no longer tracked and the
    /// caller must finalize them.
    pub fn sweep(&mut self) -> Vec<WindowKey> {
        match self.clock.now() {
            Some(now) => self.schedule.drain_due(now),
            None => Vec::new(),
        }
    }

    /// Close every tracked window regardless of the clock, as a sweep with
    /// zero grace at the end of time. Used for the shutdown flush.
    pub fn close_all(&mut self) -> Vec<WindowKey> {
        self.schedule.drain_all()
    }

    /// Return true if `key` has not been emitted yet.
    pub fn can_emit(&self, key: &WindowKey) -> bool {
        self.last_emitted.map_or(true, |last| *key > last)
    }

    /// Record that `key` has been handed to the sink.
    pub fn mark_emitted(&mut self, key: WindowKey) {
        debug_assert!(self.can_emit(&key), "window {key} emitted twice");
        self.last_emitted = Some(key);
    }

    /// Phase of `key`, given whether the store still holds state for it.
    ///
    /// Returns `None` for a key that was never opened and is not yet late.
    pub fn phase(&self, key: &WindowKey, has_state: bool) -> Option<WindowPhase> {
        let late = matches!(self.admit(key), Admission::Late { .. });
        let emitted = !self.can_emit(key);
        match (has_state, late, emitted) {
            (true, _, true) => Some(WindowPhase::Emitted),
            (true, true, false) => Some(WindowPhase::Closed),
            (true, false, false) => Some(WindowPhase::Open),
            (false, true, _) | (false, _, true) => Some(WindowPhase::Evicted),
            (false, false, false) => None,
        }
    }
}
