use super::*;

/// What happened to a record handed to a [`WindowAggregator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record updated `window`; `opened` is true if it created the window.
    Accepted { window: WindowKey, opened: bool },
    /// The record's window had already closed; nothing was changed.
    Late { window: WindowKey, close_at: EventTime },
}

/// Assigner, accumulator store and finalizer for one ordered key-stream.
pub struct WindowAggregator<R: Reducer> {
    windows: TumblingWindows,
    store: AccumulatorStore<R>,
    finalizer: Finalizer,
}

impl<R: Reducer> WindowAggregator<R> {
    pub fn new(windows: TumblingWindows, grace_ms: i64, reducer: R) -> Self {
        Self {
            windows,
            store: AccumulatorStore::new(reducer),
            finalizer: Finalizer::new(grace_ms),
        }
    }

    /// Assign `record` to its window and fold it in, unless the window is closed.
    ///
    /// The record's timestamp then advances the clock; call
    /// [`sweep`](Self::sweep) to collect the windows that closed as a result.
    pub fn apply(&mut self, record: &Record, rejected: &mut Vec<FieldRejection>) -> RecordOutcome {
        let window = self.windows.assign(record.timestamp);
        if let Admission::Late { close_at } = self.finalizer.admit(&window) {
            return RecordOutcome::Late { window, close_at };
        }

        let opened = self.store.update(window, record, rejected);
        if opened {
            self.finalizer.track(window);
        }
        self.finalizer.observe(record.timestamp);
        RecordOutcome::Accepted { window, opened }
    }

    /// Advance the clock without a record (periodic tick).
    pub fn advance(&mut self, now: EventTime) -> bool {
        self.finalizer.observe(now)
    }

    /// Windows closed by the current clock, in start order.
    pub fn sweep(&mut self) -> Vec<WindowKey> {
        self.finalizer.sweep()
    }

    /// Every open window, in start order, for the final flush.
    pub fn close_all(&mut self) -> Vec<WindowKey> {
        self.finalizer.close_all()
    }

    /// Result of a closed window that has not been emitted yet.
    pub fn finalize(&self, window: &WindowKey) -> Option<crate::reducer::WindowResult> {
        if !self.finalizer.can_emit(window) {
            return None;
        }
        self.store.finalize(window)
    }

    /// Mark `window` emitted and drop its state.
    pub fn evict(&mut self, window: &WindowKey) {
        self.finalizer.mark_emitted(*window);
        self.store.remove(window);
    }

    pub fn phase(&self, window: &WindowKey) -> Option<WindowPhase> {
        self.finalizer.phase(window, self.store.contains(window))
    }

    pub fn clock(&self) -> Option<EventTime> {
        self.finalizer.clock()
    }

    /// Number of windows currently holding state.
    pub fn open_windows(&self) -> usize {
        self.store.len()
    }
}
