use super::*;

/// Cooperative shutdown flag shared between a controller and its workers.
///
/// Workers check it at their suspension points (between polls). After
/// [`trigger`](Self::trigger) they finish the record in hand, flush open
/// windows and stop. After [`abort`](Self::abort) they stop without flushing,
/// discarding open windows.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    aborted: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    /// Stop without publishing partial windows, e.g. after the upstream
    /// source failed.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.trigger();
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}
