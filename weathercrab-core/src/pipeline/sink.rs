use super::*;

/// Where finalized windows go.
///
/// `timeout` bounds how long a single publish may block; expiry is reported
/// as [`PublishError::Timeout`].
pub trait EmissionSink: Send {
    fn publish(
        &mut self,
        window: &FinalizedWindow,
        timeout: Option<Duration>,
    ) -> Result<(), PublishError>;
}

impl<S: EmissionSink + ?Sized> EmissionSink for Box<S> {
    fn publish(
        &mut self,
        window: &FinalizedWindow,
        timeout: Option<Duration>,
    ) -> Result<(), PublishError> {
        self.as_mut().publish(window, timeout)
    }
}

impl PublishError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PublishError::Disconnected)
    }
}

/// Sends finalized windows into a bounded crossbeam channel.
///
/// A full channel blocks the publishing worker, which stops it from pulling
/// more records until the consumer catches up.
#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<FinalizedWindow>,
}

impl ChannelSink {
    pub fn new(sender: Sender<FinalizedWindow>) -> Self {
        Self { sender }
    }
}

impl EmissionSink for ChannelSink {
    fn publish(
        &mut self,
        window: &FinalizedWindow,
        timeout: Option<Duration>,
    ) -> Result<(), PublishError> {
        match timeout {
            Some(timeout) => self
                .sender
                .send_timeout(window.clone(), timeout)
                .map_err(|e| match e {
                    SendTimeoutError::Timeout(_) => PublishError::Timeout(timeout),
                    SendTimeoutError::Disconnected(_) => PublishError::Disconnected,
                }),
            None => self
                .sender
                .send(window.clone())
                .map_err(|_| PublishError::Disconnected),
        }
    }
}

/// Collects windows in memory. Clones share the same buffer, so a test can
/// keep one handle while the pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    windows: Arc<Mutex<Vec<FinalizedWindow>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in publish order.
    pub fn windows(&self) -> Vec<FinalizedWindow> {
        self.windows
            .lock()
            .map(|w| w.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl EmissionSink for MemorySink {
    fn publish(
        &mut self,
        window: &FinalizedWindow,
        _timeout: Option<Duration>,
    ) -> Result<(), PublishError> {
        self.windows
            .lock()
            .map_err(|_| PublishError::Rejected("memory sink poisoned".to_string()))?
            .push(window.clone());
        Ok(())
    }
}
