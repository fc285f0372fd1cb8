use super::*;

/// Where records come from.
///
/// `next_record` blocks for at most `timeout`. `Ok(None)` means nothing is
/// available right now, not end of stream; exhaustion is reported by
/// [`is_closed`](Self::is_closed). An `Err` is an unrecoverable ingestion
/// failure.
pub trait IngestionAdapter {
    fn next_record(&mut self, timeout: Duration) -> Result<Option<Record>>;

    fn is_closed(&self) -> bool;
}

impl<A: IngestionAdapter + ?Sized> IngestionAdapter for Box<A> {
    fn next_record(&mut self, timeout: Duration) -> Result<Option<Record>> {
        self.as_mut().next_record(timeout)
    }

    fn is_closed(&self) -> bool {
        self.as_ref().is_closed()
    }
}

/// A finite, in-memory source. Closed once drained.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    records: VecDeque<Record>,
}

impl VecSource {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }
}

impl IngestionAdapter for VecSource {
    fn next_record(&mut self, _timeout: Duration) -> Result<Option<Record>> {
        Ok(self.records.pop_front())
    }

    fn is_closed(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads records from a crossbeam channel. Closed when every sender is
/// dropped and the buffer is drained.
pub struct ChannelSource {
    receiver: Receiver<Record>,
    closed: bool,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<Record>) -> Self {
        Self {
            receiver,
            closed: false,
        }
    }
}

impl IngestionAdapter for ChannelSource {
    fn next_record(&mut self, timeout: Duration) -> Result<Option<Record>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(record) => Ok(Some(record)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                Ok(None)
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
