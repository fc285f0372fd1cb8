//! Worker threads.
//!
//! Each worker is a single thread running one [`WindowPipeline`] over a
//! bounded channel of records:
//!
//! ```text
//! router --(bounded)--> worker 0: ChannelSource -> WindowPipeline -> ChannelSink --+
//!        --(bounded)--> worker 1: ChannelSource -> WindowPipeline -> ChannelSink --+--> output
//! ```
//!
//! Workers share nothing but the output channel and the shutdown signal.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Sender};

use super::KeyPartitioner;
use crate::config::AggregationConfig;
use crate::error::{ConfigError, PipelineError};
use crate::finalizer::FinalizedWindow;
use crate::metrics::PipelineMetrics;
use crate::pipeline::{ChannelSink, ChannelSource, ShutdownSignal, WindowPipeline};
use crate::reducer::Reducer;
use crate::time::{Clock, SystemClock};
use crate::types::Record;

/// Index of a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Sends records to the worker that owns their partition key.
///
/// Sending blocks while that worker's channel is full. Workers see their
/// source close once every router clone has been dropped.
#[derive(Clone)]
pub struct RecordRouter {
    senders: Vec<Sender<Record>>,
    partitioner: KeyPartitioner,
}

impl RecordRouter {
    pub fn route(&self, record: Record) -> Result<()> {
        let worker = self.partitioner.partition(&record, self.senders.len());
        self.senders[worker]
            .send(record)
            .map_err(|_| anyhow!("{} stopped accepting records", WorkerId(worker)))
    }

    pub fn num_workers(&self) -> usize {
        self.senders.len()
    }
}

/// Builds and starts a set of independent pipeline workers.
pub struct PartitionedRuntime<R> {
    config: AggregationConfig,
    reducer: R,
    clock: Arc<dyn Clock>,
}

impl<R> PartitionedRuntime<R>
where
    R: Reducer + Clone + 'static,
{
    /// Validate `config`; every worker gets a clone of `reducer`.
    pub fn new(config: AggregationConfig, reducer: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            reducer,
            clock: Arc::new(SystemClock),
        })
    }

    /// Processing-time source for periodic ticks. Defaults to [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Spawn `config.partitions` workers publishing into `output`.
    pub fn start(
        self,
        output: Sender<FinalizedWindow>,
        shutdown: ShutdownSignal,
    ) -> Result<RuntimeHandle> {
        let mut senders = Vec::with_capacity(self.config.partitions);
        let mut workers = Vec::with_capacity(self.config.partitions);

        for index in 0..self.config.partitions {
            let id = WorkerId(index);
            let (sender, receiver) = bounded(self.config.channel_capacity);
            senders.push(sender);

            let config = self.config.clone();
            let reducer = self.reducer.clone();
            let sink = ChannelSink::new(output.clone());
            let shutdown = shutdown.clone();
            let clock = Arc::clone(&self.clock);

            let handle = thread::Builder::new()
                .name(id.to_string())
                .spawn(move || -> Result<PipelineMetrics, PipelineError> {
                    tracing::info!(worker = %id, "worker started");
                    let mut source = ChannelSource::new(receiver);
                    let mut pipeline = WindowPipeline::new(&config, reducer, sink)?;
                    let result = pipeline.run(&mut source, &shutdown, clock.as_ref());
                    if let Err(err) = &result {
                        tracing::error!(worker = %id, "worker failed: {err}");
                    }
                    result
                })
                .with_context(|| format!("failed to spawn {id}"))?;
            workers.push((id, handle));
        }

        Ok(RuntimeHandle {
            router: RecordRouter {
                senders,
                partitioner: KeyPartitioner::new(),
            },
            workers,
        })
    }
}

/// Running workers.
pub struct RuntimeHandle {
    router: RecordRouter,
    workers: Vec<(WorkerId, JoinHandle<Result<PipelineMetrics, PipelineError>>)>,
}

impl RuntimeHandle {
    /// A router handle for feeding records from another thread.
    pub fn router(&self) -> RecordRouter {
        self.router.clone()
    }

    pub fn route(&self, record: Record) -> Result<()> {
        self.router.route(record)
    }

    /// Close this handle's input, wait for every worker, and sum their metrics.
    ///
    /// Workers only stop once all other [`RecordRouter`] clones are dropped
    /// or the shutdown signal fires. Every worker is joined even if one
    /// fails; the first failure is returned.
    pub fn join(self) -> Result<PipelineMetrics> {
        drop(self.router);

        let mut total = PipelineMetrics::default();
        let mut first_error: Option<anyhow::Error> = None;
        for (id, handle) in self.workers {
            match handle.join() {
                Ok(Ok(metrics)) => {
                    tracing::info!(worker = %id, %metrics, "worker finished");
                    total.merge(&metrics);
                }
                Ok(Err(err)) => {
                    first_error.get_or_insert_with(|| {
                        anyhow::Error::new(err).context(format!("{id} failed"))
                    });
                }
                Err(_) => {
                    first_error.get_or_insert_with(|| anyhow!("{id} panicked"));
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(total),
        }
    }
}

#[cfg(test)]
#[path = "tests/worker_tests.rs"]
mod tests;
