use super::*;

/// Orchestrates one worker: pulls records, updates windows, publishes results.
///
/// Records are grouped by [`Record::key`]; every key gets its own
/// [`WindowAggregator`] (and so its own accumulator store and clock), and
/// results of different keys are never merged.
pub struct WindowPipeline<R: Reducer + Clone, S: EmissionSink> {
    windows: TumblingWindows,
    grace_ms: i64,
    reducer: R,
    /// Kept after a stream goes idle: its clock and last emitted window
    /// reject records for windows already published.
    streams: AHashMap<Option<PartitionKey>, WindowAggregator<R>>,
    sink: S,
    retry: RetryPolicy,
    publish_timeout: Option<Duration>,
    poll_timeout: Duration,
    tick_interval: Option<Duration>,
    metrics: PipelineMetrics,
    /// Scratch buffer reused across records.
    rejected: Vec<FieldRejection>,
}

impl<R: Reducer + Clone, S: EmissionSink> WindowPipeline<R, S> {
    /// Validate `config` and build a pipeline around `reducer` and `sink`.
    pub fn new(config: &AggregationConfig, reducer: R, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            windows: config.windows()?,
            grace_ms: config.grace_ms()?,
            reducer,
            streams: AHashMap::new(),
            sink,
            retry: RetryPolicy::from_config(config),
            publish_timeout: config.publish_timeout,
            poll_timeout: config.poll_timeout,
            tick_interval: config.tick_interval,
            metrics: PipelineMetrics::default(),
            rejected: Vec::new(),
        })
    }

    /// Apply one record, then publish every window its timestamp closed.
    pub fn process(&mut self, record: Record) -> Result<RecordOutcome, PipelineError> {
        self.metrics.records_processed += 1;
        self.rejected.clear();

        let stream = record.key.clone();
        let aggregator = self.streams.entry(stream.clone()).or_insert_with(|| {
            WindowAggregator::new(self.windows, self.grace_ms, self.reducer.clone())
        });
        let outcome = aggregator.apply(&record, &mut self.rejected);
        let closed = aggregator.sweep();

        match outcome {
            RecordOutcome::Late { window, close_at } => {
                self.metrics.late_records += 1;
                tracing::debug!(
                    partition = stream.as_deref().unwrap_or("-"),
                    %window,
                    timestamp = record.timestamp,
                    close_at,
                    "dropping late record"
                );
            }
            RecordOutcome::Accepted { window, opened } => {
                if opened {
                    self.metrics.windows_opened += 1;
                    tracing::trace!(%window, phase = ?WindowPhase::Open, "window opened");
                }
            }
        }

        for rejection in &self.rejected {
            tracing::warn!(
                partition = stream.as_deref().unwrap_or("-"),
                timestamp = record.timestamp,
                "skipping malformed field: {rejection}"
            );
        }
        self.metrics.malformed_fields += self.rejected.len() as u64;

        self.emit(&stream, closed)?;
        Ok(outcome)
    }

    /// Advance every stream's clock to `now` and publish what closes.
    ///
    /// Lets windows close while the source is quiet.
    pub fn tick(&mut self, now: EventTime) -> Result<usize, PipelineError> {
        self.metrics.ticks += 1;
        let mut due = Vec::new();
        for (stream, aggregator) in self.streams.iter_mut() {
            aggregator.advance(now);
            let closed = aggregator.sweep();
            if !closed.is_empty() {
                due.push((stream.clone(), closed));
            }
        }
        due.sort_by(|a, b| a.0.cmp(&b.0));

        let mut emitted = 0;
        for (stream, closed) in due {
            emitted += self.emit(&stream, closed)?;
        }
        Ok(emitted)
    }

    /// Close and publish every open window, as a zero-grace sweep.
    pub fn flush(&mut self) -> Result<usize, PipelineError> {
        let mut streams: Vec<Option<PartitionKey>> = self.streams.keys().cloned().collect();
        streams.sort();

        let mut emitted = 0;
        for stream in streams {
            let closed = match self.streams.get_mut(&stream) {
                Some(aggregator) => aggregator.close_all(),
                None => continue,
            };
            emitted += self.emit(&stream, closed)?;
        }
        Ok(emitted)
    }

    /// Drive the pipeline until `source` closes or `shutdown` is triggered,
    /// then flush.
    ///
    /// An ingestion error or an aborted `shutdown` returns immediately,
    /// without flushing, so no partial window is published.
    pub fn run<A: IngestionAdapter + ?Sized>(
        &mut self,
        source: &mut A,
        shutdown: &ShutdownSignal,
        clock: &dyn Clock,
    ) -> Result<PipelineMetrics, PipelineError> {
        let mut next_tick = self.tick_interval.map(|interval| Instant::now() + interval);

        loop {
            if shutdown.is_aborted() {
                tracing::warn!(open_windows = self.open_windows(), "aborted, discarding open windows");
                return Err(PipelineError::Aborted);
            }
            if shutdown.is_triggered() {
                tracing::info!(open_windows = self.open_windows(), "shutdown requested");
                break;
            }

            match source.next_record(self.poll_timeout) {
                Ok(Some(record)) => {
                    self.process(record)?;
                }
                Ok(None) if source.is_closed() => {
                    tracing::info!(open_windows = self.open_windows(), "source closed");
                    break;
                }
                Ok(None) => {}
                Err(err) => return Err(PipelineError::ingestion(err)),
            }

            if let (Some(interval), Some(due)) = (self.tick_interval, next_tick) {
                if Instant::now() >= due {
                    self.tick(clock.now_ms())?;
                    next_tick = Some(Instant::now() + interval);
                }
            }
        }

        // An abort drops the senders, so the source may look closed first.
        if shutdown.is_aborted() {
            tracing::warn!(open_windows = self.open_windows(), "aborted, discarding open windows");
            return Err(PipelineError::Aborted);
        }

        let flushed = self.flush()?;
        tracing::info!(flushed, metrics = %self.metrics, "pipeline stopped");
        Ok(self.metrics)
    }

    /// Finalize, publish and evict `closed` windows of `stream`, in order.
    fn emit(
        &mut self,
        stream: &Option<PartitionKey>,
        closed: Vec<WindowKey>,
    ) -> Result<usize, PipelineError> {
        let mut emitted = 0;
        for key in closed {
            let result = match self.streams.get(stream) {
                Some(aggregator) => aggregator.finalize(&key),
                None => None,
            };
            let Some(result) = result else {
                continue;
            };

            let window = FinalizedWindow {
                partition: stream.clone(),
                window: key,
                result,
            };
            self.publish(&window)?;

            if let Some(aggregator) = self.streams.get_mut(stream) {
                aggregator.evict(&key);
            }
            self.metrics.windows_emitted += 1;
            emitted += 1;
            tracing::debug!(
                partition = stream.as_deref().unwrap_or("-"),
                window = %key,
                fields = window.result.len(),
                "window emitted"
            );
        }
        Ok(emitted)
    }

    /// Publish with bounded retries. Exhaustion is fatal.
    fn publish(&mut self, window: &FinalizedWindow) -> Result<(), PipelineError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.sink.publish(window, self.publish_timeout) {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempts <= self.retry.max_retries => {
                    let delay = self.retry.backoff(attempts);
                    self.metrics.publish_retries += 1;
                    tracing::warn!(
                        window = %window.window,
                        attempt = attempts,
                        ?delay,
                        "publish failed, retrying: {err}"
                    );
                    std::thread::sleep(delay);
                }
                Err(source) => {
                    return Err(PipelineError::Sink {
                        window: window.window,
                        attempts,
                        source,
                    })
                }
            }
        }
    }

    /// Lifecycle phase of `window` in the stream keyed by `partition`.
    pub fn window_phase(&self, partition: Option<&str>, window: &WindowKey) -> Option<WindowPhase> {
        let stream = partition.map(str::to_string);
        self.streams.get(&stream).and_then(|a| a.phase(window))
    }

    /// Windows currently holding state, across all streams.
    pub fn open_windows(&self) -> usize {
        self.streams.values().map(|a| a.open_windows()).sum()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
