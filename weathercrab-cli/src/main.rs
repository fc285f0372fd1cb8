use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use weathercrab_core::config::{AggregationConfig, DEFAULT_CHANNEL_CAPACITY};
use weathercrab_core::metrics::PipelineMetrics;
use weathercrab_core::pipeline::{IngestionAdapter, ShutdownSignal};
use weathercrab_core::reducer::{Reducer, ReducerKind};
use weathercrab_core::runtime::{PartitionedRuntime, RuntimeHandle};
use weathercrab_core::time::SystemClock;

mod output;
mod source;

use output::{JsonLinesWriter, TemperatureUnit};
use source::{CsvParser, LineSource, OpenMeteoParser, TimestampMode};

#[derive(Parser, Debug)]
#[command(name = "weathercrab", version)]
#[command(about = "Windowed aggregation of weather sensor readings", long_about = None)]
struct Cli {
    #[command(flatten)]
    aggregation: AggregationArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "WEATHERCRAB_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    source: SourceCommand,
}

#[derive(Args, Debug)]
struct AggregationArgs {
    /// Tumbling window size in seconds.
    #[arg(long, env = "WEATHERCRAB_WINDOW_SECS", default_value_t = 60)]
    window_secs: u64,
    /// Seconds past a window's end during which late records are accepted.
    #[arg(long, env = "WEATHERCRAB_GRACE_SECS", default_value_t = 0)]
    grace_secs: u64,
    #[arg(long, env = "WEATHERCRAB_REDUCER", default_value = "mean")]
    reducer: ReducerKind,
    /// Comma-separated fields to aggregate.
    #[arg(
        long,
        env = "WEATHERCRAB_FIELDS",
        value_delimiter = ',',
        default_value = "temperature,humidity,wind_speed"
    )]
    fields: Vec<String>,
    /// Number of worker threads. Records are routed by partition key.
    #[arg(long, env = "WEATHERCRAB_PARTITIONS", default_value_t = 1)]
    partitions: usize,
    #[arg(long, env = "WEATHERCRAB_CHANNEL_CAPACITY", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    channel_capacity: usize,
    /// Publish retries before a sink failure stops the pipeline.
    #[arg(long, env = "WEATHERCRAB_RETRIES", default_value_t = 3)]
    retries: u32,
    #[arg(long, env = "WEATHERCRAB_PUBLISH_TIMEOUT_MS")]
    publish_timeout_ms: Option<u64>,
    /// Processing-time sweep interval; 0 disables it. Always off for
    /// embedded timestamps.
    #[arg(long, env = "WEATHERCRAB_TICK_INTERVAL_MS", default_value_t = 1000)]
    tick_interval_ms: u64,
}

impl AggregationArgs {
    fn to_config(&self, timestamps: TimestampMode) -> AggregationConfig {
        let tick_interval = match timestamps {
            TimestampMode::Arrival if self.tick_interval_ms > 0 => {
                Some(Duration::from_millis(self.tick_interval_ms))
            }
            _ => None,
        };
        AggregationConfig {
            window_duration: Duration::from_secs(self.window_secs),
            grace: Duration::from_secs(self.grace_secs),
            reducer_kind: self.reducer,
            field_names: self.fields.clone(),
            max_publish_retries: self.retries,
            publish_timeout: self.publish_timeout_ms.map(Duration::from_millis),
            tick_interval,
            partitions: self.partitions,
            channel_capacity: self.channel_capacity,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write results here instead of stdout.
    #[arg(long, short = 'o', env = "WEATHERCRAB_OUTPUT")]
    output: Option<PathBuf>,
    #[arg(long, env = "WEATHERCRAB_TEMPERATURE_UNIT", value_enum, default_value_t = TemperatureUnit::Celsius)]
    temperature_unit: TemperatureUnit,
}

impl OutputArgs {
    fn open(&self) -> Result<JsonLinesWriter<Box<dyn Write + Send>>> {
        let writer: Box<dyn Write + Send> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
            )),
            None => Box::new(io::stdout()),
        };
        Ok(JsonLinesWriter::new(writer, self.temperature_unit))
    }
}

#[derive(Subcommand, Debug)]
enum SourceCommand {
    /// Replay `time,temperature,humidity,wind_speed` lines from a CSV file.
    Csv {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = TimestampMode::Arrival)]
        timestamps: TimestampMode,
        /// Delay between records, in milliseconds.
        #[arg(long, default_value_t = 0)]
        replay_interval_ms: u64,
        /// Partition key given to every record.
        #[arg(long, env = "WEATHERCRAB_KEY")]
        key: Option<String>,
    },
    /// Read Open-Meteo current-weather responses, one JSON object per line.
    OpenMeteo {
        /// Input file; stdin when omitted.
        path: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = TimestampMode::Embedded)]
        timestamps: TimestampMode,
        /// Partition key for payloads without a `key` field.
        #[arg(long, env = "WEATHERCRAB_KEY")]
        key: Option<String>,
    },
}

impl SourceCommand {
    fn timestamps(&self) -> TimestampMode {
        match self {
            SourceCommand::Csv { timestamps, .. } | SourceCommand::OpenMeteo { timestamps, .. } => {
                *timestamps
            }
        }
    }

    fn open(&self) -> Result<Box<dyn IngestionAdapter + Send>> {
        match self {
            SourceCommand::Csv {
                path,
                timestamps,
                replay_interval_ms,
                key,
            } => {
                let file =
                    File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
                let source = LineSource::new(
                    Box::new(BufReader::new(file)),
                    CsvParser,
                    *timestamps,
                    Box::new(SystemClock),
                )
                .with_key(key.clone())
                .with_replay_interval(Some(Duration::from_millis(*replay_interval_ms)));
                Ok(Box::new(source))
            }
            SourceCommand::OpenMeteo {
                path,
                timestamps,
                key,
            } => {
                let reader: Box<dyn io::BufRead + Send> = match path {
                    Some(path) => Box::new(BufReader::new(
                        File::open(path)
                            .with_context(|| format!("failed to open {}", path.display()))?,
                    )),
                    None => Box::new(BufReader::new(io::stdin())),
                };
                let source = LineSource::new(reader, OpenMeteoParser, *timestamps, Box::new(SystemClock))
                    .with_key(key.clone());
                Ok(Box::new(source))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let timestamps = cli.source.timestamps();
    let config = cli.aggregation.to_config(timestamps);
    config.validate()?;
    if timestamps == TimestampMode::Embedded && cli.aggregation.tick_interval_ms > 0 {
        tracing::info!("embedded timestamps: windows close on event time only, ticks disabled");
    }

    let source = cli.source.open()?;
    let writer = cli.output.open()?;

    let shutdown = ShutdownSignal::new();
    tokio::spawn(watch_interrupt(shutdown.clone()));

    tracing::info!(
        reducer = %config.reducer_kind,
        window = ?config.window_duration,
        grace = ?config.grace,
        fields = ?config.field_names,
        partitions = config.partitions,
        "starting aggregation"
    );
    let metrics = match config.reducer_kind {
        ReducerKind::Mean => {
            let reducer = config.mean_reducer();
            aggregate(config, reducer, source, writer, shutdown).await?
        }
        ReducerKind::Ohlc => {
            let reducer = config.ohlc_reducer();
            aggregate(config, reducer, source, writer, shutdown).await?
        }
    };
    tracing::info!(%metrics, "aggregation finished");
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn watch_interrupt(shutdown: ShutdownSignal) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("interrupt received, flushing open windows");
            shutdown.trigger();
        }
        Err(err) => tracing::warn!("cannot listen for interrupts: {err}"),
    }
}

/// Run the partitioned runtime over `source`, writing results with `writer`.
async fn aggregate<R>(
    config: AggregationConfig,
    reducer: R,
    mut source: Box<dyn IngestionAdapter + Send>,
    mut writer: JsonLinesWriter<Box<dyn Write + Send>>,
    shutdown: ShutdownSignal,
) -> Result<PipelineMetrics>
where
    R: Reducer + Clone + 'static,
{
    let poll_timeout = config.poll_timeout;
    let (output, results) = crossbeam_channel::bounded(config.channel_capacity);
    let handle = PartitionedRuntime::new(config, reducer)?.start(output, shutdown.clone())?;

    let writer_thread = std::thread::Builder::new()
        .name("writer".to_string())
        .spawn(move || writer.drain(&results))
        .context("failed to spawn writer")?;

    let metrics = tokio::task::spawn_blocking(move || {
        feed(source.as_mut(), handle, &shutdown, poll_timeout)
    })
    .await
    .context("feeder task panicked")?;

    let written = writer_thread
        .join()
        .map_err(|_| anyhow!("writer thread panicked"))??;
    tracing::debug!(written, "output closed");
    metrics
}

/// Route records from `source` to the workers until it closes or shutdown.
///
/// A source failure aborts the workers so no partial window is written.
fn feed(
    source: &mut dyn IngestionAdapter,
    handle: RuntimeHandle,
    shutdown: &ShutdownSignal,
    poll_timeout: Duration,
) -> Result<PipelineMetrics> {
    let mut routed: u64 = 0;
    while !shutdown.is_triggered() {
        let record = match source.next_record(poll_timeout) {
            Ok(Some(record)) => record,
            Ok(None) if source.is_closed() => break,
            Ok(None) => continue,
            Err(err) => {
                tracing::error!("ingestion failed, discarding open windows: {err:#}");
                shutdown.abort();
                if let Err(join_err) = handle.join() {
                    tracing::debug!("{join_err:#}");
                }
                return Err(err.context("ingestion failed"));
            }
        };
        if let Err(err) = handle.route(record) {
            // The worker stopped; its own error says why.
            let metrics = handle.join()?;
            if shutdown.is_triggered() {
                return Ok(metrics);
            }
            return Err(err);
        }
        routed += 1;
    }
    tracing::info!(routed, "input finished");
    handle.join()
}
