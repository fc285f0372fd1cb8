//! # WeatherCrab Core
//!
//! Windowed aggregation of timestamped weather sensor readings.
//!
//! Records are assigned to fixed-size tumbling windows by event time, folded
//! into per-window accumulators by a [`Reducer`](reducer::Reducer), and each
//! window's result is published exactly once after the window closes.
//!
//! - [`types`]: [`Record`](types::Record), [`FieldValue`](types::FieldValue),
//!   [`EventTime`](types::EventTime).
//! - [`window`]: [`WindowKey`](window::WindowKey) and the
//!   [`TumblingWindows`](window::TumblingWindows) assigner.
//! - [`reducer`]: the [`Reducer`](reducer::Reducer) strategy with
//!   [`MeanReducer`](reducer::MeanReducer) and [`OhlcReducer`](reducer::OhlcReducer).
//! - [`state`]: [`AccumulatorStore`](state::AccumulatorStore), per-window reducer state.
//! - [`time`]: logical clock and the close schedule.
//! - [`finalizer`]: window lifecycle and the late-record policy.
//! - [`pipeline`]: [`WindowPipeline`](pipeline::WindowPipeline), sources, sinks, retries.
//! - [`runtime`]: [`PartitionedRuntime`](runtime::PartitionedRuntime), one worker per partition.
//! - [`config`], [`error`], [`metrics`].

pub mod config;
pub mod error;
pub mod finalizer;
pub mod metrics;
pub mod pipeline;
pub mod reducer;
pub mod runtime;
pub mod state;
pub mod time;
pub mod types;
pub mod window;
