#![warn(unreachable_pub, missing_debug_implementations)]

//! The core `flowlens` library: a statistical reduction engine for the
//! telemetry logs of datacenter-network simulation runs. Flow-completion
//! records, queue occupancy samples, and cumulative port byte counters are
//! reduced to percentile tables, rank-bucketed breakdowns by flow size, and
//! empirical CDFs.
//!
//! All analyses are synchronous, single-pass batch reducers over complete,
//! closed logs. Sorting and nearest-rank percentile lookup require the full
//! sample set in memory; there is no streaming percentile estimator, so the
//! size of one (run, metric) sample set is bounded by available memory.
//! Independent runs can be processed concurrently since nothing is shared
//! between analysis passes.

#[macro_use]
mod ident;

pub mod bucket;
pub mod cdf;
pub mod config;
pub mod fct;
pub mod queue;
pub mod records;
pub mod stats;
pub mod units;
pub mod uplink;

#[cfg(test)]
pub(crate) mod testing;

pub use bucket::{DecileBucket, FlowMetric};
pub use cdf::{Cdf, CdfPoint};
pub use config::AnalysisProfile;
pub use fct::{FctAnalysis, FctReport, MetricKind, SizeClass};
pub use queue::{EntityCount, QueueAnalysis, QueueReport, QueueSeries};
pub use records::{FlowRecord, PortCounterSample, PortId, QueueSample, SwitchId};
pub use stats::SummaryStats;
pub use units::{Bytes, Nanosecs, TimeWindow};
pub use uplink::{UplinkAnalysis, UplinkReport};
