//! Cross-uplink throughput-imbalance analysis.
//!
//! The port counter log records cumulative byte counters whenever any port
//! is sampled, which can be faster than the intended observation cadence.
//! Samples are therefore coalesced to one observation batch per
//! `time_interval`; per-port deltas between accepted batches form the
//! per-interval throughput vectors from which the (max − min) / mean
//! imbalance is derived.

use std::io::BufRead;

use rustc_hash::FxHashMap;

use crate::cdf::{Cdf, CdfError};
use crate::records::{self, PortId, SwitchId};
use crate::units::{Nanosecs, TimeWindow};

/// An uplink imbalance analysis pass.
#[derive(Debug, Clone, Copy, typed_builder::TypedBuilder)]
pub struct UplinkAnalysis {
    /// The analysis time window.
    pub window: TimeWindow,
    /// The dedup/aggregation interval for counter samples.
    #[builder(default = Nanosecs::new(100_000))]
    pub time_interval: Nanosecs,
}

impl UplinkAnalysis {
    /// Reads the port counter log and derives the per-interval, per-switch
    /// throughput-imbalance percentages.
    pub fn run(&self, input: impl BufRead) -> Result<UplinkReport, UplinkError> {
        let mut last_counter: FxHashMap<(SwitchId, PortId), u64> = FxHashMap::default();
        let mut deltas: FxHashMap<(SwitchId, PortId), Vec<u64>> = FxHashMap::default();
        let mut watermark = Nanosecs::ZERO;
        let mut nr_skipped = 0;
        for line in input.lines() {
            let line = line?;
            let sample = match records::parse_port_counter(&line) {
                Ok(sample) => sample,
                Err(_) => {
                    nr_skipped += 1;
                    continue;
                }
            };
            if !self.window.contains(sample.timestamp) {
                continue;
            }
            // Coalesce to one observation batch per interval: accept the
            // first sample ever, samples at the current watermark instant,
            // and samples at least one interval past the watermark.
            if watermark == Nanosecs::ZERO {
                watermark = sample.timestamp;
            } else if watermark + self.time_interval <= sample.timestamp {
                watermark = sample.timestamp;
            } else if watermark != sample.timestamp {
                continue;
            }
            let key = (sample.switch, sample.port);
            let counter = sample.cumulative_bytes.into_u64();
            match last_counter.get(&key) {
                Some(&prev) => {
                    // Counters are cumulative and monotonic; a reset between
                    // samples yields a zero delta rather than an underflow.
                    deltas.entry(key).or_default().push(counter.saturating_sub(prev));
                    last_counter.insert(key, counter);
                }
                None => {
                    last_counter.insert(key, counter);
                }
            }
        }
        if nr_skipped > 0 {
            tracing::debug!(nr_skipped, "skipped malformed port counter samples");
        }

        // Group the per-port delta sequences by switch, in id order for
        // deterministic output.
        let mut by_switch: FxHashMap<SwitchId, Vec<Vec<u64>>> = FxHashMap::default();
        let mut keys = deltas.keys().copied().collect::<Vec<_>>();
        keys.sort();
        for key in keys {
            let series = deltas.remove(&key).unwrap();
            by_switch.entry(key.0).or_default().push(series);
        }
        let mut switches = by_switch.keys().copied().collect::<Vec<_>>();
        switches.sort();

        let mut imbalance_pct = Vec::new();
        for switch in switches {
            let ports = &by_switch[&switch];
            // Align ports into synchronized per-interval vectors. A port
            // that missed the tail of the window has fewer deltas; the
            // trailing unmatched intervals are dropped.
            let nr_intervals = ports.iter().map(|p| p.len()).min().unwrap_or(0);
            for i in 0..nr_intervals {
                let vec = ports.iter().map(|p| p[i] as f64).collect::<Vec<_>>();
                let mean = vec.iter().sum::<f64>() / vec.len() as f64;
                if mean == 0.0 {
                    continue;
                }
                let max = vec.iter().cloned().fold(f64::MIN, f64::max);
                let min = vec.iter().cloned().fold(f64::MAX, f64::min);
                imbalance_pct.push((max - min) / mean * 100.0);
            }
        }
        Ok(UplinkReport {
            imbalance_pct,
            nr_skipped,
        })
    }
}

/// Per-interval, per-switch throughput-imbalance percentages.
#[derive(Debug, Clone)]
pub struct UplinkReport {
    imbalance_pct: Vec<f64>,
    nr_skipped: usize,
}

impl UplinkReport {
    /// The imbalance percentages across all switches and intervals.
    pub fn imbalance_pct(&self) -> &[f64] {
        &self.imbalance_pct
    }

    /// The number of malformed input lines that were skipped.
    pub fn nr_skipped(&self) -> usize {
        self.nr_skipped
    }

    /// The empirical CDF of the imbalance percentages.
    pub fn cdf(&self) -> Result<Cdf, CdfError> {
        Cdf::from_values(&self.imbalance_pct)
    }
}

/// Uplink analysis error.
#[derive(Debug, thiserror::Error)]
pub enum UplinkError {
    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
