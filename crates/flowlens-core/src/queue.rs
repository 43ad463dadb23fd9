//! Queue occupancy reconstruction.
//!
//! Queue logs are sparse: a monitored entity (switch or destination host)
//! only emits a record when its state is sampled, and empty intervals are
//! not re-emitted. Reconstruction therefore zero-fills the series up to the
//! number of samples the monitoring cadence would have produced over the
//! window.

use std::io::BufRead;

use rustc_hash::FxHashSet;

use crate::cdf::{Cdf, CdfError};
use crate::records;
use crate::stats::{StatError, SummaryStats};
use crate::units::{Nanosecs, TimeWindow};

/// How many entities the monitoring cadence covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCount {
    /// Count distinct switch ids appearing anywhere in the log.
    FromLog,
    /// A caller-supplied entity count (e.g. the host count taken from the
    /// topology reference for per-destination logs).
    Fixed(usize),
}

/// The two series carried by every queue log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSeries {
    /// VOQs present per sampling instant.
    QueueDepth,
    /// Queued packets per sampling instant.
    PacketCount,
}

/// A queue occupancy reconstruction pass.
#[derive(Debug, Clone, Copy, typed_builder::TypedBuilder)]
pub struct QueueAnalysis {
    /// The analysis time window.
    pub window: TimeWindow,
    /// The fixed monitoring interval of the simulation.
    pub monitoring_interval: Nanosecs,
    /// Entity count policy.
    #[builder(default = EntityCount::FromLog)]
    pub entities: EntityCount,
}

impl QueueAnalysis {
    /// Reads the sparse queue log and reconstructs fixed-cardinality
    /// queue-depth and packet-count series, zero-filling absent intervals.
    ///
    /// Fails with [`QueueError::NoEntitiesDetected`] when the entity count
    /// resolves to zero.
    pub fn run(&self, input: impl BufRead) -> Result<QueueReport, QueueError> {
        let mut samples = Vec::new();
        let mut nr_skipped = 0;
        for line in input.lines() {
            let line = line?;
            match records::parse_queue_sample(&line) {
                Ok(sample) => samples.push(sample),
                Err(_) => nr_skipped += 1,
            }
        }
        // Entities are counted over the whole log, not just the window:
        // a switch whose queues drained before the window opened still
        // contributes zero-valued intervals.
        let nr_entities = match self.entities {
            EntityCount::FromLog => samples
                .iter()
                .map(|s| s.switch)
                .collect::<FxHashSet<_>>()
                .len(),
            EntityCount::Fixed(n) => n,
        };
        if nr_entities == 0 {
            return Err(QueueError::NoEntitiesDetected);
        }
        if nr_skipped > 0 {
            tracing::debug!(nr_skipped, "skipped malformed queue samples");
        }
        let expected = self
            .window
            .duration()
            .intervals(self.monitoring_interval) as usize
            * nr_entities;
        let mut queue_depth = Vec::new();
        let mut packet_count = Vec::new();
        for sample in samples {
            if !self.window.contains(sample.timestamp) {
                continue;
            }
            queue_depth.push(sample.queue_depth as f64);
            packet_count.push(sample.packet_count as f64);
        }
        if queue_depth.len() < expected {
            queue_depth.resize(expected, 0.0);
            packet_count.resize(expected, 0.0);
        }
        Ok(QueueReport {
            queue_depth,
            packet_count,
            nr_entities,
            expected,
            nr_skipped,
        })
    }
}

/// Reconstructed queue occupancy series and their summaries.
#[derive(Debug, Clone)]
pub struct QueueReport {
    queue_depth: Vec<f64>,
    packet_count: Vec<f64>,
    nr_entities: usize,
    expected: usize,
    nr_skipped: usize,
}

impl QueueReport {
    /// The reconstructed (zero-padded) series.
    pub fn series(&self, series: QueueSeries) -> &[f64] {
        match series {
            QueueSeries::QueueDepth => &self.queue_depth,
            QueueSeries::PacketCount => &self.packet_count,
        }
    }

    /// The number of monitored entities.
    pub fn nr_entities(&self) -> usize {
        self.nr_entities
    }

    /// The sample count the monitoring cadence would have produced.
    pub fn expected_sample_count(&self) -> usize {
        self.expected
    }

    /// The number of malformed input lines that were skipped.
    pub fn nr_skipped(&self) -> usize {
        self.nr_skipped
    }

    /// Summary statistics over one reconstructed series.
    pub fn stats(&self, series: QueueSeries) -> Result<SummaryStats, StatError> {
        SummaryStats::from_values(self.series(series))
    }

    /// The empirical CDF of one reconstructed series.
    pub fn cdf(&self, series: QueueSeries) -> Result<Cdf, CdfError> {
        Cdf::from_values(self.series(series))
    }
}

/// Queue reconstruction error.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The log contains no recognizable entity, or the supplied entity
    /// count was zero.
    #[error("no entities detected in the queue log")]
    NoEntitiesDetected,

    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn analysis() -> QueueAnalysis {
        QueueAnalysis::builder()
            .window(TimeWindow::new(
                Nanosecs::new(2_000_000_000),
                Nanosecs::new(2_000_100_000),
            ))
            .monitoring_interval(Nanosecs::new(10_000))
            .build()
    }

    #[test]
    fn series_are_padded_to_expected_count() -> anyhow::Result<()> {
        let report = analysis().run(testing::queue_log().as_bytes())?;
        // 10 intervals x 2 switches; 3 samples fall inside the window.
        assert_eq!(report.nr_entities(), 2);
        assert_eq!(report.expected_sample_count(), 20);
        let depths = report.series(QueueSeries::QueueDepth);
        assert_eq!(depths.len(), 20);
        assert_eq!(&depths[..3], &[2.0, 3.0, 1.0]);
        assert!(depths[3..].iter().all(|&x| x == 0.0));
        assert_eq!(report.series(QueueSeries::PacketCount).len(), 20);
        assert_eq!(report.nr_skipped(), 1);
        Ok(())
    }

    #[test]
    fn stats_cover_the_padded_series() -> anyhow::Result<()> {
        let report = analysis().run(testing::queue_log().as_bytes())?;
        let stats = report.stats(QueueSeries::QueueDepth)?;
        assert_eq!(stats.mean, 6.0 / 20.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.p50, 0.0);
        Ok(())
    }

    #[test]
    fn empty_log_has_no_entities() {
        assert!(matches!(
            analysis().run("".as_bytes()),
            Err(QueueError::NoEntitiesDetected)
        ));
    }

    #[test]
    fn fixed_entity_count_of_zero_fails() {
        let analysis = QueueAnalysis::builder()
            .window(testing::window())
            .monitoring_interval(Nanosecs::new(10_000))
            .entities(EntityCount::Fixed(0))
            .build();
        assert!(matches!(
            analysis.run(testing::queue_log().as_bytes()),
            Err(QueueError::NoEntitiesDetected)
        ));
    }

    #[test]
    fn surplus_samples_are_not_truncated() -> anyhow::Result<()> {
        // One switch, one interval expected, but two in-window samples.
        let analysis = QueueAnalysis::builder()
            .window(TimeWindow::new(
                Nanosecs::new(2_000_000_000),
                Nanosecs::new(2_000_010_000),
            ))
            .monitoring_interval(Nanosecs::new(10_000))
            .build();
        let log = "2000000000,0,1,1\n2000010000,0,2,2\n";
        let report = analysis.run(log.as_bytes())?;
        assert_eq!(report.expected_sample_count(), 1);
        assert_eq!(report.series(QueueSeries::QueueDepth).len(), 2);
        Ok(())
    }

    #[test]
    fn cdf_includes_zero_padding() -> anyhow::Result<()> {
        let report = analysis().run(testing::queue_log().as_bytes())?;
        let cdf = report.cdf(QueueSeries::PacketCount)?;
        let first = cdf.points().next().unwrap();
        assert_eq!(first.value, 0.0);
        assert_eq!(first.count, 17);
        assert_eq!(cdf.nr_samples(), 20);
        Ok(())
    }
}
