//! Flow-completion-time analysis: windowed filtering of raw flow records,
//! derived metric streams, and the percentile summary report.

use std::fmt::Write;
use std::io::BufRead;

use crate::bucket::{self, BucketError, DecileBucket, FlowMetric};
use crate::cdf::{Cdf, CdfError};
use crate::records;
use crate::stats::{self, StatError};
use crate::units::{Bytes, TimeWindow};

/// A derived per-flow metric stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Completion-time slowdown relative to the line-rate baseline.
    Slowdown,
    /// Absolute completion time, µs-scaled.
    Absolute,
}

/// A flow-size class relative to the one-BDP threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    /// All flows.
    All,
    /// Flows smaller than one BDP.
    Small,
    /// Flows of at least one BDP.
    Large,
}

/// A flow-completion-time analysis pass.
#[derive(Debug, Clone, Copy, typed_builder::TypedBuilder)]
pub struct FctAnalysis {
    /// The analysis time window.
    pub window: TimeWindow,
    /// The one-BDP byte threshold separating small from large flows.
    pub one_bdp: Bytes,
    /// The rank-bucket step percentage for the decile tables.
    #[builder(default = 5)]
    pub step_pct: usize,
}

impl FctAnalysis {
    /// Streams the flow-completion log, retaining flows that start after the
    /// window opens and complete before it closes, and derives the
    /// size-sorted slowdown and absolute-time streams.
    ///
    /// Malformed lines are skipped and counted. Fails with
    /// [`FctError::NoValidRecords`] if no record survives parsing and
    /// filtering.
    pub fn run(&self, input: impl BufRead) -> Result<FctReport, FctError> {
        let mut records = Vec::new();
        let mut nr_skipped = 0;
        for line in input.lines() {
            let line = line?;
            match records::parse_flow_record(&line) {
                Ok(record) => {
                    if record.start > self.window.start && record.end() < self.window.end {
                        records.push(record);
                    }
                }
                Err(_) => nr_skipped += 1,
            }
        }
        if records.is_empty() {
            return Err(FctError::NoValidRecords);
        }
        if nr_skipped > 0 {
            tracing::debug!(nr_skipped, "skipped malformed flow records");
        }
        // Stable sort keeps the input order of equal-sized flows, which
        // downstream bucketing relies on.
        records.sort_by_key(|r| r.size);
        let slowdown = records
            .iter()
            .map(|r| FlowMetric::new(r.slowdown(), r.size))
            .collect();
        let absolute = records
            .iter()
            .map(|r| FlowMetric::new(r.absolute_us(), r.size))
            .collect();
        Ok(FctReport {
            one_bdp: self.one_bdp,
            step_pct: self.step_pct,
            slowdown,
            absolute,
            nr_skipped,
        })
    }
}

/// The outcome of one flow-completion-time analysis pass: two size-sorted
/// derived metric streams plus the parameters needed to summarize them.
#[derive(Debug, Clone)]
pub struct FctReport {
    one_bdp: Bytes,
    step_pct: usize,
    slowdown: Vec<FlowMetric>,
    absolute: Vec<FlowMetric>,
    nr_skipped: usize,
}

impl FctReport {
    /// The size-sorted metric stream of the given kind.
    pub fn metrics(&self, kind: MetricKind) -> &[FlowMetric] {
        match kind {
            MetricKind::Slowdown => &self.slowdown,
            MetricKind::Absolute => &self.absolute,
        }
    }

    /// The number of malformed input lines that were skipped.
    pub fn nr_skipped(&self) -> usize {
        self.nr_skipped
    }

    /// The metric values of one size class, in stream order.
    pub fn class_values(&self, kind: MetricKind, class: SizeClass) -> Vec<f64> {
        self.metrics(kind)
            .iter()
            .filter(|m| match class {
                SizeClass::All => true,
                SizeClass::Small => m.size < self.one_bdp,
                SizeClass::Large => m.size >= self.one_bdp,
            })
            .map(|m| m.value)
            .collect()
    }

    /// Builds the empirical CDF of one (metric, size class) stream.
    pub fn cdf(&self, kind: MetricKind, class: SizeClass) -> Result<Cdf, CdfError> {
        Cdf::from_values(&self.class_values(kind, class))
    }

    /// Partitions the given metric stream into rank buckets.
    pub fn buckets(&self, kind: MetricKind) -> Result<Vec<DecileBucket>, BucketError> {
        bucket::bucketize(self.metrics(kind), self.step_pct)
    }

    /// Renders the percentile summary report: for each metric, the
    /// small/large class table followed by the per-decile table. The byte
    /// layout (section labels glued to the `#1BDP` line, padded header
    /// columns, no trailing newline after `#EOF`) is kept compatible with
    /// existing plot-script parsers of the summary file.
    pub fn render_summary(&self) -> Result<String, FctError> {
        let mut s = String::new();
        self.render_section(&mut s, MetricKind::Slowdown)?;
        self.render_section(&mut s, MetricKind::Absolute)?;
        s.push_str("#\n#EOF");
        Ok(s)
    }

    fn render_section(&self, s: &mut String, kind: MetricKind) -> Result<(), FctError> {
        let label = match kind {
            MetricKind::Slowdown => "SLOWDOWN",
            MetricKind::Absolute => "ABSOLUTE",
        };
        write!(s, "{label}").unwrap();
        writeln!(s, "#1BDP={}Bytes", self.one_bdp.into_u64()).unwrap();
        writeln!(
            s,
            "#{:5},{:5},{:5},{:6},{:6},{:6}",
            "Category", "Avg", "50%", "95%", "99%", "99.9%"
        )
        .unwrap();
        for (category, class) in [("<1BDP", SizeClass::Small), (">1BDP", SizeClass::Large)] {
            let mut values = self.class_values(kind, class);
            values.sort_by(|a, b| a.total_cmp(b));
            writeln!(
                s,
                "{:5},{:.3},{:.3},{:.3},{:.3},{:.3}",
                category,
                stats::mean(&values)?,
                stats::percentile(&values, 0.5)?,
                stats::percentile(&values, 0.95)?,
                stats::percentile(&values, 0.99)?,
                stats::percentile(&values, 0.999)?,
            )
            .unwrap();
        }
        s.push_str("#\n#\n#\n#\n#\n");
        match kind {
            MetricKind::Slowdown => writeln!(
                s,
                "#{:5} {:3}\t{:5} {:5} {:6} {:6} {:6}",
                "CDF", "Size", "Avg", "50%", "95%", "99%", "99.9%"
            )
            .unwrap(),
            MetricKind::Absolute => writeln!(
                s,
                "#{:5},{:6},{:6},{:6},{:7},{:7},{:7} >> scale: us-scale",
                "CDF", "Size", "Avg", "50%", "95%", "99%", "99.9%"
            )
            .unwrap(),
        }
        for bucket in self.buckets(kind)? {
            writeln!(
                s,
                "#{:.3} {:3}\t{:.3} {:.3} {:.3} {:.3} {:.3}",
                bucket.fraction,
                bucket.representative_size.into_u64(),
                bucket.avg,
                bucket.p50,
                bucket.p95,
                bucket.p99,
                bucket.p999,
            )
            .unwrap();
        }
        s.push_str("#\n#\n#\n#\n#\n");
        Ok(())
    }
}

/// Flow-completion-time analysis error.
#[derive(Debug, thiserror::Error)]
pub enum FctError {
    /// Every input line was malformed or filtered out.
    #[error("no valid flow records in the analysis window")]
    NoValidRecords,

    /// A class statistic could not be computed.
    #[error(transparent)]
    Stat(#[from] StatError),

    /// A decile table could not be computed.
    #[error(transparent)]
    Bucket(#[from] BucketError),

    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
