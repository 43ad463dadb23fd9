//! Rank-based (equal-count) bucketing of size-sorted flow metrics.

use crate::stats::{self, StatError};
use crate::units::Bytes;

/// One (metric, size) observation of a derived flow stream.
#[derive(Debug, Clone, Copy, PartialEq, derive_new::new)]
pub struct FlowMetric {
    /// The derived metric value (slowdown or µs-scaled completion time).
    pub value: f64,
    /// The flow size the metric belongs to.
    pub size: Bytes,
}

/// Per-bucket statistics over an equal-count partition of size-sorted flow
/// metrics.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DecileBucket {
    /// The bucket's position in the partition.
    pub index: usize,
    /// The upper rank fraction of the bucket, e.g. 0.05 for the first bucket
    /// of a 5% step.
    pub fraction: f64,
    /// The size of the largest flow placed in the bucket.
    pub representative_size: Bytes,
    /// Arithmetic mean of the bucket's metric values.
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
}

/// Partitions size-ascending flow metrics into `⌈100 / step_pct⌉` equal-count
/// rank buckets and computes per-bucket statistics.
///
/// PRECONDITION: `metrics` is sorted ascending by size.
///
/// Bucket `k` holds the records with rank in
/// `[⌊k·S·n/100⌋, ⌊(k+1)·S·n/100⌋)`. When `n` is small relative to the bucket
/// count this leaves some bucket empty; that fails with
/// [`BucketError::BucketUnderflow`] instead of indexing out of bounds.
/// A step outside `1..=100` fails with [`BucketError::InvalidStep`].
pub fn bucketize(metrics: &[FlowMetric], step_pct: usize) -> Result<Vec<DecileBucket>, BucketError> {
    if step_pct == 0 || step_pct > 100 {
        return Err(BucketError::InvalidStep { step_pct });
    }
    let n = metrics.len();
    let nr_buckets = (100 + step_pct - 1) / step_pct;
    let mut buckets = Vec::with_capacity(nr_buckets);
    for k in 0..nr_buckets {
        let lo = k * step_pct * n / 100;
        let hi = ((k + 1) * step_pct).min(100) * n / 100;
        if lo >= hi {
            return Err(BucketError::BucketUnderflow {
                bucket: k,
                nr_records: n,
                nr_buckets,
            });
        }
        let slice = &metrics[lo..hi];
        let mut values = slice.iter().map(|m| m.value).collect::<Vec<_>>();
        values.sort_by(|a, b| a.total_cmp(b));
        buckets.push(DecileBucket {
            index: k,
            fraction: (k + 1) as f64 * step_pct as f64 / 100.0,
            representative_size: slice[slice.len() - 1].size,
            avg: stats::mean(&values)?,
            p50: stats::percentile(&values, 0.5)?,
            p95: stats::percentile(&values, 0.95)?,
            p99: stats::percentile(&values, 0.99)?,
            p999: stats::percentile(&values, 0.999)?,
        });
    }
    Ok(buckets)
}

/// Bucketing error.
#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    /// The step percentage is outside `1..=100`.
    #[error("invalid bucket step percentage {step_pct} (must be in 1..=100)")]
    InvalidStep {
        /// The rejected step percentage.
        step_pct: usize,
    },

    /// A rank bucket received no records.
    #[error("bucket {bucket} of {nr_buckets} is empty ({nr_records} records)")]
    BucketUnderflow {
        /// The empty bucket's index.
        bucket: usize,
        /// Total number of records.
        nr_records: usize,
        /// Requested number of buckets.
        nr_buckets: usize,
    },

    /// A bucket statistic could not be computed.
    #[error(transparent)]
    Stat(#[from] StatError),
}
