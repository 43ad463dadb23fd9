//! Nearest-rank percentile lookup and summary statistics.
//!
//! All percentile reporting in this crate uses the nearest-rank, round-down
//! convention: the sample at index `⌊n·p⌋` of the ascending-sorted sample
//! set, with no interpolation.

/// Returns the nearest-rank percentile of an ascending-sorted sample set.
///
/// PRECONDITION: `sorted` is sorted ascending and `p` is in `[0, 1)`.
pub fn percentile(sorted: &[f64], p: f64) -> Result<f64, StatError> {
    if sorted.is_empty() {
        return Err(StatError::EmptySampleSet);
    }
    let idx = (sorted.len() as f64 * p) as usize;
    Ok(sorted[idx.min(sorted.len() - 1)])
}

/// Returns the arithmetic mean of a sample set.
pub fn mean(samples: &[f64]) -> Result<f64, StatError> {
    if samples.is_empty() {
        return Err(StatError::EmptySampleSet);
    }
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// The (mean, p50, p95, p99, p99.9, p99.99, max) tuple reported for every
/// reconstructed sample stream.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
    pub p9999: f64,
    pub max: f64,
}

impl SummaryStats {
    /// Computes summary statistics over an unsorted sample set.
    pub fn from_values(values: &[f64]) -> Result<Self, StatError> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Self::from_sorted(&sorted)
    }

    /// Computes summary statistics over an ascending-sorted sample set.
    pub fn from_sorted(sorted: &[f64]) -> Result<Self, StatError> {
        Ok(Self {
            mean: mean(sorted)?,
            p50: percentile(sorted, 0.5)?,
            p95: percentile(sorted, 0.95)?,
            p99: percentile(sorted, 0.99)?,
            p999: percentile(sorted, 0.999)?,
            p9999: percentile(sorted, 0.9999)?,
            max: sorted[sorted.len() - 1],
        })
    }
}

impl std::fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.3}, {}, {}, {}, {}, {}, {})",
            self.mean, self.p50, self.p95, self.p99, self.p999, self.p9999, self.max
        )
    }
}

/// Statistics error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StatError {
    /// A percentile or mean was requested over zero samples.
    #[error("empty sample set")]
    EmptySampleSet,
}
