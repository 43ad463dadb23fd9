//! Empirical CDF compaction.
//!
//! A [`Cdf`] compresses a multiset of samples into one point per distinct
//! value. Note the probability denominator: for `n` samples the cumulative
//! probability of the point ending at (0-indexed) rank `i` is `i / (n - 1)`,
//! not the conventional `(i + 1) / n`. The last point therefore reaches
//! exactly 1.0. Downstream plotting consumes files written with this
//! convention, so it is preserved as-is even though it looks like an
//! off-by-one relative to the textbook formula.

use std::io::Write;

use itertools::Itertools;

/// One point of an empirical CDF: a run of equal sample values.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CdfPoint {
    /// The sample value.
    pub value: f64,
    /// The number of samples with this value.
    pub count: u64,
    /// The number of samples seen up to and including this run.
    pub cumulative_count: u64,
    /// `rank_of_last_member / (n - 1)`, or 1.0 for a single-sample stream.
    pub cumulative_probability: f64,
}

/// An empirical CDF over a sample multiset, ordered by strictly increasing
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct Cdf {
    points: Vec<CdfPoint>,
    nr_samples: u64,
}

impl Cdf {
    /// Builds a CDF from an unsorted sample multiset.
    pub fn from_values(values: &[f64]) -> Result<Self, CdfError> {
        if values.is_empty() {
            return Err(CdfError::EmptySampleSet);
        }
        let nr_samples = values.len() as u64;
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let denom = (nr_samples - 1) as f64;
        let mut cumulative_count = 0;
        let points = sorted
            .into_iter()
            .dedup_by_with_count(|a, b| a == b)
            .map(|(count, value)| {
                let count = count as u64;
                cumulative_count += count;
                let cumulative_probability = if nr_samples == 1 {
                    1.0
                } else {
                    (cumulative_count - 1) as f64 / denom
                };
                CdfPoint {
                    value,
                    count,
                    cumulative_count,
                    cumulative_probability,
                }
            })
            .collect();
        Ok(Self { points, nr_samples })
    }

    /// Returns an iterator over the CDF's points.
    pub fn points(&self) -> impl Iterator<Item = &CdfPoint> {
        self.points.iter()
    }

    /// The total number of samples the CDF was built from.
    pub fn nr_samples(&self) -> u64 {
        self.nr_samples
    }

    /// Writes the CDF in its file format: one
    /// `value count cumulative_count cumulative_probability` line per point.
    pub fn write_to(&self, mut w: impl Write) -> std::io::Result<()> {
        write!(w, "{self}")
    }

    /// Parses a CDF back from its file format.
    pub fn parse(s: &str) -> Result<Self, CdfError> {
        let points = s
            .lines()
            .map(parse_cdf_point)
            .collect::<Result<Vec<_>, _>>()?;
        let nr_samples = match points.last() {
            Some(point) => point.cumulative_count,
            None => return Err(CdfError::EmptySampleSet),
        };
        Ok(Self { points, nr_samples })
    }
}

impl std::fmt::Display for Cdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for point in &self.points {
            writeln!(
                f,
                "{} {} {} {}",
                point.value, point.count, point.cumulative_count, point.cumulative_probability
            )?;
        }
        Ok(())
    }
}

fn parse_cdf_point(s: &str) -> Result<CdfPoint, CdfError> {
    const NR_CDF_FIELDS: usize = 4;
    let fields = s.split_whitespace().collect::<Vec<_>>();
    let nr_fields = fields.len();
    if nr_fields != NR_CDF_FIELDS {
        return Err(CdfError::WrongNrFields {
            expected: NR_CDF_FIELDS,
            got: nr_fields,
        });
    }
    Ok(CdfPoint {
        value: fields[0].parse()?,
        count: fields[1].parse()?,
        cumulative_count: fields[2].parse()?,
        cumulative_probability: fields[3].parse()?,
    })
}

/// CDF construction and parsing error.
#[derive(Debug, thiserror::Error)]
pub enum CdfError {
    /// A CDF was requested over zero samples.
    #[error("empty sample set")]
    EmptySampleSet,

    /// A CDF file line has the wrong number of fields.
    #[error("wrong number of fields (expected {expected}, got {got})")]
    WrongNrFields {
        /// Expected number of fields.
        expected: usize,
        /// Actual number of fields.
        got: usize,
    },

    /// Error parsing a count field.
    #[error("failed to parse count")]
    ParseInt(#[from] std::num::ParseIntError),

    /// Error parsing a value or probability field.
    #[error("failed to parse value")]
    ParseFloat(#[from] std::num::ParseFloatError),
}
