//! End-to-end reduction passes over raw log text, including the CDF file
//! round-trip.

use std::fs;

use flowlens_core::cdf::Cdf;
use flowlens_core::fct::{FctAnalysis, MetricKind, SizeClass};
use flowlens_core::{Bytes, Nanosecs, TimeWindow};

fn window() -> TimeWindow {
    TimeWindow::new(Nanosecs::new(2_000_000_000), Nanosecs::new(3_000_000_000))
}

#[test]
fn fct_pipeline_produces_consistent_cdfs() -> anyhow::Result<()> {
    let mut log = String::new();
    for i in 0..200u64 {
        // Sizes ascending, completion times growing with size.
        log.push_str(&format!(
            "0 1 10000 100 {} 2000000100 {} {}\n",
            (i + 1) * 500,
            (i + 1) * 1_000,
            1_000
        ));
    }
    let analysis = FctAnalysis::builder()
        .window(window())
        .one_bdp(Bytes::new(50_000))
        .step_pct(5)
        .build();
    let report = analysis.run(log.as_bytes())?;

    let buckets = report.buckets(MetricKind::Slowdown)?;
    assert_eq!(buckets.len(), 20);

    let all = report.cdf(MetricKind::Slowdown, SizeClass::All)?;
    let small = report.cdf(MetricKind::Slowdown, SizeClass::Small)?;
    let large = report.cdf(MetricKind::Slowdown, SizeClass::Large)?;
    assert_eq!(
        small.nr_samples() + large.nr_samples(),
        all.nr_samples()
    );
    assert_eq!(all.nr_samples(), 200);
    Ok(())
}

#[test]
fn cdf_file_round_trips_through_disk() -> anyhow::Result<()> {
    let values = vec![1.5, 2.0, 2.0, 3.25, 3.25, 3.25, 10.0];
    let cdf = Cdf::from_values(&values)?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("cdf.txt");
    let mut file = fs::File::create(&path)?;
    cdf.write_to(&mut file)?;

    let contents = fs::read_to_string(&path)?;
    let parsed = Cdf::parse(&contents)?;
    assert_eq!(parsed, cdf);
    Ok(())
}
