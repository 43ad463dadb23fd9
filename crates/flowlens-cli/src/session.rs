//! Per-run analysis sessions: path wiring between the simulation output
//! tree and the reduction engine. Runs are independent, so multiple trace
//! ids are processed in parallel.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use flowlens_core::cdf::CdfError;
use flowlens_core::fct::{FctAnalysis, FctError, MetricKind, SizeClass};
use flowlens_core::queue::{EntityCount, QueueAnalysis, QueueError, QueueSeries};
use flowlens_core::uplink::{UplinkAnalysis, UplinkError};
use flowlens_core::{AnalysisProfile, Bytes, Nanosecs, TimeWindow};

use crate::{CommonArgs, FctArgs, QueueArgs, UplinkArgs};

pub(crate) fn run_fct(args: &FctArgs) -> Result<(), Error> {
    let one_bdp = resolve_bdp(args)?;
    args.common
        .id
        .par_iter()
        .try_for_each(|&id| run_one_fct(args, id, one_bdp))
}

pub(crate) fn run_queue(args: &QueueArgs) -> Result<(), Error> {
    args.common
        .id
        .par_iter()
        .try_for_each(|&id| run_one_queue(args, id))
}

pub(crate) fn run_uplink(args: &UplinkArgs) -> Result<(), Error> {
    args.common
        .id
        .par_iter()
        .try_for_each(|&id| run_one_uplink(args, id))
}

fn run_one_fct(args: &FctArgs, id: u64, one_bdp: Bytes) -> Result<(), Error> {
    let out_dir = output_dir(&args.common, id);
    let input = out_dir.join(format!("{id}_out_fct.txt"));
    let reader = open_input(&input)?;
    let analysis = FctAnalysis::builder()
        .window(window(&args.common))
        .one_bdp(one_bdp)
        .step_pct(args.step as usize)
        .build();
    let report = analysis.run(reader)?;
    tracing::info!(
        id,
        nr_flows = report.metrics(MetricKind::Slowdown).len(),
        nr_skipped = report.nr_skipped(),
        "flow records filtered"
    );

    fs::write(
        out_dir.join(format!("{id}_out_fct_summary.txt")),
        report.render_summary()?,
    )?;
    let classes = [
        (SizeClass::All, "all"),
        (SizeClass::Small, "small"),
        (SizeClass::Large, "large"),
    ];
    let metrics = [
        (MetricKind::Slowdown, "slowdown"),
        (MetricKind::Absolute, "absolute"),
    ];
    for (class, class_name) in classes {
        for (kind, metric_name) in metrics {
            let cdf = report.cdf(kind, class)?;
            let path = out_dir.join(format!("{id}_out_fct_{class_name}_{metric_name}_cdf.txt"));
            fs::write(path, cdf.to_string())?;
        }
    }
    Ok(())
}

fn run_one_queue(args: &QueueArgs, id: u64) -> Result<(), Error> {
    let out_dir = output_dir(&args.common, id);
    let (input, entities, cdf_series) = if args.per_dst {
        (
            out_dir.join(format!("{id}_out_voq_per_dst.txt")),
            EntityCount::Fixed(host_count(&out_dir)?),
            QueueSeries::QueueDepth,
        )
    } else {
        (
            out_dir.join(format!("{id}_out_voq.txt")),
            EntityCount::FromLog,
            QueueSeries::PacketCount,
        )
    };
    let reader = open_input(&input)?;
    let analysis = QueueAnalysis::builder()
        .window(window(&args.common))
        .monitoring_interval(Nanosecs::new(args.monitoring_interval))
        .entities(entities)
        .build();
    let report = analysis.run(reader)?;
    tracing::info!(
        id,
        nr_entities = report.nr_entities(),
        expected = report.expected_sample_count(),
        nr_skipped = report.nr_skipped(),
        "queue series reconstructed"
    );
    tracing::info!(id, "queue depth stats: {}", report.stats(QueueSeries::QueueDepth)?);
    tracing::info!(id, "packet count stats: {}", report.stats(QueueSeries::PacketCount)?);

    let cdf = report.cdf(cdf_series)?;
    let cdf_path = input.with_file_name(format!(
        "{}_cdf.txt",
        input.file_stem().and_then(|s| s.to_str()).unwrap_or("voq")
    ));
    fs::write(cdf_path, cdf.to_string())?;
    Ok(())
}

fn run_one_uplink(args: &UplinkArgs, id: u64) -> Result<(), Error> {
    let out_dir = output_dir(&args.common, id);
    let input = out_dir.join(format!("{id}_out_uplink.txt"));
    let reader = open_input(&input)?;
    let analysis = UplinkAnalysis::builder()
        .window(window(&args.common))
        .time_interval(Nanosecs::new(args.time_interval))
        .build();
    let report = analysis.run(reader)?;
    tracing::info!(
        id,
        nr_intervals = report.imbalance_pct().len(),
        nr_skipped = report.nr_skipped(),
        "uplink imbalance computed"
    );
    let cdf = report.cdf()?;
    fs::write(
        out_dir.join(format!("{id}_out_uplink_cdf.txt")),
        cdf.to_string(),
    )?;
    Ok(())
}

fn window(common: &CommonArgs) -> TimeWindow {
    TimeWindow::new(
        Nanosecs::new(common.window_start),
        Nanosecs::new(common.window_end),
    )
}

fn output_dir(common: &CommonArgs, id: u64) -> PathBuf {
    common
        .dir
        .join(&common.fdir)
        .join("output")
        .join(id.to_string())
}

fn open_input(path: &Path) -> Result<BufReader<File>, Error> {
    if !path.is_file() {
        return Err(Error::MissingInputFile(path.to_path_buf()));
    }
    Ok(BufReader::new(File::open(path)?))
}

fn resolve_bdp(args: &FctArgs) -> Result<Bytes, Error> {
    if let Some(bdp) = args.bdp {
        return Ok(Bytes::new(bdp));
    }
    let topo = args.topo.as_deref().ok_or(Error::NoBdpThreshold)?;
    let profile = match &args.profile {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => AnalysisProfile::default(),
    };
    profile
        .bdp_for_topology(topo)
        .ok_or_else(|| Error::UnknownTopology(topo.to_string()))
}

/// Derives the host count from the run's topology reference: the run config
/// names the topology file, whose first line is
/// `<total nodes> <switch nodes> <links>`.
fn host_count(out_dir: &Path) -> Result<usize, Error> {
    let config_path = out_dir.join("config.txt");
    let config = fs::read_to_string(&config_path)
        .map_err(|_| Error::MissingTopologyReference(config_path.clone()))?;
    let topology_path = config
        .lines()
        .find(|line| line.contains("TOPOLOGY_FILE"))
        .and_then(|line| line.split_whitespace().last())
        .map(PathBuf::from)
        .ok_or_else(|| Error::MissingTopologyReference(config_path.clone()))?;
    let topology = fs::read_to_string(&topology_path)
        .map_err(|_| Error::MissingTopologyReference(topology_path.clone()))?;
    let parse = || -> Option<usize> {
        let mut fields = topology.lines().next()?.split_whitespace();
        let total: usize = fields.next()?.parse().ok()?;
        let switches: usize = fields.next()?.parse().ok()?;
        total.checked_sub(switches)
    };
    parse().ok_or(Error::MissingTopologyReference(topology_path))
}

/// Fatal tool-boundary errors. These abort the analysis of the offending
/// run; nothing is retried since inputs are static files.
#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("missing input file: {0}")]
    MissingInputFile(PathBuf),

    #[error("missing or unreadable topology reference: {0}")]
    MissingTopologyReference(PathBuf),

    #[error("no BDP mapping for topology `{0}` in the analysis profile")]
    UnknownTopology(String),

    #[error("either --bdp or --topo is required")]
    NoBdpThreshold,

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Fct(#[from] FctError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Uplink(#[from] UplinkError),

    #[error(transparent)]
    Cdf(#[from] CdfError),

    #[error(transparent)]
    Stat(#[from] flowlens_core::stats::StatError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(dir: &Path, id: u64) -> CommonArgs {
        CommonArgs {
            id: vec![id],
            dir: dir.to_path_buf(),
            fdir: "mix".to_string(),
            window_start: 2_000_000_000,
            window_end: 3_000_000_000,
        }
    }

    fn write_run_file(dir: &Path, id: u64, name: &str, contents: &str) -> PathBuf {
        let out_dir = dir.join("mix").join("output").join(id.to_string());
        fs::create_dir_all(&out_dir).unwrap();
        let path = out_dir.join(name);
        fs::write(&path, contents).unwrap();
        out_dir
    }

    #[test]
    fn fct_session_writes_summary_and_cdfs() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let log = "\
            0 1 10000 100 100 2000000100 10000 10000\n\
            0 1 10000 100 200 2000000100 20000 20000\n\
            0 1 10000 100 2000 2000000100 40000 20000\n\
            0 1 10000 100 4000 2000000100 80000 20000\n";
        let out_dir = write_run_file(tmp.path(), 7, "7_out_fct.txt", log);
        let args = FctArgs {
            common: common(tmp.path(), 7),
            bdp: Some(1_000),
            topo: None,
            profile: None,
            step: 50,
        };
        run_fct(&args)?;
        assert!(out_dir.join("7_out_fct_summary.txt").is_file());
        for class in ["all", "small", "large"] {
            for metric in ["slowdown", "absolute"] {
                assert!(out_dir
                    .join(format!("7_out_fct_{class}_{metric}_cdf.txt"))
                    .is_file());
            }
        }
        Ok(())
    }

    #[test]
    fn missing_input_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let args = UplinkArgs {
            common: common(tmp.path(), 9),
            time_interval: 100_000,
        };
        assert!(matches!(
            run_uplink(&args),
            Err(Error::MissingInputFile(_))
        ));
    }

    #[test]
    fn per_dst_queue_needs_topology_reference() {
        let tmp = tempfile::tempdir().unwrap();
        write_run_file(tmp.path(), 3, "3_out_voq_per_dst.txt", "2000000100,0,1,1\n");
        let args = QueueArgs {
            common: common(tmp.path(), 3),
            monitoring_interval: 10_000,
            per_dst: true,
        };
        assert!(matches!(
            run_queue(&args),
            Err(Error::MissingTopologyReference(_))
        ));
    }

    #[test]
    fn per_switch_queue_writes_cdf() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let log = "2000000100,0,1,10\n2000010100,0,2,20\n";
        let out_dir = write_run_file(tmp.path(), 4, "4_out_voq.txt", log);
        let args = QueueArgs {
            common: common(tmp.path(), 4),
            monitoring_interval: 10_000,
            per_dst: false,
        };
        run_queue(&args)?;
        assert!(out_dir.join("4_out_voq_cdf.txt").is_file());
        Ok(())
    }
}
