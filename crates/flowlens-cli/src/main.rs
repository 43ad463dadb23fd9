use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod session;

#[derive(Parser, Debug)]
#[command(name = "flowlens", about = "Reduce simulation telemetry logs to statistical summaries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flow-completion-time analysis: percentile summary and per-class CDFs.
    Fct(FctArgs),
    /// Queue occupancy analysis: reconstructed series statistics and CDFs.
    Queue(QueueArgs),
    /// Uplink throughput-imbalance analysis.
    Uplink(UplinkArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Trace identifiers of the runs to analyze.
    #[arg(short, long, required = true, num_args = 1..)]
    id: Vec<u64>,

    /// Base directory of the simulation tree.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Folder under the base directory holding the output tree.
    #[arg(long, default_value = "mix")]
    fdir: String,

    /// Only consider events after this time (ns).
    #[arg(long = "st", default_value_t = 2_005_000_000)]
    window_start: u64,

    /// Only consider events before this time (ns).
    #[arg(long = "ft", default_value_t = 100_000_000_000)]
    window_end: u64,
}

#[derive(Args, Debug, Clone)]
struct FctArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// One-BDP byte threshold of the topology.
    #[arg(long)]
    bdp: Option<u64>,

    /// Topology name, used to resolve the BDP threshold from the profile.
    #[arg(long)]
    topo: Option<String>,

    /// JSON analysis profile with mode tables and topology→BDP mappings.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Rank-bucket step percentage for the decile tables.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=100))]
    step: u64,
}

#[derive(Args, Debug, Clone)]
struct QueueArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Monitoring interval of the simulation (ns).
    #[arg(long = "mt", default_value_t = 10_000)]
    monitoring_interval: u64,

    /// Analyze the per-destination VOQ log instead of the per-switch log.
    #[arg(long)]
    per_dst: bool,
}

#[derive(Args, Debug, Clone)]
struct UplinkArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Counter coalescing interval (ns).
    #[arg(long, default_value_t = 100_000)]
    time_interval: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Fct(args) => session::run_fct(&args)?,
        Command::Queue(args) => session::run_queue(&args)?,
        Command::Uplink(args) => session::run_uplink(&args)?,
    }
    Ok(())
}
