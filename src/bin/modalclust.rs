//! Modal association clustering from the command line.
//!
//! Usage:
//!   modalclust --input points.csv [--sigma 0.3] [--workers N] [--runtime]
//!
//! Reads headerless comma-separated points, clusters them, and prints the
//! result as JSON on stdout. Logging goes to stderr (`RUST_LOG`).

use clap::{Parser, ValueEnum};
use modalclust::cluster::{Aggregation, Distribution, Mac};
use modalclust::io::{load_csv, write_json};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Contiguous per-worker ranges.
    Static,
    /// Shared atomic cursor.
    Cursor,
    /// Producer thread feeding a bounded queue.
    Queue,
}

#[derive(Parser, Debug)]
#[command(name = "modalclust")]
#[command(about = "Cluster points by the density mode they converge to under mean shift")]
struct Args {
    /// Input file: one comma-separated point per line.
    #[arg(long)]
    input: PathBuf,

    /// Kernel bandwidth.
    #[arg(long, default_value_t = 0.3)]
    sigma: f64,

    /// Worker threads (0 = half the available cores).
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Print clustering wall-clock time after the JSON.
    #[arg(long)]
    runtime: bool,

    /// Distance under which two modes are the same cluster.
    #[arg(long, default_value_t = modalclust::DEFAULT_MODE_THRESHOLD)]
    mode_threshold: f64,

    /// Mean-shift stops once a step is shorter than this fraction of sigma.
    #[arg(long, default_value_t = modalclust::DEFAULT_CONVERGENCE_FACTOR)]
    convergence_factor: f64,

    /// Give up on a point after this many mean-shift iterations.
    #[arg(long)]
    max_iter: Option<usize>,

    /// How points are handed to workers.
    #[arg(long, value_enum, default_value_t = Strategy::Cursor)]
    strategy: Strategy,

    /// Queue capacity for `--strategy queue`.
    #[arg(long, default_value_t = 64)]
    queue_capacity: usize,

    /// Give each worker a private result and merge them at the end.
    #[arg(long)]
    per_worker: bool,

    /// Pretty-print the JSON.
    #[arg(long)]
    pretty: bool,
}

/// Translate command-line flags into a clusterer.
fn configure(args: &Args) -> Mac {
    let distribution = match args.strategy {
        Strategy::Static => Distribution::StaticShard,
        Strategy::Cursor => Distribution::SharedCursor,
        Strategy::Queue => Distribution::BoundedQueue {
            capacity: args.queue_capacity,
        },
    };
    let aggregation = if args.per_worker {
        Aggregation::PerWorker
    } else {
        Aggregation::Shared
    };

    let mut mac = Mac::new(args.sigma)
        .with_mode_threshold(args.mode_threshold)
        .with_convergence_factor(args.convergence_factor)
        .with_distribution(distribution)
        .with_aggregation(aggregation);
    if args.workers != 0 {
        mac = mac.with_parallelism(args.workers);
    }
    if let Some(max_iter) = args.max_iter {
        mac = mac.with_max_iter(max_iter);
    }
    mac
}

fn run<W: Write>(args: &Args, mut out: W) -> modalclust::Result<()> {
    let dataset = load_csv(&args.input)?;
    let mac = configure(args);

    let started = Instant::now();
    let result = mac.fit(&dataset)?;
    let elapsed = started.elapsed();

    write_json(&result, &mut out, args.pretty)?;
    writeln!(out)?;

    if args.runtime {
        writeln!(out, "execution time: {elapsed:?}")?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args, std::io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("modalclust: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modalclust::Error;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["modalclust"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn points_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0,0\n0.1,0.1\n0.05,-0.05\n10,10\n10.1,9.9").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults_map_to_builder_defaults() {
        let mac = configure(&parse(&["--input", "x.csv"]));
        assert_eq!(mac.sigma(), 0.3);
        assert_eq!(mac.mode_threshold(), modalclust::DEFAULT_MODE_THRESHOLD);
        assert_eq!(
            mac.seeker().convergence_factor(),
            modalclust::DEFAULT_CONVERGENCE_FACTOR
        );
        assert_eq!(mac.parallelism(), modalclust::cluster::default_parallelism());
        assert_eq!(mac.distribution(), Distribution::SharedCursor);
        assert_eq!(mac.aggregation(), Aggregation::Shared);
    }

    #[test]
    fn test_flags_map_to_builder() {
        let mac = configure(&parse(&[
            "--input",
            "x.csv",
            "--sigma",
            "0.5",
            "--workers",
            "3",
            "--mode-threshold",
            "0.2",
            "--convergence-factor",
            "0.001",
            "--strategy",
            "queue",
            "--queue-capacity",
            "7",
            "--per-worker",
        ]));
        assert_eq!(mac.sigma(), 0.5);
        assert_eq!(mac.parallelism(), 3);
        assert_eq!(mac.mode_threshold(), 0.2);
        assert_eq!(mac.seeker().convergence_factor(), 0.001);
        assert_eq!(mac.distribution(), Distribution::BoundedQueue { capacity: 7 });
        assert_eq!(mac.aggregation(), Aggregation::PerWorker);

        let mac = configure(&parse(&["--input", "x.csv", "--strategy", "static"]));
        assert_eq!(mac.distribution(), Distribution::StaticShard);
    }

    #[test]
    fn test_unknown_strategy_is_a_usage_error() {
        let argv = ["modalclust", "--input", "x.csv", "--strategy", "lifo"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_run_writes_json_and_runtime() -> modalclust::Result<()> {
        let file = points_file();
        let path = file.path().to_string_lossy().into_owned();
        let args = parse(&["--input", &path, "--sigma", "0.5", "--workers", "2", "--runtime"]);

        let mut out = Vec::new();
        run(&args, &mut out)?;
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        let value: serde_json::Value = serde_json::from_str(lines.next().unwrap())?;
        assert_eq!(value["count"], 2);
        assert!(lines.next().unwrap().starts_with("execution time: "));
        Ok(())
    }

    #[test]
    fn test_run_reports_errors() {
        let args = parse(&["--input", "/definitely/not/here.csv"]);
        assert!(matches!(run(&args, Vec::new()), Err(Error::Io(_))));

        let file = points_file();
        let path = file.path().to_string_lossy().into_owned();
        let args = parse(&["--input", &path, "--sigma=-1"]);
        assert!(matches!(
            run(&args, Vec::new()),
            Err(Error::InvalidBandwidth { .. })
        ));
    }
}
