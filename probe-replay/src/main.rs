//! Probe Replay CLI Application
//!
//! Host-side driver for the probe-dispatch library. It:
//! - Loads an analysis module from a C dynamic library
//! - Registers factories for the hooks named in a TOML config
//! - Replays recorded instrumentation traces against them
//! - Prints a plain-text report

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod callbacks;
mod config;
mod ffi;
mod registry;
mod replay;
mod report;
mod trace;

use callbacks::NativeAnalysis;
use probe_dispatch::{AnalysisModule, Factory};
use replay::ReplayOptions;
use report::{Outcome, Report, TraceReport};

/// Probe Replay - Dispatch recorded instrumentation events to a native analysis
#[derive(Parser, Debug)]
#[command(name = "probe-replay")]
#[command(about = "Replay instrumentation traces against a native analysis library", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (probe.toml)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Path to JSON trace file(s) (can be repeated)
    #[arg(short, long, value_name = "FILE", required = true)]
    trace: Vec<PathBuf>,

    /// Number of traces replayed in parallel (above 1, the analysis library must be thread-safe)
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    jobs: usize,

    /// Log and count callback failures instead of aborting the trace
    #[arg(long)]
    keep_going: bool,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Probe Replay CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using dispatch library v{}", probe_dispatch::VERSION);

    log::info!("Loading configuration from: {:?}", args.config);
    let config = config::load_config(&args.config)?;

    let analysis = Arc::new(NativeAnalysis::load(
        &config.analysis.library,
        config.analysis.name.as_deref(),
    )?);
    let factories = registry::build_factories(&config, analysis.clone(), |hook| {
        analysis.resolve(hook)
    })
    .context("Failed to register analysis hooks")?;

    let options = ReplayOptions {
        keep_going: args.keep_going,
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.max(1))
        .build()
        .context("Failed to build replay thread pool")?;

    let traces: Vec<TraceReport> = pool.install(|| {
        args.trace
            .par_iter()
            .map(|path| TraceReport {
                path: path.clone(),
                outcome: replay_file(path, &factories, &options),
            })
            .collect()
    });

    let report = Report::new(analysis.name(), traces);
    let text = report.render_txt();
    match &args.output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", text),
    }

    let failed = report.failed_traces();
    if failed > 0 {
        bail!("{} of {} traces failed", failed, report.traces.len());
    }
    Ok(())
}

fn replay_file(path: &Path, factories: &[Factory], options: &ReplayOptions) -> Outcome {
    log::info!("Replaying trace: {:?}", path);
    let stats = trace::load_trace(path).and_then(|trace| {
        replay::replay(&trace, factories, options).map_err(anyhow::Error::from)
    });
    match stats {
        Ok(stats) => {
            log::info!(
                "Trace {:?} done: {} events, {} failures",
                path,
                stats.before_events + stats.after_events,
                stats.failures
            );
            Outcome::Completed(stats)
        }
        Err(err) => {
            log::error!("Trace {:?} failed: {:#}", path, err);
            Outcome::Failed(format!("{:#}", err))
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
