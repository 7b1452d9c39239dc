//! node-stats - Distributional statistics over a tree store
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use node_stats::config::{CliArgs, RunConfig};
use node_stats::progress::{print_header, print_summary, ProgressReporter};
use node_stats::report::write_report;
use node_stats::tree::{self, FsTree};
use node_stats::walker::StatsCoordinator;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = RunConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.store_path.display().to_string(),
            &config.node_path,
            config.worker_count,
        );
    }

    // Open the store and find the start node before any thread is started
    let store = FsTree::open(&config.store_path).context("Failed to open store")?;
    let root = tree::resolve(store.root(), &config.node_path)?;

    let show_progress = config.show_progress;
    let mut coordinator = StatsCoordinator::new(config);
    if show_progress {
        let progress = ProgressReporter::new();
        progress.set_status("Walking tree...");
        coordinator = coordinator.with_progress(progress);
    }

    // Setup signal handler for graceful shutdown
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let report = coordinator.run(root).context("Statistics run failed")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_report(&mut out, &report.statistics).context("Failed to write report")?;
    out.flush().context("Failed to write report")?;

    if show_progress {
        let values_size = report
            .get(node_stats::walker::metrics::PROPERTY_VALUES_SIZE)
            .map(|s| s.sum)
            .unwrap_or_default();
        print_summary(&report.summary, values_size);
    }

    if report.summary.failed_nodes > 0 {
        info!(
            failed = report.summary.failed_nodes,
            "Run completed with unprocessed nodes"
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("node_stats=debug,warn")
    } else {
        EnvFilter::new("node_stats=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
