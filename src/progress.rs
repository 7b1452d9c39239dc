//! Progress reporting for statistics runs
//!
//! Provides a live spinner while the run is in flight and a short summary
//! once it is done. Both go to stderr; stdout carries only the report.

use crate::walker::{RunProgress, RunSummary};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays run status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &RunProgress) {
        let msg = format!(
            "Discovered: {} | Processed: {} | Rate: {:.0}/s | Queue: {} | Workers: {}",
            format_number(progress.discovered),
            format_number(progress.processed),
            progress.nodes_per_second(),
            format_number(progress.queue_size as u64),
            progress.total_workers,
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print a summary of the run to stderr
pub fn print_summary(summary: &RunSummary, property_values_size: u64) {
    let secs = summary.duration.as_secs_f64();
    let rate = if secs > 0.0 {
        summary.nodes_processed as f64 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("{}", style("Run Complete").green().bold());
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!(
        "  {} {}",
        style("Nodes:").bold(),
        format_number(summary.nodes_discovered)
    );
    eprintln!(
        "  {} {}",
        style("Property values:").bold(),
        format_size(property_values_size, BINARY)
    );
    eprintln!(
        "  {} {:.1}s ({:.0} nodes/sec)",
        style("Duration:").bold(),
        secs,
        rate
    );
    if summary.failed_nodes > 0 {
        eprintln!(
            "  {} {}",
            style("Failed nodes:").yellow().bold(),
            format_number(summary.failed_nodes)
        );
    }
    if summary.backpressure_events > 0 {
        eprintln!(
            "  {} {}",
            style("Queue full:").bold(),
            format_number(summary.backpressure_events)
        );
    }
    eprintln!();
}

/// Print a header at the start of the run to stderr
pub fn print_header(store: &str, path: &str, workers: usize) {
    eprintln!();
    eprintln!(
        "{} {}",
        style("node-stats").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Store:").bold(), store);
    eprintln!("  {} {}", style("Path:").bold(), path);
    eprintln!("  {} {}", style("Workers:").bold(), workers);
    eprintln!();
}
