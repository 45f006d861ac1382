//! `pictscan`: one-shot scan of a page list for the unsized-source picture pattern.
mod cli;
mod input;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use pictscan_engine::{RunOutcome, Scanner};
use pictscan_logging::{scan_info, scan_warn};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if !pictscan_logging::initialize(cli.log.into(), level) {
        eprintln!("Warning: logging could not be initialized");
    }

    let config = settings::load_config(&cli)?;
    let pages = input::load_pages(&cli.input)?;
    scan_info!("Loaded {} page records from {:?}", pages.len(), cli.input);

    let scanner = Scanner::with_defaults(config).context("failed to set up scanner")?;
    let outcome = scanner.run(pages, interrupt()).await?;
    match &outcome {
        RunOutcome::Completed { flush, .. } => {
            scan_info!(
                "Finished: {} matches, {} errors",
                flush.found_count,
                flush.error_count
            );
        }
        RunOutcome::Interrupted { cancelled, flush } => {
            scan_info!(
                "Interrupted: {} matches, {} errors ({} cancelled)",
                flush.found_count,
                flush.error_count,
                cancelled
            );
        }
    }
    if outcome.is_interrupted() {
        // Abandoned workers may still be inside a synchronous parse; do not
        // wait for runtime shutdown.
        log::Log::flush(log::logger());
        std::process::exit(0);
    }
    Ok(())
}

/// Resolves on Ctrl-C. If the listener cannot be installed the run simply
/// cannot be interrupted.
async fn interrupt() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        scan_warn!("Could not listen for interrupt: {}", err);
        std::future::pending::<()>().await;
    }
}
