//! # DP Headlines
//!
//! Scrapes one representative headline from each configured section of
//! [The Daily Pennsylvanian](https://www.thedp.com) and appends the day's
//! results to a JSON history keyed by date.
//!
//! ## Usage
//!
//! ```sh
//! SECTIONS=Opinion,Multimedia dp_headlines --data-dir ./data
//! ```
//!
//! ## Architecture
//!
//! A run is a straight pipeline:
//! 1. **Setup**: create the data directory and load the existing history
//! 2. **Scraping**: fetch each section once, dropping failures and misses
//! 3. **Recording**: store the results under today's date and persist
//! 4. **Report**: log the working tree and the stored history
//!
//! Exit status is non-zero only when configuration, the data directory or
//! the history store fails; individual sections failing are only logged.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tfmt, EnvFilter, Layer};

mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod runner;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;
use scrapers::thedp::HttpFetcher;

/// Daily-rotated `scrape.log.<date>` files under `log_dir`.
///
/// Fails if `log_dir` cannot be created or opened.
fn open_log_file(log_dir: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("scrape.log")
        .build(log_dir)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn console_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tfmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tfmt::time::UtcTime::rfc_3339())
}

/// Console logging plus the rotated log file.
///
/// When the log file cannot be opened, console logging is still installed so
/// the failure itself gets logged. The returned guard flushes the file writer
/// when dropped.
fn init_tracing(log_dir: &str) -> Result<WorkerGuard, InitError> {
    match open_log_file(log_dir) {
        Ok(appender) => {
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(console_layer())
                .with(
                    tfmt::layer()
                        .with_ansi(false)
                        .with_writer(file_writer)
                        .with_timer(tfmt::time::UtcTime::rfc_3339()),
                )
                .init();
            Ok(guard)
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(console_layer())
                .init();
            Err(e)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    let _log_guard = match init_tracing(&args.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            error!(log_dir = %args.log_dir, error = %e, "Failed to open log file");
            return Err(e.into());
        }
    };

    let start_time = std::time::Instant::now();
    info!("dp_headlines starting up");
    debug!(?args, "Parsed CLI arguments");

    let config = match Config::try_from(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(sections = ?config.sections, store = %config.store_path().display(), "Configuration loaded");

    let fetcher = match HttpFetcher::new(config.timeout) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            return Err(e.into());
        }
    };

    let today = Local::now().date_naive();
    match runner::run(&config, &fetcher, today).await {
        Ok(report) => {
            let elapsed = start_time.elapsed();
            info!(
                date = %report.date,
                headlines = report.headlines.len(),
                recorded = report.recorded,
                days_stored = report.days_stored,
                ?elapsed,
                "Exiting"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            Err(e.into())
        }
    }
}
