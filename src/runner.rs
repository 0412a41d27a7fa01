//! One end-to-end scrape run.
//!
//! ```text
//! ENSURE_DIR → LOAD_STORE → SCRAPE → RECORD → PERSIST → REPORT
//! ```
//!
//! Directory and store failures abort the run. Scraping never does: a run
//! where every section failed still completes, it just records nothing.

use crate::config::Config;
use crate::error::RunError;
use crate::models::HeadlineRecord;
use crate::outputs::event_log::EventLog;
use crate::outputs::tree;
use crate::scrapers::{scrape_sections, Fetcher};
use crate::utils::{ensure_writable_dir, truncate_for_log};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub date: NaiveDate,
    pub headlines: HeadlineRecord,
    /// Whether `date` was written to the store this run.
    pub recorded: bool,
    pub store_path: PathBuf,
    /// Number of dates held by the store after the run.
    pub days_stored: usize,
}

/// Scrape the configured sections and record them under `today`.
#[instrument(level = "info", skip_all, fields(%today))]
pub async fn run<F: Fetcher>(
    config: &Config,
    fetcher: &F,
    today: NaiveDate,
) -> Result<RunReport, RunError> {
    info!(path = %config.data_dir.display(), "Creating data directory if it does not exist");
    ensure_writable_dir(&config.data_dir)
        .await
        .map_err(|source| RunError::Directory {
            path: config.data_dir.clone(),
            source,
        })?;

    let store_path = config.store_path();
    info!(path = %store_path.display(), "Loading headline history");
    let mut log = EventLog::load(&store_path)?;

    info!(sections = ?config.sections, "Starting scrape");
    let headlines = scrape_sections(fetcher, &config.sections).await;
    for (section, headline) in headlines.iter() {
        info!(section, headline, "Headline");
    }

    let earlier_today = log.get(today).map(str::to_owned);
    let recorded = log.record_headlines(today, &headlines)?;
    if recorded {
        if let Some(previous) = earlier_today {
            info!(previous = %truncate_for_log(&previous, 512), "Replacing earlier entry for today");
        }
        log.persist(&store_path)?;
        info!(path = %store_path.display(), "Saved headline history");
    } else {
        warn!("No headlines scraped; history left unchanged");
    }

    report(config, &log, today, &store_path);

    info!(
        recorded,
        days = log.len(),
        earlier_days = log.entries_before(today).count(),
        latest = ?log.latest().map(|(date, _)| date),
        "Scrape complete"
    );
    Ok(RunReport {
        date: today,
        headlines,
        recorded,
        store_path,
        days_stored: log.len(),
    })
}

/// Log the working tree, the store contents and what is held for `today`.
/// Never fails the run.
fn report(config: &Config, log: &EventLog, today: NaiveDate, store_path: &Path) {
    if let Err(e) = tree::log_tree(&config.tree_root) {
        warn!(root = %config.tree_root.display(), error = %e, "Failed to print working tree");
    }

    info!(path = %store_path.display(), "Printing contents of data file");
    match fs::read_to_string(store_path) {
        Ok(contents) => info!("{}", truncate_for_log(&contents, 4096)),
        Err(e) => warn!(path = %store_path.display(), error = %e, "Failed to read data file"),
    }
    for (date, payload) in log.iter() {
        debug!(%date, payload = %truncate_for_log(payload, 256), "Stored day");
    }

    match log.headlines(today) {
        Some(Ok(stored)) => {
            for section in &config.sections {
                match stored.get(*section) {
                    Some(headline) => info!(%section, headline, "Stored headline for today"),
                    None => info!(%section, "No stored headline for today"),
                }
            }
        }
        Some(Err(e)) => warn!(%today, error = %e, "Stored entry for today does not decode"),
        None => info!(%today, "Nothing stored for today"),
    }
}
