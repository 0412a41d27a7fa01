//! Headline scraping for the configured sections.
//!
//! Scraping is split in two:
//!
//! 1. **Fetching**: a [`Fetcher`] turns one [`Section`] into its headline text
//!    (or an empty string when the page has no matching element)
//! 2. **Orchestration**: [`scrape_sections`] walks the configured sections one
//!    at a time and keeps the non-empty results
//!
//! A failing section never affects the others; it is logged and left out of
//! the [`HeadlineRecord`].
//!
//! # Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | The Daily Pennsylvanian | [`thedp`] | HTML scraping |

use crate::error::FetchError;
use crate::models::{HeadlineRecord, Section};
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument, warn};

pub mod thedp;

/// Retrieves the headline for a single section.
pub trait Fetcher {
    /// Fetch `section`'s page and extract its headline.
    ///
    /// Returns an empty string when the page loaded but held no headline.
    async fn fetch(&self, section: Section) -> Result<String, FetchError>;
}

/// Scrape every section in order and collect the non-empty headlines.
///
/// Each section gets exactly one fetch attempt. Duplicated sections are
/// fetched again and simply overwrite their earlier result.
#[instrument(level = "info", skip_all, fields(sections = sections.len()))]
pub async fn scrape_sections<F: Fetcher>(fetcher: &F, sections: &[Section]) -> HeadlineRecord {
    let results: Vec<(Section, String)> = stream::iter(sections.iter().copied())
        .then(|section| async move {
            info!(%section, "Scraping section");
            match fetcher.fetch(section).await {
                Ok(headline) if headline.is_empty() => {
                    warn!(%section, "No headline found; skipping section");
                    None
                }
                Ok(headline) => Some((section, headline)),
                Err(e) => {
                    error!(%section, error = %e, "Failed to scrape section");
                    None
                }
            }
        })
        .filter_map(|opt| std::future::ready(opt))
        .collect()
        .await;

    let mut record = HeadlineRecord::new();
    for (section, headline) in results {
        record.insert(section, headline);
    }
    info!(
        attempted = sections.len(),
        scraped = record.len(),
        "Finished scraping sections"
    );
    record
}
