//! Run configuration, resolved once from the command line and passed down.

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::Section;
use itertools::Itertools;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sections to scrape, in order, without duplicates.
    pub sections: Vec<Section>,
    pub data_dir: PathBuf,
    pub store_name: String,
    pub timeout: Duration,
    pub tree_root: PathBuf,
}

impl Config {
    /// `<data_dir>/<store_name>.json`
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.store_name))
    }
}

/// Parse a comma-separated section list.
///
/// Blank items are skipped and repeated sections keep their first position.
/// Any unknown name fails the whole list.
pub fn parse_sections(list: &str) -> Result<Vec<Section>, ConfigError> {
    let parsed = list
        .split(',')
        .filter(|item| !item.trim().is_empty())
        .map(str::parse::<Section>)
        .collect::<Result<Vec<_>, _>>()?;

    let total = parsed.len();
    let sections: Vec<Section> = parsed.into_iter().unique().collect();
    if sections.len() < total {
        warn!(
            dropped = total - sections.len(),
            "Duplicate sections in configuration ignored"
        );
    }
    if sections.is_empty() {
        return Err(ConfigError::NoSections);
    }
    Ok(sections)
}

impl TryFrom<&Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        if cli.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            sections: parse_sections(&cli.sections)?,
            data_dir: PathBuf::from(&cli.data_dir),
            store_name: cli.store_name.clone(),
            timeout: Duration::from_secs(cli.timeout_secs),
            tree_root: PathBuf::from(&cli.tree_root),
        })
    }
}
