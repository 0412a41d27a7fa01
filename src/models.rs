//! Data models for sections and the headlines scraped from them.
//!
//! - [`Section`]: the closed set of site sections that can be scraped
//! - [`ExtractionRule`]: how the representative headline is located in a page
//! - [`HeadlineRecord`]: one run's section → headline results

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

static STANDARD_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.standard-link").expect("static selector"));
static MEDIUM_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.medium-link").expect("static selector"));

/// A section of The Daily Pennsylvanian website.
///
/// Each variant carries its own source URL and [`ExtractionRule`], so a
/// section that parses successfully can always be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Opinion,
    Multimedia,
    Podcasts,
}

impl Section {
    /// Every known section, in canonical order.
    pub const ALL: [Section; 3] = [Section::Opinion, Section::Multimedia, Section::Podcasts];

    /// Canonical name, also used as the key in a [`HeadlineRecord`].
    pub fn name(self) -> &'static str {
        match self {
            Section::Opinion => "Opinion",
            Section::Multimedia => "Multimedia",
            Section::Podcasts => "Podcasts",
        }
    }

    /// The page the headline is scraped from.
    pub fn url(self) -> &'static str {
        match self {
            Section::Opinion => "https://www.thedp.com/section/opinion",
            Section::Multimedia => "https://www.thedp.com/multimedia",
            Section::Podcasts => "https://www.thedp.com/section/podcasts",
        }
    }

    /// The rule that picks the headline out of the section's page.
    pub fn rule(self) -> ExtractionRule {
        match self {
            Section::Opinion | Section::Podcasts => ExtractionRule::StandardLink,
            Section::Multimedia => ExtractionRule::MediumLink,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Section {
    type Err = ConfigError;

    /// Parse a section name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Section::ALL
            .into_iter()
            .find(|section| section.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownSection(wanted.to_string()))
    }
}

/// Where a section keeps its representative headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// First `<h3 class="standard-link">` on the page.
    StandardLink,
    /// First `<a class="medium-link">` on the page.
    MediumLink,
}

impl ExtractionRule {
    pub fn selector(self) -> &'static Selector {
        match self {
            ExtractionRule::StandardLink => &STANDARD_LINK,
            ExtractionRule::MediumLink => &MEDIUM_LINK,
        }
    }
}

/// Headlines gathered in a single run, keyed by section name.
///
/// Keys are kept sorted so the encoded payload does not depend on the order
/// sections were fetched in. Only non-empty headlines belong here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadlineRecord(BTreeMap<String, String>);

impl HeadlineRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, section: Section, headline: String) -> Option<String> {
        self.0.insert(section.name().to_string(), headline)
    }

    pub fn get(&self, section: Section) -> Option<&str> {
        self.0.get(section.name()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as the compact JSON string stored under a date in the event log.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a payload previously produced by [`HeadlineRecord::to_payload`].
    ///
    /// Section names are not validated, so payloads written for sections that
    /// are no longer configured still decode.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
