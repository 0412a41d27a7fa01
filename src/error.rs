//! Error types for every stage of a scrape run.
//!
//! Only [`FetchError`] is recoverable: the section orchestrator catches it and
//! drops the section. Everything else propagates to the runner and ends the
//! process with a non-zero exit status.

use crate::models::Section;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single section could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body-read failure.
    #[error("request for {section} failed: {source}")]
    Transport {
        section: Section,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("request for {section} returned HTTP {status}")]
    Status { section: Section, status: u16 },
}

/// Failures while loading or persisting the headline history.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store exists but is not a date → string JSON object. The file is
    /// left exactly as it was found.
    #[error("store {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write store {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Invalid startup configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown section {0:?} (expected one of Opinion, Multimedia, Podcasts)")]
    UnknownSection(String),

    #[error("no sections configured")]
    NoSections,

    #[error("fetch timeout must be at least one second")]
    ZeroTimeout,
}

/// Fatal errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data directory {} is unusable: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
