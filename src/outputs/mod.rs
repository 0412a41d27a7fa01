//! On-disk artefacts of a run.
//!
//! # Submodules
//!
//! - [`event_log`]: the date-keyed headline history, loaded at startup and
//!   persisted at the end of a run
//! - [`tree`]: diagnostic listing of the working tree for the log
//!
//! # Output Structure
//!
//! ```text
//! ./
//! ├── data/
//! │   └── daily_pennsylvanian_headlines.json
//! └── scrape.log.2024-01-02
//! ```

pub mod event_log;
pub mod tree;
