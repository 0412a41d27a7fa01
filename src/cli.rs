//! Command-line interface definitions for the headline scraper.
//!
//! Every option can also be supplied through the environment variable named
//! in its `env` attribute, so scheduled runs can be configured without flags.

use clap::Parser;

/// Command-line arguments for a scrape run.
///
/// # Examples
///
/// ```sh
/// # Scrape every section into ./data
/// dp_headlines
///
/// # Only two sections, history kept elsewhere
/// SECTIONS=Opinion,Podcasts dp_headlines --data-dir /var/lib/dp
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Comma-separated list of sections to scrape
    #[arg(long, env = "SECTIONS", default_value = "Opinion,Multimedia,Podcasts")]
    pub sections: String,

    /// Directory holding the headline history
    #[arg(short, long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: String,

    /// File name (without extension) of the headline history
    #[arg(long, env = "STORE_NAME", default_value = "daily_pennsylvanian_headlines")]
    pub store_name: String,

    /// Directory for the daily-rotated scrape.log files
    #[arg(short, long, env = "LOG_DIR", default_value = ".")]
    pub log_dir: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Directory whose tree is logged at the end of the run
    #[arg(long, env = "TREE_ROOT", default_value = ".")]
    pub tree_root: String,
}
