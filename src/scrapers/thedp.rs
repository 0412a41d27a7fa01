//! The Daily Pennsylvanian section scraper.
//!
//! Each section page lists its stories newest first, so the first element
//! matching the section's [`ExtractionRule`] is taken as its headline.

use crate::error::FetchError;
use crate::models::{ExtractionRule, Section};
use crate::scrapers::Fetcher;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Fetches section pages over HTTP with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    ///
    /// A timed out request surfaces as [`FetchError::Transport`].
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "info", skip(self), fields(url = section.url()))]
    async fn fetch(&self, section: Section) -> Result<String, FetchError> {
        let response = self
            .client
            .get(section.url())
            .send()
            .await
            .map_err(|source| FetchError::Transport { section, source })?;

        let status = response.status();
        info!(request_url = %response.url(), "Request URL");
        info!(status = status.as_u16(), "Request status code");

        if !status.is_success() {
            return Err(FetchError::Status {
                section,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport { section, source })?;
        debug!(bytes = body.len(), "Downloaded section page");

        let headline = extract_headline(&body, section.rule());
        info!(data_point = %headline, "Data point");
        Ok(headline)
    }
}

/// Pull the headline text out of a section page.
///
/// Text nodes of the first matching element are joined and whitespace is
/// collapsed to single spaces. Returns an empty string when nothing matches.
pub fn extract_headline(html: &str, rule: ExtractionRule) -> String {
    let document = Html::parse_document(html);
    document
        .select(rule.selector())
        .next()
        .map(|element| {
            let text = element.text().collect::<String>();
            WHITESPACE.replace_all(text.trim(), " ").into_owned()
        })
        .unwrap_or_default()
}
