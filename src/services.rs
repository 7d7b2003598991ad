//! Service factory for building the aggregator and its collaborators.
//!
//! Construction is kept apart from [`Config`] so the same configuration can
//! produce real services here and mocks in tests.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::time::Duration;

use crate::{
    config::Config,
    http::HttpClient,
    scrape::{DisabledScraper, PageScraper, StatsScraper},
    source::GitHubSource,
    stats::Aggregator,
};

const USER_AGENT: &str = concat!("repostats/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client with optional authentication token and a request timeout
pub fn build_http_client(token: Option<&str>, timeout: Duration) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    if let Some(token) = token {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("API token contains characters not allowed in a header")?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("HTTP client configured with authentication");
    }

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()?;

    Ok(HttpClient::new(client))
}

/// Build the GitHub source from configuration
pub fn build_source(config: &Config) -> Result<GitHubSource> {
    let http_client = build_http_client(config.token.as_deref(), config.timeout)?;
    Ok(GitHubSource::from_http_client(
        http_client,
        &config.api_url,
        &config.raw_url,
    ))
}

/// Build a source for raw file content such as the README.
///
/// Raw content is public and served from another host, so no token is attached.
pub fn build_readme_source(config: &Config) -> Result<GitHubSource> {
    let http_client = build_http_client(None, config.timeout)?;
    Ok(GitHubSource::from_http_client(
        http_client,
        &config.api_url,
        &config.raw_url,
    ))
}

/// Build the page scraper, or a disabled one when scraping is switched off.
///
/// The scrape target is a public page, so no token is attached.
pub fn build_scraper(config: &Config) -> Result<Box<dyn StatsScraper>> {
    if !config.scrape {
        debug!("Page scraping disabled");
        return Ok(Box::new(DisabledScraper));
    }

    let http_client = build_http_client(None, config.timeout)?;
    Ok(Box::new(PageScraper::new(http_client, &config.web_url)))
}

/// Build the aggregator from configuration
pub fn build_aggregator(config: &Config) -> Result<Aggregator<GitHubSource, Box<dyn StatsScraper>>> {
    Ok(Aggregator::new(
        build_source(config)?,
        build_scraper(config)?,
        &config.web_url,
        config.lookup,
    ))
}
