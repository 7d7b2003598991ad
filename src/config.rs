//! Process-wide configuration, built once at startup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;

pub const DEFAULT_OWNER: &str = "dogukanurker";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_WEB_URL: &str = "https://github.com";
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How the aggregator decides whether a repository exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// Scan the owner's repository list for a case-insensitive match.
    #[default]
    ListMembership,
    /// Fetch the repository directly and treat HTTP 404 as missing.
    DirectFetch,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Account whose repositories are queried
    pub owner: String,
    /// Bearer token for the structured API
    pub token: Option<String>,
    pub api_url: String,
    pub web_url: String,
    pub raw_url: String,
    /// Per-request timeout for every outbound call
    pub timeout: Duration,
    pub lookup: LookupPolicy,
    /// Whether to scrape the public repository page
    pub scrape: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
            raw_url: DEFAULT_RAW_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            lookup: LookupPolicy::default(),
            scrape: true,
        }
    }
}

/// Default location of the token file: `<config dir>/repostats/token`.
pub fn default_token_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("repostats").join("token"))
}

/// Picks the API token.
///
/// An explicitly supplied token (flag or `GITHUB_TOKEN`) wins. Otherwise the
/// token file is read if it exists. Surrounding whitespace is stripped and an
/// empty token counts as none.
pub fn resolve_token(explicit: Option<String>, token_file: Option<&Path>) -> Result<Option<String>> {
    if let Some(token) = explicit.and_then(non_empty) {
        debug!("Using token supplied on the command line or environment");
        return Ok(Some(token));
    }

    let Some(path) = token_file else {
        return Ok(None);
    };

    match fs::read_to_string(path) {
        Ok(contents) => {
            debug!("Using token from {}", path.display());
            Ok(non_empty(contents))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No token file at {}", path.display());
            Ok(None)
        }
        Err(e) => {
            Err(e).with_context(|| format!("Failed to read token file {}", path.display()))
        }
    }
}

fn non_empty(token: String) -> Option<String> {
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
