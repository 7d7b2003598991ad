//! Repository statistics shown on project pages.

mod aggregator;

use serde::Serialize;
use std::fmt;

pub use aggregator::Aggregator;

/// Flattened statistics for one repository.
///
/// Only `name` is guaranteed. Every other field comes from a best-effort
/// upstream call and may be empty when that call failed.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryStats {
    pub name: String,
    pub description: Option<String>,
    /// Language names in the order the API reports them
    pub languages: Vec<String>,
    pub star_count: u64,
    pub fork_count: u64,
    pub watcher_count: Option<u64>,
    /// SPDX identifier
    pub license: Option<String>,
    pub url: String,
    pub contributor_avatar_urls: Vec<String>,
    pub scraped_stat_lines: Vec<String>,
}

impl RepositoryStats {
    /// A record with nothing but the name filled in.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for RepositoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        if let Some(description) = &self.description {
            writeln!(f, "  {}", description)?;
        }
        writeln!(f, "  URL:          {}", self.url)?;
        writeln!(f, "  Stars:        {}", self.star_count)?;
        writeln!(f, "  Forks:        {}", self.fork_count)?;
        if let Some(watchers) = self.watcher_count {
            writeln!(f, "  Watchers:     {}", watchers)?;
        }
        if let Some(license) = &self.license {
            writeln!(f, "  License:      {}", license)?;
        }
        if !self.languages.is_empty() {
            writeln!(f, "  Languages:    {}", self.languages.join(", "))?;
        }
        if !self.contributor_avatar_urls.is_empty() {
            writeln!(f, "  Contributors: {}", self.contributor_avatar_urls.len())?;
            for avatar in &self.contributor_avatar_urls {
                writeln!(f, "    {}", avatar)?;
            }
        }
        if !self.scraped_stat_lines.is_empty() {
            writeln!(f, "  Page stats:   {}", self.scraped_stat_lines.join(" / "))?;
        }
        Ok(())
    }
}
