//! Structured metadata source for repositories.
//!
//! This module defines the data the aggregator needs from a code hosting
//! API and the trait the aggregator talks to, so the GitHub implementation
//! can be swapped for a mock in tests.

mod github;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use github::GitHubSource;

/// Repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            anyhow::bail!("Invalid repository format. Expected 'owner/repo'.")
        } else {
            Ok(RepoId::new(parts[0], parts[1]))
        }
    }
}

/// Repository metadata as reported by the source.
///
/// List entries and single-repository lookups share this shape; fields the
/// list endpoint does not carry (watchers) are left as `None`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RepoMetadata {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: Option<u64>,
    /// Primary language as detected by the host
    pub language: Option<String>,
    /// SPDX identifier of the license
    pub license: Option<String>,
    pub html_url: String,
    /// Last update timestamp (ISO 8601)
    pub updated_at: Option<String>,
}

/// A contributor to a repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contributor {
    pub login: Option<String>,
    pub avatar_url: String,
    pub contributions: u64,
}

/// Trait for structured repository sources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Source: Send + Sync {
    /// List every repository owned by `owner`.
    async fn list_repos(&self, owner: &str) -> Result<Vec<RepoMetadata>>;

    /// Fetch one repository's full record.
    async fn get_repo(&self, repo: &RepoId) -> Result<RepoMetadata>;

    /// Languages used by the repository, in the order the API reports them.
    async fn get_languages(&self, repo: &RepoId) -> Result<Vec<String>>;

    /// Contributors in the order the API reports them.
    async fn get_contributors(&self, repo: &RepoId) -> Result<Vec<Contributor>>;

    /// Raw README text from the default branch.
    async fn get_readme(&self, repo: &RepoId) -> Result<String>;
}
