//! Project listing for the portfolio index page.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fmt;

use crate::source::{RepoMetadata, Source};

/// One entry of the project list.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub star_count: u64,
    pub fork_count: u64,
    pub language: Option<String>,
    pub license: Option<String>,
    pub url: String,
    pub updated_at: Option<String>,
}

impl From<RepoMetadata> for ProjectSummary {
    fn from(r: RepoMetadata) -> Self {
        ProjectSummary {
            id: r.id,
            name: r.name,
            description: r.description,
            star_count: r.stars,
            fork_count: r.forks,
            language: r.language,
            license: r.license,
            url: r.html_url,
            updated_at: r.updated_at,
        }
    }
}

impl fmt::Display for ProjectSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<32} {:>6} stars", self.name, self.star_count)?;
        if let Some(language) = &self.language {
            write!(f, "  [{}]", language)?;
        }
        if let Some(description) = &self.description {
            write!(f, "  {}", description)?;
        }
        Ok(())
    }
}

/// Lists the owner's projects, most recently updated first.
///
/// Ties on the update time keep the higher star count first. If `pinned` names
/// a repository id in the list, that project is moved to the front.
#[tracing::instrument(skip(source))]
pub async fn list_projects<S: Source>(
    source: &S,
    owner: &str,
    pinned: Option<u64>,
) -> Result<Vec<ProjectSummary>> {
    let repos = source
        .list_repos(owner)
        .await
        .with_context(|| format!("Failed to list repositories for {}", owner))?;

    debug!("Ordering {} repositories for {}", repos.len(), owner);
    Ok(order_projects(repos, pinned))
}

/// Sorts by stars, then (stably) by update time, then applies the pin.
pub fn order_projects(repos: Vec<RepoMetadata>, pinned: Option<u64>) -> Vec<ProjectSummary> {
    let mut projects: Vec<ProjectSummary> = repos.into_iter().map(ProjectSummary::from).collect();

    projects.sort_by(|a, b| b.star_count.cmp(&a.star_count));
    // ISO 8601 timestamps order correctly as strings; missing ones sort last.
    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    if let Some(id) = pinned {
        if let Some(pos) = projects.iter().position(|p| p.id == id) {
            let project = projects.remove(pos);
            projects.insert(0, project);
        }
    }

    projects
}
