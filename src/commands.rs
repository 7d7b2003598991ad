//! Command implementations behind the CLI.

use anyhow::{Result, bail};
use log::debug;

use crate::{
    config::Config,
    projects::list_projects,
    services::{build_aggregator, build_readme_source, build_source},
    source::{RepoId, Source},
};

/// Resolves a `repo` or `owner/repo` argument against the configured owner.
pub fn resolve_repo(config: &Config, input: &str) -> Result<RepoId> {
    if input.contains('/') {
        return input.parse();
    }
    if input.trim().is_empty() {
        bail!("Repository name cannot be empty.");
    }
    Ok(RepoId::new(config.owner.clone(), input.trim()))
}

/// Print statistics for one repository.
#[tracing::instrument(skip(config))]
pub async fn show(config: &Config, repo: &str, json: bool) -> Result<()> {
    let repo = resolve_repo(config, repo)?;
    let aggregator = build_aggregator(config)?;

    let Some(stats) = aggregator.fetch_stats(&repo.owner, &repo.repo).await? else {
        bail!("Repository {} not found", repo);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", stats);
    }
    Ok(())
}

/// Print the owner's projects.
#[tracing::instrument(skip(config))]
pub async fn list(config: &Config, pinned: Option<u64>, json: bool) -> Result<()> {
    let source = build_source(config)?;
    let projects = list_projects(&source, &config.owner, pinned).await?;
    debug!("Listing {} project(s)", projects.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else if projects.is_empty() {
        println!("No projects found for {}.", config.owner);
    } else {
        for project in &projects {
            println!("{}", project);
        }
    }
    Ok(())
}

/// Print a repository's README.
#[tracing::instrument(skip(config))]
pub async fn readme(config: &Config, repo: &str) -> Result<()> {
    let repo = resolve_repo(config, repo)?;
    let source = build_readme_source(config)?;
    let text = source.get_readme(&repo).await?;
    print!("{}", text);
    Ok(())
}
