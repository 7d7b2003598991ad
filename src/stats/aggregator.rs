use anyhow::Result;
use log::{debug, error, info, warn};

use crate::config::LookupPolicy;
use crate::http::non_retryable;
use crate::scrape::StatsScraper;
use crate::source::{Contributor, RepoId, RepoMetadata, Source};

use super::RepositoryStats;

/// Outcome of checking whether a repository exists.
#[derive(Debug, PartialEq)]
enum Lookup {
    /// Present, with its canonical name
    Found(String),
    Missing,
    /// The list could not be fetched; existence is decided by the detail call
    Unverified,
}

/// Builds [`RepositoryStats`] from a structured source and a page scraper.
///
/// Holds no mutable state, so one instance can serve concurrent requests.
pub struct Aggregator<S: Source, P: StatsScraper> {
    source: S,
    scraper: P,
    web_url: String,
    lookup: LookupPolicy,
}

impl<S: Source, P: StatsScraper> Aggregator<S, P> {
    pub fn new(source: S, scraper: P, web_url: &str, lookup: LookupPolicy) -> Self {
        Self {
            source,
            scraper,
            web_url: web_url.trim_end_matches('/').to_string(),
            lookup,
        }
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Collects statistics for `owner/repo`.
    ///
    /// `repo` is matched case-insensitively. Returns `Ok(None)` when the
    /// repository does not exist, and `Err` only when the source rejects the
    /// configured credentials. Every other upstream failure leaves the
    /// affected fields empty.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_stats(&self, owner: &str, repo: &str) -> Result<Option<RepositoryStats>> {
        let lookup = match self.lookup {
            LookupPolicy::ListMembership => self.find_in_list(owner, repo).await?,
            LookupPolicy::DirectFetch => Lookup::Unverified,
        };

        let (name, verified) = match lookup {
            Lookup::Found(name) => (name, true),
            Lookup::Missing => {
                info!("Repository {}/{} not found", owner, repo);
                return Ok(None);
            }
            Lookup::Unverified => (repo.to_string(), false),
        };

        let id = RepoId::new(owner, name);

        let (structured, scraped) = tokio::join!(
            self.fetch_structured(&id, verified),
            self.scraper.scrape(&id)
        );

        let Some(mut stats) = structured? else {
            info!("Repository {} not found", id);
            return Ok(None);
        };

        stats.scraped_stat_lines = scraped;
        Ok(Some(stats))
    }

    /// Looks `repo` up in the owner's repository list.
    async fn find_in_list(&self, owner: &str, repo: &str) -> Result<Lookup> {
        match self.source.list_repos(owner).await {
            Ok(repos) => {
                let wanted = repo.to_lowercase();
                debug!("Searching {} repositories for {}", repos.len(), wanted);
                Ok(repos
                    .into_iter()
                    .find(|r| r.name.to_lowercase() == wanted)
                    .map_or(Lookup::Missing, |r| Lookup::Found(r.name)))
            }
            Err(e) if is_auth_failure(&e) => {
                error!("Listing repositories for {} was rejected: {:#}", owner, e);
                Err(e)
            }
            Err(e) => {
                warn!(
                    "Could not list repositories for {} ({:#}), falling back to a direct lookup",
                    owner, e
                );
                Ok(Lookup::Unverified)
            }
        }
    }

    /// Fetches the detail, language and contributor groups.
    /// Returns `Ok(None)` if the repository turns out not to exist.
    async fn fetch_structured(&self, id: &RepoId, verified: bool) -> Result<Option<RepositoryStats>> {
        let (detail, languages, contributors) = if verified {
            tokio::join!(
                self.source.get_repo(id),
                self.source.get_languages(id),
                self.source.get_contributors(id)
            )
        } else {
            // The detail call doubles as the existence check.
            let detail = match self.source.get_repo(id).await {
                Err(e) if non_retryable(&e).is_some_and(|e| e.is_not_found()) => return Ok(None),
                Err(e) if is_auth_failure(&e) => {
                    error!("Fetching details for {} was rejected: {:#}", id, e);
                    return Err(e);
                }
                other => other,
            };
            let (languages, contributors) =
                tokio::join!(self.source.get_languages(id), self.source.get_contributors(id));
            (detail, languages, contributors)
        };

        let detail = best_effort("details", id, detail.map(Some))?;
        let languages = best_effort("languages", id, languages)?;
        let contributors = best_effort("contributors", id, contributors)?;

        Ok(Some(self.merge(id, detail, languages, contributors)))
    }

    fn merge(
        &self,
        id: &RepoId,
        detail: Option<RepoMetadata>,
        languages: Vec<String>,
        contributors: Vec<Contributor>,
    ) -> RepositoryStats {
        let mut stats = RepositoryStats::named(id.repo.clone());
        stats.languages = languages;
        stats.contributor_avatar_urls = contributors.into_iter().map(|c| c.avatar_url).collect();

        if let Some(detail) = detail {
            if !detail.name.is_empty() {
                stats.name = detail.name;
            }
            stats.description = detail.description;
            stats.star_count = detail.stars;
            stats.fork_count = detail.forks;
            stats.watcher_count = detail.watchers;
            stats.license = detail.license;
            stats.url = detail.html_url;
        }

        if stats.url.is_empty() {
            stats.url = format!("{}/{}/{}", self.web_url, id.owner, stats.name);
        }

        stats
    }
}

fn is_auth_failure(e: &anyhow::Error) -> bool {
    non_retryable(e).is_some_and(|e| e.is_auth())
}

/// Degrades a failed field group to its empty value.
/// Authentication failures are passed through.
fn best_effort<T: Default>(group: &str, id: &RepoId, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if is_auth_failure(&e) => {
            error!("Fetching {} for {} was rejected: {:#}", group, id, e);
            Err(e)
        }
        Err(e) => {
            warn!("Fetching {} for {} failed, leaving them empty: {:#}", group, id, e);
            Ok(T::default())
        }
    }
}
