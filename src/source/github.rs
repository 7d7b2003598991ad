//! GitHub source implementation.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
#[cfg(test)]
use reqwest::Client;

use crate::http::HttpClient;

use super::{Contributor, RepoId, RepoMetadata, Source};

/// Repositories requested per page from list endpoints.
const PER_PAGE: usize = 100;

/// Upper bound on list pages to avoid looping on a misbehaving API.
const MAX_PAGES: usize = 10;

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Repo {
        #[serde(default)]
        pub id: u64,
        pub name: String,
        pub description: Option<String>,
        #[serde(default)]
        pub stargazers_count: u64,
        #[serde(default)]
        pub forks: u64,
        pub subscribers_count: Option<u64>,
        pub language: Option<String>,
        pub license: Option<License>,
        #[serde(default)]
        pub html_url: String,
        pub updated_at: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct License {
        pub spdx_id: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Contributor {
        pub login: Option<String>,
        pub avatar_url: String,
        #[serde(default)]
        pub contributions: u64,
    }
}

/// GitHub source implementation.
pub struct GitHubSource {
    http_client: HttpClient,
    api_url: String,
    raw_url: String,
}

impl GitHubSource {
    /// Create a new GitHub source with default API URL.
    /// Used primarily for testing.
    #[cfg(test)]
    pub fn new(client: Client) -> Self {
        Self::from_http_client(
            HttpClient::new(client),
            "https://api.github.com",
            "https://raw.githubusercontent.com",
        )
    }

    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, api_url: &str, raw_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            raw_url: raw_url.trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn repo_url(&self, repo: &RepoId) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.repo)
    }
}

#[async_trait]
impl Source for GitHubSource {
    #[tracing::instrument(skip(self))]
    async fn list_repos(&self, owner: &str) -> Result<Vec<RepoMetadata>> {
        let url = format!("{}/users/{}/repos", self.api_url, owner);
        let per_page = PER_PAGE.to_string();
        let mut repos = Vec::new();

        for page in 1..=MAX_PAGES {
            debug!("Fetching repositories page {} from {}...", page, url);

            let page = page.to_string();
            let parsed: Vec<api::Repo> = self
                .http_client
                .get_json_with_query(&url, &[("per_page", per_page.as_str()), ("page", page.as_str())])
                .await?;

            let len = parsed.len();
            repos.extend(parsed.into_iter().map(RepoMetadata::from));

            if len < PER_PAGE {
                break;
            }
        }

        Ok(repos)
    }

    #[tracing::instrument(skip(self))]
    async fn get_repo(&self, repo: &RepoId) -> Result<RepoMetadata> {
        let url = self.repo_url(repo);
        debug!("Fetching repo info from {}...", url);
        let info: api::Repo = self.http_client.get_json(&url).await?;
        Ok(info.into())
    }

    #[tracing::instrument(skip(self))]
    async fn get_languages(&self, repo: &RepoId) -> Result<Vec<String>> {
        let url = format!("{}/languages", self.repo_url(repo));
        debug!("Fetching languages from {}...", url);

        // Byte counts are dropped; only the key order matters.
        let languages: serde_json::Map<String, serde_json::Value> =
            self.http_client.get_json(&url).await?;
        Ok(languages.into_iter().map(|(name, _)| name).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_contributors(&self, repo: &RepoId) -> Result<Vec<Contributor>> {
        let url = format!("{}/contributors", self.repo_url(repo));
        debug!("Fetching contributors from {}...", url);

        let contributors: Vec<api::Contributor> = self.http_client.get_json(&url).await?;
        Ok(contributors.into_iter().map(Contributor::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_readme(&self, repo: &RepoId) -> Result<String> {
        let url = format!("{}/{}/{}/main/README.md", self.raw_url, repo.owner, repo.repo);
        self.http_client.get_text(&url).await
    }
}

impl From<api::Repo> for RepoMetadata {
    fn from(r: api::Repo) -> Self {
        RepoMetadata {
            id: r.id,
            name: r.name,
            description: r.description,
            stars: r.stargazers_count,
            forks: r.forks,
            watchers: r.subscribers_count,
            language: r.language,
            license: r.license.and_then(|l| l.spdx_id),
            html_url: r.html_url,
            updated_at: r.updated_at,
        }
    }
}

impl From<api::Contributor> for Contributor {
    fn from(c: api::Contributor) -> Self {
        Contributor {
            login: c.login,
            avatar_url: c.avatar_url,
            contributions: c.contributions,
        }
    }
}
