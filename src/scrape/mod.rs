//! Best-effort statistics scraped from public repository pages.
//!
//! The hosting platform renders summary counters (stars, forks, watchers)
//! server-side. There is no stability contract on that markup, so a
//! [`StatsScraper`] never reports failure: anything that goes wrong yields an
//! empty list.

use async_trait::async_trait;
use log::{debug, warn};
use scraper::{Html, Selector};

use crate::http::HttpClient;
use crate::source::RepoId;

/// Elements carrying a summary counter on the repository page.
const STAT_SELECTOR: &str = "div.mt-2";

/// The counter text inside each matched element.
const STAT_TEXT_SELECTOR: &str = "strong";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsScraper: Send + Sync {
    /// Scrape display statistics for `repo`. Returns an empty list on any failure.
    async fn scrape(&self, repo: &RepoId) -> Vec<String>;
}

#[async_trait]
impl<T: StatsScraper + ?Sized> StatsScraper for Box<T> {
    async fn scrape(&self, repo: &RepoId) -> Vec<String> {
        (**self).scrape(repo).await
    }
}

/// Scrapes the public web page of a repository.
pub struct PageScraper {
    http_client: HttpClient,
    web_url: String,
}

impl PageScraper {
    pub fn new(http_client: HttpClient, web_url: &str) -> Self {
        Self {
            http_client,
            web_url: web_url.trim_end_matches('/').to_string(),
        }
    }

    fn page_url(&self, repo: &RepoId) -> String {
        format!("{}/{}/{}", self.web_url, repo.owner, repo.repo)
    }
}

#[async_trait]
impl StatsScraper for PageScraper {
    #[tracing::instrument(skip(self))]
    async fn scrape(&self, repo: &RepoId) -> Vec<String> {
        let url = self.page_url(repo);

        match self.http_client.get_text(&url).await {
            Ok(html) => {
                let lines = extract_stat_lines(&html);
                debug!("Scraped {} stat line(s) from {}", lines.len(), url);
                lines
            }
            Err(e) => {
                warn!("Could not scrape {}: {:#}", url, e);
                Vec::new()
            }
        }
    }
}

/// A scraper that never touches the network.
pub struct DisabledScraper;

#[async_trait]
impl StatsScraper for DisabledScraper {
    async fn scrape(&self, _repo: &RepoId) -> Vec<String> {
        Vec::new()
    }
}

/// Pulls the text of the first `<strong>` inside every `div.mt-2`.
/// Elements without one, or with only whitespace, are skipped.
pub fn extract_stat_lines(html: &str) -> Vec<String> {
    let (Ok(block), Ok(text)) = (
        Selector::parse(STAT_SELECTOR),
        Selector::parse(STAT_TEXT_SELECTOR),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);

    document
        .select(&block)
        .filter_map(|element| element.select(&text).next())
        .map(|strong| strong.text().collect::<String>().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
