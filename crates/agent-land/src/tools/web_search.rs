use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_DELAY: Duration = Duration::from_millis(100);
const MAX_WEB_RESULTS: usize = 5;
const MAX_ACADEMIC_RESULTS: usize = 3;

/// One search hit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the page.
    pub title: String,
    /// Address of the page.
    pub url: String,
    /// A short excerpt.
    pub snippet: String,
    /// `web` or `academic`.
    pub source: String,
}

/// A mock search engine.
///
/// Searches return canned results after a short delay. Page fetches do
/// reach the network, but return a placeholder body.
#[derive(Clone, Debug)]
pub struct WebSearch {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }
}

impl WebSearch {
    /// Creates a search tool whose page fetches time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Searches the web, returning at most five results.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        info!("performing web search for: {query}");
        let results: Vec<_> = (1..=max_results.min(MAX_WEB_RESULTS))
            .map(|i| SearchResult {
                title: format!("Search result {i} for '{query}'"),
                url: format!("https://example.com/result-{i}"),
                snippet: format!(
                    "This is a mock snippet for search result {i} related to \
                     {query}. It contains relevant information about the topic."
                ),
                source: "web".to_owned(),
            })
            .collect();
        sleep(SEARCH_DELAY).await;
        info!("found {} results for query: {query}", results.len());
        results
    }

    /// Searches academic sources, returning at most three results.
    pub async fn search_academic(
        &self,
        query: &str,
        max_results: usize,
    ) -> Vec<SearchResult> {
        info!("performing academic search for: {query}");
        let results = (1..=max_results.min(MAX_ACADEMIC_RESULTS))
            .map(|i| SearchResult {
                title: format!("Academic paper {i}: {query}"),
                url: format!("https://scholar.example.com/paper-{i}"),
                snippet: format!(
                    "Abstract: This academic paper discusses {query} and \
                     presents findings relevant to the field."
                ),
                source: "academic".to_owned(),
            })
            .collect();
        sleep(SEARCH_DELAY).await;
        results
    }

    /// Fetches a page. Returns `None` when the request fails.
    pub async fn fetch_page_content(&self, url: &str) -> Option<String> {
        info!("fetching content from: {url}");
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());
        match resp {
            Ok(_) => {
                info!("successfully fetched content from {url}");
                Some(format!(
                    "Mock page content from {url}. This would contain the \
                     actual text content extracted from the webpage."
                ))
            }
            Err(err) => {
                error!("error fetching {url}: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_search_caps_results() {
        let search = WebSearch::default();
        let results = search.search("rust", 10).await;
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].title, "Search result 1 for 'rust'");
        assert_eq!(results[4].url, "https://example.com/result-5");

        assert_eq!(search.search("rust", 2).await.len(), 2);
        assert!(search.search("rust", 0).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_academic_search() {
        let results = WebSearch::default().search_academic("agents", 5).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.source == "academic"));
        assert_eq!(results[1].title, "Academic paper 2: agents");
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let content = WebSearch::default().fetch_page_content("not a url").await;
        assert_eq!(content, None);
    }
}
