pub mod error;

pub use error::{FirecrawlError, Result};

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const BASE_URL: &str = "https://api.firecrawl.dev/v2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// One search hit with its scraped page content, when available.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub markdown: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<DataShape>,
}

/// The search endpoint has returned both a flat hit array and an object
/// keyed by source type; accept either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataShape {
    Flat(Vec<SearchHit>),
    Keyed {
        #[serde(default)]
        web: Vec<SearchHit>,
    },
}

pub struct FirecrawlClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl FirecrawlClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Search the web and scrape each hit to markdown. Results are
    /// restricted to the past month.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>> {
        let url = format!("{}/search", self.base_url);
        let body = json!({
            "query": query,
            "limit": limit,
            "tbs": "qdr:m",
            "scrapeOptions": { "formats": ["markdown"] },
        });

        debug!(query, limit, "Firecrawl search");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FirecrawlError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: SearchResponse = resp.json().await?;
        let hits = match parsed.data {
            Some(DataShape::Flat(hits)) => hits,
            Some(DataShape::Keyed { web }) => web,
            None => Vec::new(),
        };
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keyed_search_response() {
        let body = r##"{"success":true,"data":{"web":[
            {"title":"Report","url":"https://example.com/report","markdown":"# Report"}
        ]}}"##;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        match parsed.data {
            Some(DataShape::Keyed { web }) => {
                assert_eq!(web.len(), 1);
                assert_eq!(web[0].url, "https://example.com/report");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn parses_flat_search_response() {
        let body = r#"{"data":[{"title":"A","url":"https://a.example"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        match parsed.data {
            Some(DataShape::Flat(hits)) => {
                assert_eq!(hits[0].title, "A");
                assert!(hits[0].markdown.is_none());
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
