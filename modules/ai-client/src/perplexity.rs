use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::error::{api_error, AiClientError, Result};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

pub struct PerplexityClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl PerplexityClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: PERPLEXITY_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| AiClientError::Parse(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// One research call: system preamble + user prompt, citations on,
    /// search narrowed to the past month.
    pub async fn research(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<ChatResponse> {
        let mut request = ChatRequest::new(
            model,
            vec![ChatMessage::system(system), ChatMessage::user(prompt)],
        )
        .max_tokens(max_tokens)
        .temperature(0.2);
        request.return_citations = Some(true);
        request.search_recency_filter = Some("month".to_string());

        self.chat(&request).await
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "Perplexity chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AiClientError::Parse(e.to_string()))
    }
}
