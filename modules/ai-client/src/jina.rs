use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use tracing::debug;

use crate::error::{api_error, AiClientError, Result};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

const JINA_API_URL: &str = "https://deepsearch.jina.ai/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Jina DeepSearch chat endpoint. Calls are per-claim, so
/// requests stay cheap: low reasoning effort and a small URL cap.
pub struct JinaClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl JinaClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: JINA_API_URL.to_string(),
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

    /// Verify a single claim, constraining the answer to `schema` via
    /// structured output.
    pub async fn ground(&self, prompt: &str, schema: serde_json::Value) -> Result<ChatResponse> {
        let mut request = ChatRequest::new("jina-deepsearch-v1", vec![ChatMessage::user(prompt)])
            .max_tokens(1024);
        request.response_format = Some(json!({
            "type": "json_schema",
            "json_schema": { "schema": schema },
        }));
        request.reasoning_effort = Some("low".to_string());
        request.max_returned_urls = Some(3);

        self.chat(&request).await
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "Jina DeepSearch request");

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
