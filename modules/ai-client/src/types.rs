//! Shared chat-completion wire types. All three providers speak the same
//! OpenAI-style envelope; provider-specific extras ride on `ChatRequest`
//! as optional fields that are skipped when unset.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Perplexity: ask the transport to return a citations list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_citations: Option<bool>,
    /// Perplexity: restrict web search to recent sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_recency_filter: Option<String>,
    /// Jina DeepSearch: structured-output schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
    /// Jina DeepSearch: effort knob; "low" keeps per-claim calls cheap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    /// Jina DeepSearch: cap on returned source URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_returned_urls: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: 1024,
            temperature: 0.2,
            return_citations: None,
            search_recency_filter: None,
            response_format: None,
            reasoning_effort: None,
            max_returned_urls: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Perplexity surfaces citations at the top level, separate from the
    /// model's body content.
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    /// OpenRouter attaches web-search annotations here when the model
    /// used its search tool.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub web_search: Option<WebSearchAnnotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSearchAnnotation {
    #[serde(default)]
    pub results: Vec<WebSearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Perplexity citation entry. Some responses carry bare URL strings,
/// others full objects; accept both.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Citation {
    Url(String),
    Entry {
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
}

impl Citation {
    pub fn url(&self) -> &str {
        match self {
            Citation::Url(u) => u,
            Citation::Entry { url, .. } => url,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Citation::Url(_) => None,
            Citation::Entry { title, .. } => title.as_deref(),
        }
    }
}

impl ChatResponse {
    /// First choice's content, the only part callers usually want.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }

    /// Flatten web-search annotations into (title, url) pairs,
    /// preserving the transport's ordering.
    pub fn web_search_results(&self) -> Vec<&WebSearchResult> {
        self.choices
            .iter()
            .flat_map(|c| c.message.annotations.iter())
            .filter(|a| a.kind == "web_search")
            .filter_map(|a| a.web_search.as_ref())
            .flat_map(|ws| ws.results.iter())
            .collect()
    }
}
