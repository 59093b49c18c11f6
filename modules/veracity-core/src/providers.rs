//! Trait boundaries over the outbound AI/search providers, plus the
//! adapters that implement them against the real clients.
//!
//! Strategies depend only on these traits, so every strategy test runs
//! against the HashMap mocks in `testing` with no network.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use ai_client::{JinaClient, OpenRouterClient, PerplexityClient};
use firecrawl_client::FirecrawlClient;
use veracity_common::{Source, VeracityError};

use crate::normalize::strip_fences;

// ---------------------------------------------------------------------------
// ChatApi — OpenRouter and Perplexity both look like this to a strategy
// ---------------------------------------------------------------------------

/// Result of one chat call: the model's text plus any sources the
/// transport surfaced separately from the body (web-search annotations,
/// citation lists).
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub content: String,
    pub sources: Vec<Source>,
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn chat(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<ChatOutcome, VeracityError>;
}

// ---------------------------------------------------------------------------
// SearchApi — web search returning scraped page content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EvidencePage {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EvidencePage>, VeracityError>;
}

// ---------------------------------------------------------------------------
// GroundingApi — fast per-claim verdicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    True,
    False,
    PartiallyTrue,
    Unverifiable,
}

impl Validity {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "true" => Validity::True,
            "false" => Validity::False,
            "partially_true" | "partially true" => Validity::PartiallyTrue,
            _ => Validity::Unverifiable,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClaimJudgment {
    pub validity: Validity,
    /// Backend-reported confidence in [0, 1].
    pub confidence: f32,
    pub explanation: String,
    pub sources: Vec<Source>,
}

impl ClaimJudgment {
    /// The degraded judgment recorded when a claim's verification call
    /// fails: unverifiable, zero confidence, no sources.
    pub fn unverifiable(explanation: impl Into<String>) -> Self {
        ClaimJudgment {
            validity: Validity::Unverifiable,
            confidence: 0.0,
            explanation: explanation.into(),
            sources: Vec::new(),
        }
    }
}

#[async_trait]
pub trait GroundingApi: Send + Sync {
    async fn ground(&self, claim: &str) -> Result<ClaimJudgment, VeracityError>;
}

// ---------------------------------------------------------------------------
// OpenRouter adapter
// ---------------------------------------------------------------------------

pub struct OpenRouterChat {
    client: OpenRouterClient,
    model: String,
}

impl OpenRouterChat {
    pub fn new(client: OpenRouterClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatApi for OpenRouterChat {
    async fn chat(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<ChatOutcome, VeracityError> {
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(ai_client::ChatMessage::system(system));
        }
        messages.push(ai_client::ChatMessage::user(prompt));

        let request = ai_client::ChatRequest::new(&self.model, messages).max_tokens(max_tokens);
        let response = self
            .client
            .chat(&request)
            .await
            .map_err(|e| VeracityError::Backend(e.to_string()))?;

        let content = response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| VeracityError::Backend("Empty response from model".to_string()))?;

        let sources = response
            .web_search_results()
            .into_iter()
            .map(|r| Source::new(&r.title, &r.url))
            .collect();

        Ok(ChatOutcome { content, sources })
    }
}

// ---------------------------------------------------------------------------
// Perplexity adapter
// ---------------------------------------------------------------------------

const FACT_CHECK_SYSTEM: &str = "You are a precise fact-checker that returns \
only valid JSON. Verify claims against current, authoritative sources and \
never invent citations.";

pub struct PerplexityChat {
    client: PerplexityClient,
    model: String,
}

impl PerplexityChat {
    pub fn new(client: PerplexityClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatApi for PerplexityChat {
    async fn chat(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<ChatOutcome, VeracityError> {
        let system = system.unwrap_or(FACT_CHECK_SYSTEM);
        let response = self
            .client
            .research(&self.model, system, prompt, max_tokens)
            .await
            .map_err(|e| VeracityError::Backend(e.to_string()))?;

        let content = response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| VeracityError::Backend("Empty response from model".to_string()))?;

        // Citations arrive at the transport level; untitled ones get their
        // hostname as a display title.
        let sources = response
            .citations
            .iter()
            .map(|c| {
                let title = c
                    .title()
                    .map(str::to_string)
                    .unwrap_or_else(|| hostname(c.url()).to_string());
                Source::new(title, c.url())
            })
            .collect();

        Ok(ChatOutcome { content, sources })
    }
}

/// Display-title fallback for bare citation URLs.
fn hostname(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    rest.split('/').next().unwrap_or(rest)
}

// ---------------------------------------------------------------------------
// Jina adapter
// ---------------------------------------------------------------------------

pub struct JinaGrounding {
    client: JinaClient,
}

impl JinaGrounding {
    pub fn new(client: JinaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct JinaVerdict {
    #[serde(default)]
    validity: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    sources: Vec<JinaSource>,
}

#[derive(Debug, Deserialize)]
struct JinaSource {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

fn claim_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "validity": {
                "type": "string",
                "enum": ["true", "false", "partially_true", "unverifiable"]
            },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
            "explanation": { "type": "string" },
            "sources": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "url": { "type": "string" }
                    },
                    "required": ["url"]
                }
            }
        },
        "required": ["validity", "confidence", "explanation"]
    })
}

#[async_trait]
impl GroundingApi for JinaGrounding {
    async fn ground(&self, claim: &str) -> Result<ClaimJudgment, VeracityError> {
        let prompt = crate::prompts::grounding_prompt(claim);
        let response = self
            .client
            .ground(&prompt, claim_schema())
            .await
            .map_err(|e| VeracityError::Backend(e.to_string()))?;

        let content = response
            .first_content()
            .ok_or_else(|| VeracityError::Backend("Empty grounding response".to_string()))?;

        let verdict: JinaVerdict = match serde_json::from_str(strip_fences(content)) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Unparseable grounding verdict, treating claim as unverifiable");
                return Ok(ClaimJudgment::unverifiable("Verdict could not be parsed"));
            }
        };

        Ok(ClaimJudgment {
            validity: Validity::from_label(&verdict.validity),
            confidence: verdict.confidence.clamp(0.0, 1.0),
            explanation: verdict.explanation,
            sources: verdict
                .sources
                .into_iter()
                .map(|s| Source::new(s.title, s.url))
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Firecrawl adapter
// ---------------------------------------------------------------------------

pub struct FirecrawlSearch {
    client: FirecrawlClient,
}

impl FirecrawlSearch {
    pub fn new(client: FirecrawlClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchApi for FirecrawlSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EvidencePage>, VeracityError> {
        let hits = self
            .client
            .search(query, limit as u32)
            .await
            .map_err(|e| VeracityError::Backend(e.to_string()))?;

        Ok(hits
            .into_iter()
            .map(|h| EvidencePage {
                title: h.title,
                url: h.url,
                content: h.markdown.unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_labels() {
        assert_eq!(Validity::from_label("true"), Validity::True);
        assert_eq!(Validity::from_label("False"), Validity::False);
        assert_eq!(Validity::from_label("partially_true"), Validity::PartiallyTrue);
        assert_eq!(Validity::from_label("partially true"), Validity::PartiallyTrue);
        assert_eq!(Validity::from_label("unverifiable"), Validity::Unverifiable);
        assert_eq!(Validity::from_label("garbage"), Validity::Unverifiable);
    }

    #[test]
    fn hostname_fallback() {
        assert_eq!(hostname("https://www.reuters.com/article/x"), "www.reuters.com");
        assert_eq!(hostname("http://nasa.gov"), "nasa.gov");
        assert_eq!(hostname("nasa.gov/page"), "nasa.gov");
    }
}
