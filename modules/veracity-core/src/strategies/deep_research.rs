//! Iterative claim verification: extract claims, search-and-scrape
//! evidence for each, judge each against its evidence, then synthesize.
//!
//! One claim's search or verification failing degrades that claim to an
//! unverified judgment and the pipeline continues; extraction or
//! synthesis failing is fatal.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use veracity_common::{AnalysisMode, Source, Stage, VeracityError};

use crate::normalize::strip_fences;
use crate::progress::ProgressSink;
use crate::prompts;
use crate::providers::{ChatApi, SearchApi};
use crate::strategies::{satire_body, no_claims_body, Analyzer, RawAnalysis};

const SOURCE_CAP: usize = 15;
const EXTRACT_MAX_TOKENS: u32 = 1500;
const VERIFY_MAX_TOKENS: u32 = 500;
const SYNTHESIS_MAX_TOKENS: u32 = 2500;
/// Per-page excerpt budget fed to the verification call.
const EVIDENCE_CHARS: usize = 1500;

pub struct DeepResearch {
    chat: Arc<dyn ChatApi>,
    search: Arc<dyn SearchApi>,
    max_claims: usize,
    searches_per_claim: usize,
}

#[derive(Debug, Deserialize)]
struct Extraction {
    #[serde(default)]
    content_type: String,
    #[serde(default)]
    claims: Vec<ExtractedClaim>,
}

#[derive(Debug, Deserialize)]
struct ExtractedClaim {
    claim: String,
    #[serde(default)]
    search_query: String,
    #[serde(default)]
    importance: String,
}

impl DeepResearch {
    pub fn new(
        chat: Arc<dyn ChatApi>,
        search: Arc<dyn SearchApi>,
        max_claims: usize,
        searches_per_claim: usize,
    ) -> Self {
        Self {
            chat,
            search,
            max_claims,
            searches_per_claim,
        }
    }

    async fn extract(&self, content: &str) -> Result<Extraction, VeracityError> {
        let prompt = prompts::extract_claims(content, self.max_claims);
        let outcome = self.chat.chat(None, &prompt, EXTRACT_MAX_TOKENS).await?;
        serde_json::from_str(strip_fences(&outcome.content)).map_err(|e| {
            VeracityError::Backend(format!("Claim extraction returned invalid JSON: {e}"))
        })
    }

    /// Judge one claim. Failures degrade to an unverified judgment.
    async fn verify(
        &self,
        claim: &ExtractedClaim,
        gathered_sources: &mut Vec<Source>,
    ) -> serde_json::Value {
        let query = if claim.search_query.is_empty() {
            &claim.claim
        } else {
            &claim.search_query
        };

        let pages = match self.search.search(query, self.searches_per_claim).await {
            Ok(pages) => pages,
            Err(e) => {
                warn!(claim = %claim.claim, error = %e, "Search failed, recording claim as unverified");
                return degraded_judgment(&claim.claim, "search failed");
            }
        };

        if pages.is_empty() {
            return degraded_judgment(&claim.claim, "no sources found");
        }

        let mut evidence = String::new();
        for page in &pages {
            gathered_sources.push(Source::new(&page.title, &page.url));
            let excerpt: String = page.content.chars().take(EVIDENCE_CHARS).collect();
            evidence.push_str(&format!("--- {} ({})\n{}\n", page.title, page.url, excerpt));
        }

        let prompt = prompts::verify_claim(&claim.claim, &evidence);
        let outcome = match self.chat.chat(None, &prompt, VERIFY_MAX_TOKENS).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(claim = %claim.claim, error = %e, "Verification call failed");
                return degraded_judgment(&claim.claim, "verification call failed");
            }
        };

        match serde_json::from_str::<serde_json::Value>(strip_fences(&outcome.content)) {
            Ok(mut judgment) => {
                if let Some(obj) = judgment.as_object_mut() {
                    obj.insert("claim".to_string(), json!(claim.claim));
                    obj.insert("importance".to_string(), json!(claim.importance));
                    obj.insert(
                        "sources".to_string(),
                        json!(pages.iter().map(|p| &p.url).collect::<Vec<_>>()),
                    );
                }
                judgment
            }
            Err(_) => degraded_judgment(&claim.claim, "verdict was not parseable"),
        }
    }
}

/// Unverified, not false: a failed claim keeps a forgiving framing.
fn degraded_judgment(claim: &str, reason: &str) -> serde_json::Value {
    json!({
        "claim": claim,
        "status": "error",
        "is_accurate": "unverified",
        "confidence": "low",
        "correction": "",
        "explanation": format!("Could not verify this claim: {reason}"),
        "sources": []
    })
}

#[async_trait]
impl Analyzer for DeepResearch {
    fn mode(&self) -> AnalysisMode {
        AnalysisMode::DeepResearch
    }

    async fn analyze(
        &self,
        content: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RawAnalysis, VeracityError> {
        progress
            .update(10, Stage::Extracting, "Extracting factual claims...")
            .await;

        let extraction = self.extract(content).await?;
        if extraction.content_type.eq_ignore_ascii_case("satire") {
            info!("Content classified as satire, skipping verification");
            return Ok(RawAnalysis::new(satire_body(), SOURCE_CAP));
        }

        let claims: Vec<&ExtractedClaim> =
            extraction.claims.iter().take(self.max_claims).collect();
        if claims.is_empty() {
            return Ok(RawAnalysis::new(no_claims_body(), SOURCE_CAP));
        }

        progress
            .update(
                15,
                Stage::Extracting,
                format!("Found {} claims to verify", claims.len()).as_str(),
            )
            .await;

        let total = claims.len();
        let mut judgments = Vec::with_capacity(total);
        let mut gathered_sources = Vec::new();
        for (idx, claim) in claims.iter().enumerate() {
            let pct = 30 + ((idx as f64 / total as f64) * 50.0) as u8;
            progress
                .update(
                    pct,
                    Stage::Verifying,
                    format!("Verifying claim {} of {}", idx + 1, total).as_str(),
                )
                .await;
            judgments.push(self.verify(claim, &mut gathered_sources).await);
        }

        progress
            .update(85, Stage::Generating, "Generating final report...")
            .await;

        let judgments_json = serde_json::to_string(&judgments)
            .map_err(|e| VeracityError::Backend(e.to_string()))?;
        let prompt = prompts::synthesize(content, &judgments_json);
        let outcome = self.chat.chat(None, &prompt, SYNTHESIS_MAX_TOKENS).await?;

        progress
            .update(95, Stage::Generating, "Finalizing report...")
            .await;

        let mut raw = RawAnalysis::new(outcome.content, SOURCE_CAP);
        raw.fallback_sources = gathered_sources;
        Ok(raw)
    }
}
