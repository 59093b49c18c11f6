//! The four interchangeable backend strategies.
//!
//! Each strategy owns one call pattern against its provider(s) and
//! returns raw, pre-normalization output. The orchestrator picks one by
//! configured mode and never knows which provider is behind it.

pub mod claim_grounding;
pub mod deep_research;
pub mod heuristics;
pub mod quick_search;
pub mod research;

pub use claim_grounding::ClaimGrounding;
pub use deep_research::DeepResearch;
pub use quick_search::QuickSearch;
pub use research::Research;

use async_trait::async_trait;
use serde_json::json;

use veracity_common::{AnalysisMode, Source, VeracityError};

use crate::progress::ProgressSink;

/// Raw strategy output, handed to the normalizer.
#[derive(Debug, Clone)]
pub struct RawAnalysis {
    /// The backend's body text, expected (not guaranteed) to be JSON in
    /// the report shape.
    pub body: String,
    /// Sources extracted from transport metadata, separate from the body.
    pub fallback_sources: Vec<Source>,
    /// Backend-specific cap on the final source list.
    pub source_cap: usize,
    /// When true, fallback sources are merged ahead of body sources
    /// instead of only substituting for an empty list.
    pub prepend_sources: bool,
}

impl RawAnalysis {
    pub fn new(body: impl Into<String>, source_cap: usize) -> Self {
        RawAnalysis {
            body: body.into(),
            fallback_sources: Vec::new(),
            source_cap,
            prepend_sources: false,
        }
    }
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    fn mode(&self) -> AnalysisMode;

    /// Run the full analysis for `content`, reporting progress as phases
    /// advance. Unrecoverable provider failures surface as
    /// `VeracityError::Backend`.
    async fn analyze(
        &self,
        content: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RawAnalysis, VeracityError>;
}

/// Body for the satire short-circuit: perfect score, no calls made.
pub(crate) fn satire_body() -> String {
    json!({
        "score": 100,
        "status": "Satire",
        "description": "This is satirical content meant for entertainment.",
        "issues": [],
        "verified_facts": [],
        "sources": []
    })
    .to_string()
}

/// Body for content with nothing to verify.
pub(crate) fn no_claims_body() -> String {
    json!({
        "score": 100,
        "status": "Verified",
        "description": "No verifiable factual claims were found in this content; no verification was needed.",
        "issues": [],
        "verified_facts": [],
        "sources": []
    })
    .to_string()
}
