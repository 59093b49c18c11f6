//! Deep-research single-call strategy: one prompt to a model with
//! integrated, citation-returning web search. A local satire keyword
//! check runs first so satirical content costs nothing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use veracity_common::{AnalysisMode, Stage, VeracityError};

use crate::progress::ProgressSink;
use crate::prompts;
use crate::providers::ChatApi;
use crate::strategies::{heuristics, satire_body, Analyzer, RawAnalysis};

const SOURCE_CAP: usize = 15;
const MAX_TOKENS: u32 = 3000;

pub struct Research {
    chat: Arc<dyn ChatApi>,
}

impl Research {
    pub fn new(chat: Arc<dyn ChatApi>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Analyzer for Research {
    fn mode(&self) -> AnalysisMode {
        AnalysisMode::Research
    }

    async fn analyze(
        &self,
        content: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RawAnalysis, VeracityError> {
        progress
            .update(15, Stage::Analyzing, "Analyzing article content...")
            .await;

        if heuristics::is_satire(content) {
            info!("Satire markers detected, skipping research call");
            return Ok(RawAnalysis::new(satire_body(), SOURCE_CAP));
        }

        progress
            .update(30, Stage::Searching, "Researching claims...")
            .await;

        let prompt = prompts::research(content);
        let outcome = self.chat.chat(None, &prompt, MAX_TOKENS).await?;

        progress
            .update(50, Stage::Verifying, "Cross-checking citations...")
            .await;

        info!(
            citations = outcome.sources.len(),
            "Research call returned with transport citations"
        );

        progress
            .update(95, Stage::Generating, "Generating report...")
            .await;

        // Transport citations outrank body sources for this backend.
        let mut raw = RawAnalysis::new(outcome.content, SOURCE_CAP);
        raw.fallback_sources = outcome.sources;
        raw.prepend_sources = true;
        Ok(raw)
    }
}
