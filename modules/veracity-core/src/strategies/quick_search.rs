//! Quick-search strategy: one chat call to a web-search-capable model
//! that identifies and judges claims in a single pass.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use veracity_common::{AnalysisMode, Stage, VeracityError};

use crate::progress::ProgressSink;
use crate::prompts;
use crate::providers::ChatApi;
use crate::strategies::{Analyzer, RawAnalysis};

const SOURCE_CAP: usize = 8;
const MAX_TOKENS: u32 = 2000;

pub struct QuickSearch {
    chat: Arc<dyn ChatApi>,
}

impl QuickSearch {
    pub fn new(chat: Arc<dyn ChatApi>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Analyzer for QuickSearch {
    fn mode(&self) -> AnalysisMode {
        AnalysisMode::QuickSearch
    }

    async fn analyze(
        &self,
        content: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RawAnalysis, VeracityError> {
        progress
            .update(20, Stage::Analyzing, "Analyzing article content...")
            .await;

        let prompt = prompts::quick_search(content);
        let outcome = self.chat.chat(None, &prompt, MAX_TOKENS).await?;

        progress
            .update(60, Stage::Verifying, "Verifying claims against web sources...")
            .await;

        info!(
            body_len = outcome.content.len(),
            annotation_sources = outcome.sources.len(),
            "Quick-search call finished"
        );

        progress
            .update(90, Stage::Generating, "Generating report...")
            .await;

        let mut raw = RawAnalysis::new(outcome.content, SOURCE_CAP);
        raw.fallback_sources = outcome.sources;
        Ok(raw)
    }
}
