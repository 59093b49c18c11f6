//! Test mocks for the trait boundaries.
//!
//! One mock per trait, HashMap-backed with builder registration, plus
//! call counters so tests can assert how many provider calls a path
//! made (cache idempotence, satire short-circuit).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::future::BoxFuture;

use veracity_common::{AnalysisMode, Source, Stage, VeracityError};

use crate::ledger::{Caller, Identity};
use crate::progress::ProgressSink;
use crate::providers::{ChatApi, ChatOutcome, ClaimJudgment, EvidencePage, GroundingApi, SearchApi};
use crate::strategies::{Analyzer, RawAnalysis};
use crate::traits::{BackgroundRunner, ContentSource, UserDirectory};

// ---------------------------------------------------------------------------
// MockChat
// ---------------------------------------------------------------------------

/// Prompt-substring-routed chat mock. Registered routes win over the
/// default; an unrouted prompt with no default is an error.
pub struct MockChat {
    routes: Vec<(String, String)>,
    default: Option<String>,
    default_sources: Vec<Source>,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockChat {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            default: None,
            default_sources: Vec::new(),
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_prompt_containing(mut self, needle: &str, response: impl Into<String>) -> Self {
        self.routes.push((needle.to_string(), response.into()));
        self
    }

    pub fn with_default(mut self, response: impl Into<String>) -> Self {
        self.default = Some(response.into());
        self
    }

    /// Transport-level sources attached to every response.
    pub fn with_default_sources(mut self, sources: Vec<Source>) -> Self {
        self.default_sources = sources;
        self
    }

    /// Make every call fail, as a timed-out or rejected provider would.
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatApi for MockChat {
    async fn chat(
        &self,
        _system: Option<&str>,
        prompt: &str,
        _max_tokens: u32,
    ) -> Result<ChatOutcome, VeracityError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(ref message) = self.fail_with {
            return Err(VeracityError::Backend(message.clone()));
        }
        let content = self
            .routes
            .iter()
            .find(|(needle, _)| prompt.contains(needle))
            .map(|(_, response)| response.clone())
            .or_else(|| self.default.clone())
            .ok_or_else(|| {
                VeracityError::Backend(format!(
                    "MockChat: no response registered for prompt: {}",
                    &prompt[..prompt.len().min(80)]
                ))
            })?;
        Ok(ChatOutcome {
            content,
            sources: self.default_sources.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockSearch
// ---------------------------------------------------------------------------

pub struct MockSearch {
    results: HashMap<String, Vec<EvidencePage>>,
    fail_queries: Vec<String>,
    calls: AtomicUsize,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            fail_queries: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_query(mut self, query: &str, pages: Vec<EvidencePage>) -> Self {
        self.results.insert(query.to_string(), pages);
        self
    }

    /// Fail any query containing this substring.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_queries.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SearchApi for MockSearch {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<EvidencePage>, VeracityError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_queries.iter().any(|n| query.contains(n)) {
            return Err(VeracityError::Backend("search provider unavailable".to_string()));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockGrounding
// ---------------------------------------------------------------------------

pub struct MockGrounding {
    routes: Vec<(String, ClaimJudgment)>,
    default: Option<ClaimJudgment>,
    fail_claims: Vec<String>,
    calls: AtomicUsize,
}

impl MockGrounding {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            default: None,
            fail_claims: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_claim_containing(mut self, needle: &str, judgment: ClaimJudgment) -> Self {
        self.routes.push((needle.to_string(), judgment));
        self
    }

    pub fn with_default(mut self, judgment: ClaimJudgment) -> Self {
        self.default = Some(judgment);
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_claims.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GroundingApi for MockGrounding {
    async fn ground(&self, claim: &str) -> Result<ClaimJudgment, VeracityError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_claims.iter().any(|n| claim.contains(n)) {
            return Err(VeracityError::Backend("grounding provider unavailable".to_string()));
        }
        self.routes
            .iter()
            .find(|(needle, _)| claim.contains(needle))
            .map(|(_, judgment)| judgment.clone())
            .or_else(|| self.default.clone())
            .ok_or_else(|| {
                VeracityError::Backend(format!("MockGrounding: no judgment registered for {claim}"))
            })
    }
}

// ---------------------------------------------------------------------------
// MockContentSource
// ---------------------------------------------------------------------------

pub struct MockContentSource {
    texts: HashMap<String, String>,
}

impl MockContentSource {
    pub fn new() -> Self {
        Self {
            texts: HashMap::new(),
        }
    }

    pub fn on_id(mut self, content_id: &str, text: &str) -> Self {
        self.texts.insert(content_id.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl ContentSource for MockContentSource {
    async fn fetch(&self, content_id: &str) -> Result<String, VeracityError> {
        self.texts
            .get(content_id)
            .cloned()
            .ok_or_else(|| VeracityError::Content(format!("No content with id {content_id}")))
    }
}

// ---------------------------------------------------------------------------
// FixedDirectory
// ---------------------------------------------------------------------------

/// Resolves every caller to one preset identity.
pub struct FixedDirectory(pub Identity);

#[async_trait]
impl UserDirectory for FixedDirectory {
    async fn resolve(&self, _caller: &Caller) -> Identity {
        self.0.clone()
    }
}

// ---------------------------------------------------------------------------
// InlineRunner
// ---------------------------------------------------------------------------

/// Collects spawned tasks for the test to drive explicitly, making the
/// background phase deterministic.
pub struct InlineRunner {
    pending: Mutex<Vec<BoxFuture<'static, ()>>>,
}

impl InlineRunner {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Run every spawned task to completion, in spawn order.
    pub async fn run_all(&self) {
        loop {
            let task = {
                let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
                if pending.is_empty() {
                    break;
                }
                pending.remove(0)
            };
            task.await;
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl BackgroundRunner for InlineRunner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(task);
    }
}

// ---------------------------------------------------------------------------
// CountingSink
// ---------------------------------------------------------------------------

/// Progress sink that records every update for assertions.
pub struct CountingSink {
    updates: Mutex<Vec<(u8, Stage, String)>>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn percentages(&self) -> Vec<u8> {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(pct, _, _)| *pct)
            .collect()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, stage, _)| *stage)
            .collect()
    }
}

#[async_trait]
impl ProgressSink for CountingSink {
    async fn update(&self, progress: u8, stage: Stage, message: &str) {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((progress, stage, message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// MockAnalyzer
// ---------------------------------------------------------------------------

/// Strategy stand-in for orchestrator tests: fixed body or fixed error,
/// with a call counter.
pub struct MockAnalyzer {
    mode: AnalysisMode,
    body: Option<String>,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockAnalyzer {
    pub fn returning(mode: AnalysisMode, body: impl Into<String>) -> Self {
        Self {
            mode,
            body: Some(body.into()),
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(mode: AnalysisMode, message: &str) -> Self {
        Self {
            mode,
            body: None,
            fail_with: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    fn mode(&self) -> AnalysisMode {
        self.mode
    }

    async fn analyze(
        &self,
        _content: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RawAnalysis, VeracityError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(ref message) = self.fail_with {
            progress
                .update(40, Stage::Verifying, "Verifying claims...")
                .await;
            return Err(VeracityError::Backend(message.clone()));
        }
        progress
            .update(60, Stage::Verifying, "Verifying claims...")
            .await;
        Ok(RawAnalysis::new(
            self.body.clone().unwrap_or_default(),
            8,
        ))
    }
}
