//! The task orchestrator: pre-flight checks, task creation, and the
//! background analysis body that ties cache, ledger, strategy, and
//! normalizer together.
//!
//! Task states: created → processing → {complete | error}, all visible
//! to the poller through the progress store.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use veracity_common::{
    content_hash, new_task_id, prepare_content, AnalysisMode, Report, Settings, TaskRecord,
    VeracityError,
};

use crate::cache::ResultCache;
use crate::ledger::{Caller, Identity, UsageLedger};
use crate::normalize::normalize;
use crate::progress::{MonotonicSink, ProgressStore};
use crate::strategies::Analyzer;
use crate::traits::{BackgroundRunner, ContentSource, UserDirectory};

pub struct Orchestrator {
    settings: Settings,
    content: Arc<dyn ContentSource>,
    directory: Arc<dyn UserDirectory>,
    cache: Arc<dyn ResultCache>,
    ledger: Arc<dyn UsageLedger>,
    progress: Arc<dyn ProgressStore>,
    runner: Arc<dyn BackgroundRunner>,
    analyzers: HashMap<AnalysisMode, Arc<dyn Analyzer>>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Settings,
        content: Arc<dyn ContentSource>,
        directory: Arc<dyn UserDirectory>,
        cache: Arc<dyn ResultCache>,
        ledger: Arc<dyn UsageLedger>,
        progress: Arc<dyn ProgressStore>,
        runner: Arc<dyn BackgroundRunner>,
        analyzers: Vec<Arc<dyn Analyzer>>,
    ) -> Self {
        let analyzers = analyzers.into_iter().map(|a| (a.mode(), a)).collect();
        Self {
            settings,
            content,
            directory,
            cache,
            ledger,
            progress,
            runner,
            analyzers,
        }
    }

    /// Create an analysis task. All three pre-flight checks run
    /// synchronously so the caller gets an immediate rejection instead
    /// of a doomed task to poll.
    pub async fn start_analysis(
        self: &Arc<Self>,
        content_id: &str,
        caller: &Caller,
    ) -> Result<String, VeracityError> {
        let raw_text = self.content.fetch(content_id).await?;
        let text = prepare_content(&raw_text);
        if text.trim().is_empty() {
            return Err(VeracityError::Content(
                "Content is empty or has no analyzable text".to_string(),
            ));
        }

        let mode = self.settings.mode;
        self.settings.check_credentials(mode)?;

        let identity = self.directory.resolve(caller).await;
        let status = self.ledger.status(&identity).await;
        if !status.can_use {
            warn!(content_id, "Free usage limit reached");
            return Err(VeracityError::QuotaExceeded);
        }

        let task_id = new_task_id(content_id);
        self.progress.put(&task_id, TaskRecord::starting()).await;

        info!(%task_id, %mode, content_id, "Analysis task created");

        let this = Arc::clone(self);
        let spawned_id = task_id.clone();
        self.runner.spawn(Box::pin(async move {
            this.run_analysis(&spawned_id, &text, identity, mode).await;
        }));

        Ok(task_id)
    }

    /// Read the current task record. Absent or expired records are
    /// `TaskNotFound`, a different case from a task that errored.
    pub async fn get_progress(&self, task_id: &str) -> Result<TaskRecord, VeracityError> {
        self.progress
            .get(task_id)
            .await
            .ok_or(VeracityError::TaskNotFound)
    }

    /// Drop all cached reports. Operator action.
    pub async fn invalidate_cache(&self) {
        self.cache.invalidate_all().await;
    }

    /// The background body. Never returns an error: every failure lands
    /// in the task record instead.
    async fn run_analysis(&self, task_id: &str, text: &str, identity: Identity, mode: AnalysisMode) {
        let key = content_hash(text, mode);

        if let Some(report) = self.cache.get(&key).await {
            info!(%task_id, "Result cache hit, completing immediately");
            self.complete(task_id, report).await;
            return;
        }

        let sink = MonotonicSink::new(Arc::clone(&self.progress), task_id);
        match self.execute(text, mode, &sink).await {
            Ok(report) => {
                // Cache before billing: a crash between the two costs an
                // extra free use, never a cached-but-unbilled report.
                self.cache.set(&key, report.clone()).await;
                self.ledger.increment(&identity).await;
                self.complete(task_id, report).await;
            }
            Err(e) => {
                error!(%task_id, error = %e, "Analysis failed");
                self.progress
                    .put(task_id, TaskRecord::error(sink.last(), e.user_message()))
                    .await;
            }
        }
    }

    async fn execute(
        &self,
        text: &str,
        mode: AnalysisMode,
        sink: &MonotonicSink,
    ) -> Result<Report, VeracityError> {
        let analyzer = self
            .analyzers
            .get(&mode)
            .ok_or_else(|| VeracityError::Config(format!("No analyzer available for {mode}")))?;
        let raw = analyzer.analyze(text, sink).await?;
        Ok(normalize(&raw, mode))
    }

    async fn complete(&self, task_id: &str, report: Report) {
        self.progress
            .put(
                task_id,
                TaskRecord::complete(report, "Analysis complete"),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::ledger::MemoryLedger;
    use crate::progress::MemoryProgressStore;
    use crate::testing::{FixedDirectory, InlineRunner, MockAnalyzer, MockContentSource};
    use veracity_common::{ReportStatus, TaskStatus};

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        runner: Arc<InlineRunner>,
        cache: Arc<MemoryCache>,
        ledger: Arc<MemoryLedger>,
        analyzer: Arc<MockAnalyzer>,
    }

    fn caller() -> Caller {
        Caller {
            session_email: None,
            cookie_email: None,
            ip: "10.0.0.1".into(),
        }
    }

    fn harness_with(analyzer: MockAnalyzer, ledger: MemoryLedger) -> Harness {
        let mode = analyzer.mode();
        let analyzer = Arc::new(analyzer);
        let runner = Arc::new(InlineRunner::new());
        let cache = Arc::new(MemoryCache::new());
        let ledger = Arc::new(ledger);
        let content = MockContentSource::new()
            .on_id("42", "The sky is blue.")
            .on_id("empty", "   <p>  </p> ");
        let orchestrator = Arc::new(Orchestrator::new(
            Settings::for_tests(mode),
            Arc::new(content),
            Arc::new(FixedDirectory(Identity::Ip("10.0.0.1".into()))),
            cache.clone(),
            ledger.clone(),
            Arc::new(MemoryProgressStore::new()),
            runner.clone(),
            vec![analyzer.clone()],
        ));
        Harness {
            orchestrator,
            runner,
            cache,
            ledger,
            analyzer,
        }
    }

    fn quick_search_harness(body: &str) -> Harness {
        harness_with(
            MockAnalyzer::returning(AnalysisMode::QuickSearch, body),
            MemoryLedger::new(5),
        )
    }

    #[tokio::test]
    async fn trivial_article_completes_with_report() {
        let h = quick_search_harness(r#"{"score":98,"status":"Verified","issues":[],"sources":[]}"#);
        let task_id = h.orchestrator.start_analysis("42", &caller()).await.unwrap();
        assert!(task_id.starts_with("check-42-"));

        // Poller sees the seeded record before the background body runs
        let record = h.orchestrator.get_progress(&task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Processing);
        assert_eq!(record.progress, 5);

        h.runner.run_all().await;

        let record = h.orchestrator.get_progress(&task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Complete);
        assert_eq!(record.progress, 100);
        let report = record.result.unwrap();
        assert_eq!(report.score, 98);
        assert_eq!(report.status, ReportStatus::Verified);
    }

    #[tokio::test]
    async fn second_identical_request_is_served_from_cache() {
        let h = quick_search_harness(r#"{"score":98,"status":"Verified"}"#);

        let first = h.orchestrator.start_analysis("42", &caller()).await.unwrap();
        h.runner.run_all().await;
        assert_eq!(h.analyzer.calls(), 1);

        let second = h.orchestrator.start_analysis("42", &caller()).await.unwrap();
        assert_ne!(first, second);
        h.runner.run_all().await;

        // Zero additional backend invocations
        assert_eq!(h.analyzer.calls(), 1);
        let record = h.orchestrator.get_progress(&second).await.unwrap();
        assert_eq!(record.status, TaskStatus::Complete);
        assert_eq!(record.result.unwrap().score, 98);
    }

    #[tokio::test]
    async fn cache_hit_does_not_consume_quota() {
        let h = quick_search_harness(r#"{"score":98}"#);
        let identity = Identity::Ip("10.0.0.1".into());

        h.orchestrator.start_analysis("42", &caller()).await.unwrap();
        h.runner.run_all().await;
        assert_eq!(h.ledger.status(&identity).await.usage_count, 1);

        h.orchestrator.start_analysis("42", &caller()).await.unwrap();
        h.runner.run_all().await;
        assert_eq!(h.ledger.status(&identity).await.usage_count, 1);
    }

    #[tokio::test]
    async fn backend_failure_lands_in_the_task_record_and_skips_cache() {
        let h = harness_with(
            MockAnalyzer::failing(AnalysisMode::QuickSearch, "request timed out"),
            MemoryLedger::new(5),
        );
        let task_id = h.orchestrator.start_analysis("42", &caller()).await.unwrap();
        h.runner.run_all().await;

        let record = h.orchestrator.get_progress(&task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Error);
        assert!(!record.message.is_empty());
        assert!(record.result.is_none());
        // The error record keeps the last reported progress
        assert_eq!(record.progress, 40);
        // No cache entry, and no usage billed
        assert!(h.cache.is_empty());
        let identity = Identity::Ip("10.0.0.1".into());
        assert_eq!(h.ledger.status(&identity).await.usage_count, 0);
    }

    #[tokio::test]
    async fn failure_before_any_update_keeps_the_seeded_progress() {
        // Only a Research analyzer is registered, so a QuickSearch run
        // errors before the strategy ever reports progress.
        let analyzer = MockAnalyzer::returning(AnalysisMode::Research, "{}");
        let runner = Arc::new(InlineRunner::new());
        let orchestrator = Arc::new(Orchestrator::new(
            Settings::for_tests(AnalysisMode::QuickSearch),
            Arc::new(MockContentSource::new().on_id("42", "The sky is blue.")),
            Arc::new(FixedDirectory(Identity::Ip("10.0.0.1".into()))),
            Arc::new(MemoryCache::new()),
            Arc::new(MemoryLedger::new(5)),
            Arc::new(MemoryProgressStore::new()),
            runner.clone(),
            vec![Arc::new(analyzer)],
        ));

        let task_id = orchestrator.start_analysis("42", &caller()).await.unwrap();
        runner.run_all().await;

        let record = orchestrator.get_progress(&task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Error);
        assert_eq!(record.progress, 5);
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_task_creation() {
        let h = quick_search_harness("{}");
        let err = h
            .orchestrator
            .start_analysis("empty", &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, VeracityError::Content(_)));
        assert_eq!(h.runner.pending_count(), 0);
    }

    #[tokio::test]
    async fn missing_credentials_are_rejected_before_task_creation() {
        let analyzer = MockAnalyzer::returning(AnalysisMode::QuickSearch, "{}");
        let mode = analyzer.mode();
        let mut settings = Settings::for_tests(mode);
        settings.openrouter_api_key.clear();

        let runner = Arc::new(InlineRunner::new());
        let orchestrator = Arc::new(Orchestrator::new(
            settings,
            Arc::new(MockContentSource::new().on_id("42", "The sky is blue.")),
            Arc::new(FixedDirectory(Identity::Ip("10.0.0.1".into()))),
            Arc::new(MemoryCache::new()),
            Arc::new(MemoryLedger::new(5)),
            Arc::new(MemoryProgressStore::new()),
            runner.clone(),
            vec![Arc::new(analyzer)],
        ));

        let err = orchestrator.start_analysis("42", &caller()).await.unwrap_err();
        assert!(matches!(err, VeracityError::Config(_)));
        assert_eq!(runner.pending_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_quota_rejects_synchronously() {
        let identity = Identity::Ip("10.0.0.1".into());
        let h = harness_with(
            MockAnalyzer::returning(AnalysisMode::QuickSearch, "{}"),
            MemoryLedger::new(2).with_usage(&identity, 2),
        );
        let err = h.orchestrator.start_analysis("42", &caller()).await.unwrap_err();
        assert!(matches!(err, VeracityError::QuotaExceeded));
        assert_eq!(h.analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_task_id_is_not_found_not_error() {
        let h = quick_search_harness("{}");
        let err = h.orchestrator.get_progress("check-9-nope").await.unwrap_err();
        assert!(matches!(err, VeracityError::TaskNotFound));
    }
}
