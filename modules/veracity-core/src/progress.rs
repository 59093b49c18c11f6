//! Ephemeral task progress records, plus the sink strategies write
//! through.
//!
//! Records expire whether or not the task completed; the poll path
//! treats a vanished record as "task not found", never as an error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use veracity_common::{Stage, TaskRecord, STARTING_PROGRESS};

/// How long a task record survives after its last write.
const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn put(&self, task_id: &str, record: TaskRecord);
    async fn get(&self, task_id: &str) -> Option<TaskRecord>;
}

pub struct MemoryProgressStore {
    entries: RwLock<HashMap<String, (TaskRecord, Instant)>>,
    ttl: Duration,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for MemoryProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn put(&self, task_id: &str, record: TaskRecord) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Piggyback pruning on writes so abandoned tasks don't pile up.
        let ttl = self.ttl;
        entries.retain(|_, (_, written)| written.elapsed() <= ttl);
        entries.insert(task_id.to_string(), (record, Instant::now()));
    }

    async fn get(&self, task_id: &str) -> Option<TaskRecord> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let (record, written) = entries.get(task_id)?;
        if written.elapsed() > self.ttl {
            return None;
        }
        Some(record.clone())
    }
}

// ---------------------------------------------------------------------------
// ProgressSink
// ---------------------------------------------------------------------------

/// What a strategy sees of progress reporting: fire-and-forget updates.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn update(&self, progress: u8, stage: Stage, message: &str);
}

/// Sink bound to one task. Clamps progress to be non-decreasing across
/// the task's lifetime regardless of what the strategy reports.
pub struct MonotonicSink {
    store: Arc<dyn ProgressStore>,
    task_id: String,
    last: AtomicU8,
}

impl MonotonicSink {
    pub fn new(store: Arc<dyn ProgressStore>, task_id: impl Into<String>) -> Self {
        // The high-water mark starts where the seeded record left off, so
        // an error before the first strategy update never regresses it.
        Self {
            store,
            task_id: task_id.into(),
            last: AtomicU8::new(STARTING_PROGRESS),
        }
    }

    /// Last progress value written; the error record keeps it.
    pub fn last(&self) -> u8 {
        self.last.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProgressSink for MonotonicSink {
    async fn update(&self, progress: u8, stage: Stage, message: &str) {
        let clamped = self.last.fetch_max(progress.min(100), Ordering::Relaxed);
        let progress = clamped.max(progress.min(100));
        self.store
            .put(&self.task_id, TaskRecord::processing(progress, stage, message))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veracity_common::TaskStatus;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryProgressStore::new();
        store.put("t1", TaskRecord::starting()).await;
        let record = store.get("t1").await.unwrap();
        assert_eq!(record.progress, 5);
        assert_eq!(store.get("t2").await, None);
    }

    #[tokio::test]
    async fn expired_records_read_as_absent() {
        let store = MemoryProgressStore::with_ttl(Duration::from_millis(10));
        store.put("t1", TaskRecord::starting()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("t1").await, None);
    }

    #[tokio::test]
    async fn final_write_recreates_an_expired_record() {
        let store = MemoryProgressStore::with_ttl(Duration::from_millis(10));
        store.put("t1", TaskRecord::starting()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        store.put("t1", TaskRecord::error(40, "backend failed")).await;
        let record = store.get("t1").await.unwrap();
        assert_eq!(record.status, TaskStatus::Error);
    }

    #[tokio::test]
    async fn sink_keeps_progress_non_decreasing() {
        let store = Arc::new(MemoryProgressStore::new());
        let sink = MonotonicSink::new(store.clone(), "t1");

        sink.update(30, Stage::Searching, "searching").await;
        sink.update(60, Stage::Verifying, "verifying").await;
        // A regressing report keeps the high-water mark
        sink.update(20, Stage::Verifying, "still verifying").await;

        let record = store.get("t1").await.unwrap();
        assert_eq!(record.progress, 60);
        assert_eq!(sink.last(), 60);
    }

    #[tokio::test]
    async fn fresh_sink_starts_at_the_seeded_progress() {
        let store = Arc::new(MemoryProgressStore::new());
        let sink = MonotonicSink::new(store.clone(), "t1");
        assert_eq!(sink.last(), 5);

        // A strategy reporting below the seeded value is clamped up
        sink.update(3, Stage::Analyzing, "warming up").await;
        let record = store.get("t1").await.unwrap();
        assert_eq!(record.progress, 5);
    }
}
