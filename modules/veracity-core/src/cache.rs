//! Content-addressed report cache with a freshness window.
//!
//! Keys are `content_hash(text, mode)`; a hit within the window means no
//! backend is ever invoked for that (content, mode) pair.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use veracity_common::Report;

/// Reports older than this are treated as misses.
const FRESHNESS_WINDOW_HOURS: i64 = 24;

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Report>;
    /// Upsert; a new report for the same key replaces the prior one.
    async fn set(&self, key: &str, report: Report);
    /// Operator action: drop everything.
    async fn invalidate_all(&self);
}

pub struct MemoryCache {
    entries: RwLock<HashMap<String, (Report, DateTime<Utc>)>>,
    window: Duration,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            window: Duration::hours(FRESHNESS_WINDOW_HOURS),
        }
    }

    /// Insert with an explicit write timestamp, for expiry tests.
    pub fn set_at(&self, key: &str, report: Report, written_at: DateTime<Utc>) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), (report, written_at));
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Report> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let (report, written_at) = entries.get(key)?;
        // Expired entries are misses; eviction stays lazy.
        if Utc::now() - *written_at > self.window {
            return None;
        }
        Some(report.clone())
    }

    async fn set(&self, key: &str, report: Report) {
        self.set_at(key, report, Utc::now());
    }

    async fn invalidate_all(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veracity_common::AnalysisMode;

    fn report() -> Report {
        Report::satire(AnalysisMode::Research)
    }

    #[tokio::test]
    async fn round_trip_within_window() {
        let cache = MemoryCache::new();
        cache.set("k1", report()).await;
        assert_eq!(cache.get("k1").await, Some(report()));
        assert_eq!(cache.get("other").await, None);
    }

    #[tokio::test]
    async fn stale_entries_are_misses() {
        let cache = MemoryCache::new();
        cache.set_at("k1", report(), Utc::now() - Duration::hours(25));
        assert_eq!(cache.get("k1").await, None);

        cache.set_at("k2", report(), Utc::now() - Duration::hours(23));
        assert!(cache.get("k2").await.is_some());
    }

    #[tokio::test]
    async fn set_is_an_upsert() {
        let cache = MemoryCache::new();
        cache.set("k1", report()).await;
        let mut updated = report();
        updated.description = "replaced".to_string();
        cache.set("k1", updated.clone()).await;
        assert_eq!(cache.get("k1").await, Some(updated));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn invalidate_all_empties_the_cache() {
        let cache = MemoryCache::new();
        cache.set("k1", report()).await;
        cache.set("k2", report()).await;
        cache.invalidate_all().await;
        assert!(cache.is_empty());
    }
}
