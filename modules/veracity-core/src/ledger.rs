//! Per-identity usage tracking for the free tier.
//!
//! Identity resolution order: authenticated session (always unlimited,
//! never recorded) → stored email → source IP. A never-seen identity can
//! use the service; the quota bites once its count reaches the limit.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// What the HTTP layer knows about a caller before resolution.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    /// Set only for authenticated sessions.
    pub session_email: Option<String>,
    /// Email previously captured and stored client-side.
    pub cookie_email: Option<String>,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Authenticated callers are unlimited and leave no usage record.
    Authenticated(String),
    Email(String),
    Ip(String),
}

impl Identity {
    fn key(&self) -> Option<String> {
        match self {
            Identity::Authenticated(_) => None,
            Identity::Email(e) => Some(format!("email:{}", e.trim().to_lowercase())),
            Identity::Ip(ip) => Some(format!("ip:{ip}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageStatus {
    pub can_use: bool,
    pub usage_count: u32,
    pub is_registered: bool,
}

#[async_trait]
pub trait UsageLedger: Send + Sync {
    async fn status(&self, identity: &Identity) -> UsageStatus;
    /// One completed free-tier analysis. No-op for registered and
    /// authenticated identities.
    async fn increment(&self, identity: &Identity);
    /// Promote to unlimited. Idempotent.
    async fn register(&self, identity: &Identity);
    /// Record a captured email so later calls can resolve to it.
    async fn save_email(&self, email: &str);
}

#[derive(Debug, Clone, Default)]
struct LedgerRecord {
    count: u32,
    is_registered: bool,
    last_used: Option<DateTime<Utc>>,
}

pub struct MemoryLedger {
    records: RwLock<HashMap<String, LedgerRecord>>,
    free_limit: u32,
}

impl MemoryLedger {
    pub fn new(free_limit: u32) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            free_limit,
        }
    }

    /// Seed an identity at a given count, for quota tests.
    pub fn with_usage(self, identity: &Identity, count: u32) -> Self {
        if let Some(key) = identity.key() {
            self.records
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(
                    key,
                    LedgerRecord {
                        count,
                        ..Default::default()
                    },
                );
        }
        self
    }
}

#[async_trait]
impl UsageLedger for MemoryLedger {
    async fn status(&self, identity: &Identity) -> UsageStatus {
        let Some(key) = identity.key() else {
            return UsageStatus {
                can_use: true,
                usage_count: 0,
                is_registered: true,
            };
        };
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let record = records.get(&key).cloned().unwrap_or_default();
        UsageStatus {
            can_use: record.is_registered || record.count < self.free_limit,
            usage_count: record.count,
            is_registered: record.is_registered,
        }
    }

    async fn increment(&self, identity: &Identity) {
        let Some(key) = identity.key() else {
            return;
        };
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let record = records.entry(key.clone()).or_default();
        // Re-check under the lock: registration may have landed between
        // the pre-flight status read and this increment.
        if record.is_registered {
            return;
        }
        record.count += 1;
        record.last_used = Some(Utc::now());
        debug!(identity = %key, count = record.count, "Usage incremented");
    }

    async fn register(&self, identity: &Identity) {
        let Some(key) = identity.key() else {
            return;
        };
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.entry(key).or_default().is_registered = true;
    }

    async fn save_email(&self, email: &str) {
        let identity = Identity::Email(email.to_string());
        let Some(key) = identity.key() else {
            return;
        };
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.entry(key).or_default();
    }
}
