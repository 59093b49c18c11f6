//! Trait abstractions for the orchestrator's boundary collaborators.
//!
//! Each one exists so tests can substitute an in-memory fake: no
//! network, no real content store, no detached tasks.

use async_trait::async_trait;
use futures::future::BoxFuture;

use veracity_common::VeracityError;

use crate::ledger::{Caller, Identity};

// ---------------------------------------------------------------------------
// ContentSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Resolve a content identifier to its text. May still contain
    /// markup; the orchestrator strips and truncates before analysis.
    async fn fetch(&self, content_id: &str) -> Result<String, VeracityError>;
}

// ---------------------------------------------------------------------------
// UserDirectory
// ---------------------------------------------------------------------------

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve(&self, caller: &Caller) -> Identity;
}

/// Default resolution: session identity wins, then a stored email, then
/// the source IP.
pub struct SessionDirectory;

#[async_trait]
impl UserDirectory for SessionDirectory {
    async fn resolve(&self, caller: &Caller) -> Identity {
        if let Some(ref email) = caller.session_email {
            return Identity::Authenticated(email.clone());
        }
        if let Some(ref email) = caller.cookie_email {
            return Identity::Email(email.clone());
        }
        Identity::Ip(caller.ip.clone())
    }
}

// ---------------------------------------------------------------------------
// BackgroundRunner
// ---------------------------------------------------------------------------

/// Fire-and-forget execution outside the request path. The runner
/// guarantees at-least-once execution; nothing more.
pub trait BackgroundRunner: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

pub struct TokioRunner;

impl BackgroundRunner for TokioRunner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolution_prefers_session_then_cookie_then_ip() {
        let directory = SessionDirectory;

        let caller = Caller {
            session_email: Some("staff@example.com".into()),
            cookie_email: Some("reader@example.com".into()),
            ip: "10.0.0.1".into(),
        };
        assert_eq!(
            directory.resolve(&caller).await,
            Identity::Authenticated("staff@example.com".into())
        );

        let caller = Caller {
            session_email: None,
            cookie_email: Some("reader@example.com".into()),
            ip: "10.0.0.1".into(),
        };
        assert_eq!(
            directory.resolve(&caller).await,
            Identity::Email("reader@example.com".into())
        );

        let caller = Caller {
            session_email: None,
            cookie_email: None,
            ip: "10.0.0.1".into(),
        };
        assert_eq!(directory.resolve(&caller).await, Identity::Ip("10.0.0.1".into()));
    }
}
