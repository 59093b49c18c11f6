//! Request-supplied content store for headless deployments: callers may
//! POST article text inline, and the orchestrator fetches it back by id.
//! Fetching removes the entry, so the map holds only texts awaiting
//! pickup and never grows across requests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use veracity_common::VeracityError;
use veracity_core::ContentSource;

pub struct InlineContentStore {
    texts: RwLock<HashMap<String, String>>,
}

impl InlineContentStore {
    pub fn new() -> Self {
        Self {
            texts: RwLock::new(HashMap::new()),
        }
    }

    pub fn put(&self, content_id: &str, text: &str) {
        self.texts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(content_id.to_string(), text.to_string());
    }
}

impl Default for InlineContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentSource for InlineContentStore {
    async fn fetch(&self, content_id: &str) -> Result<String, VeracityError> {
        self.texts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(content_id)
            .ok_or_else(|| {
                VeracityError::Content(format!("No content found for id {content_id}"))
            })
    }
}
