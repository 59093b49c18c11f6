use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Processing,
    Complete,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Starting,
    Extracting,
    Analyzing,
    Searching,
    Verifying,
    Generating,
    Complete,
}

/// Ephemeral progress record read verbatim by the polling client.
/// Mutated in place as the strategy advances; expires via the progress
/// store TTL whether or not the task completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    pub progress: u8,
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Report>,
}

/// Progress a freshly created task starts at, before any strategy update.
pub const STARTING_PROGRESS: u8 = 5;

impl TaskRecord {
    pub fn starting() -> Self {
        TaskRecord {
            status: TaskStatus::Processing,
            progress: STARTING_PROGRESS,
            stage: Stage::Starting,
            message: "Starting fact check...".to_string(),
            result: None,
        }
    }

    pub fn processing(progress: u8, stage: Stage, message: impl Into<String>) -> Self {
        TaskRecord {
            status: TaskStatus::Processing,
            progress,
            stage,
            message: message.into(),
            result: None,
        }
    }

    pub fn complete(report: Report, message: impl Into<String>) -> Self {
        TaskRecord {
            status: TaskStatus::Complete,
            progress: 100,
            stage: Stage::Complete,
            message: message.into(),
            result: Some(report),
        }
    }

    pub fn error(progress: u8, message: impl Into<String>) -> Self {
        TaskRecord {
            status: TaskStatus::Error,
            progress,
            stage: Stage::Complete,
            message: message.into(),
            result: None,
        }
    }
}

/// Task ids embed the content identifier plus a random component, so two
/// checks of the same article never collide.
pub fn new_task_id(content_id: &str) -> String {
    format!("check-{}-{}", content_id, Uuid::new_v4())
}
