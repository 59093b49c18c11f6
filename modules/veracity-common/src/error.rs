use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeracityError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage limit exceeded")]
    QuotaExceeded,

    #[error("Content error: {0}")]
    Content(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Task not found or expired")]
    TaskNotFound,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl VeracityError {
    /// Message safe to show a polling client. Backend failures keep their
    /// provider-supplied text (already status-line level, no stack traces).
    pub fn user_message(&self) -> String {
        match self {
            VeracityError::QuotaExceeded => {
                "Usage limit exceeded. Please sign up for unlimited access.".to_string()
            }
            VeracityError::Anyhow(_) => "Analysis failed unexpectedly".to_string(),
            other => other.to_string(),
        }
    }
}
