use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiClientError>;

#[derive(Debug, Error)]
pub enum AiClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response from provider")]
    EmptyResponse,
}

impl From<reqwest::Error> for AiClientError {
    fn from(err: reqwest::Error) -> Self {
        AiClientError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AiClientError {
    fn from(err: serde_json::Error) -> Self {
        AiClientError::Parse(err.to_string())
    }
}

/// Build an Api error, preferring the provider's own `error.message`
/// field when the body is structured JSON.
pub(crate) fn api_error(status: u16, body: &str) -> AiClientError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string());
    AiClientError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_prefers_structured_message() {
        let err = api_error(402, r#"{"error":{"message":"Insufficient credits"}}"#);
        assert_eq!(err.to_string(), "API error (status 402): Insufficient credits");
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error (status 502): Bad Gateway");
    }
}
