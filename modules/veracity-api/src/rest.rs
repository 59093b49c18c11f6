//! REST handlers for the polling fact-check API.

use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use veracity_common::VeracityError;
use veracity_core::{Caller, Identity};

use crate::AppState;

#[derive(Deserialize)]
pub struct CheckRequest {
    pub content_id: String,
    /// Email previously captured for this visitor, if any.
    pub email: Option<String>,
    /// Inline article text for headless deployments without a CMS.
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

fn error_response(err: &VeracityError) -> (StatusCode, Json<serde_json::Value>) {
    let (status, code) = match err {
        VeracityError::QuotaExceeded => (StatusCode::TOO_MANY_REQUESTS, "quota_exceeded"),
        VeracityError::Content(_) => (StatusCode::BAD_REQUEST, "invalid_content"),
        VeracityError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "not_configured"),
        VeracityError::TaskNotFound => (StatusCode::NOT_FOUND, "not_found"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    (
        status,
        Json(json!({"error": code, "message": err.user_message()})),
    )
}

pub async fn api_check(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    Json(body): Json<CheckRequest>,
) -> impl IntoResponse {
    if let Some(ref text) = body.text {
        state.content.put(&body.content_id, text);
    }

    let caller = Caller {
        session_email: None,
        cookie_email: body.email.clone(),
        ip: addr.ip().to_string(),
    };

    match state.orchestrator.start_analysis(&body.content_id, &caller).await {
        Ok(task_id) => (StatusCode::OK, Json(json!({"task_id": task_id}))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

pub async fn api_progress(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    match state.orchestrator.get_progress(&task_id).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Capture a visitor's email so later requests resolve to it instead of
/// their IP. Capturing does not lift the quota.
pub async fn api_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailRequest>,
) -> impl IntoResponse {
    let email = body.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_email"})),
        )
            .into_response();
    }
    state.ledger.save_email(&email).await;
    info!("Visitor email captured");
    (StatusCode::OK, Json(json!({"saved": true, "email": email}))).into_response()
}

/// Promote an email identity to unlimited use.
pub async fn api_register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailRequest>,
) -> impl IntoResponse {
    let email = body.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_email"})),
        )
            .into_response();
    }
    state.ledger.register(&Identity::Email(email.clone())).await;
    info!("Visitor registered for unlimited use");
    (StatusCode::OK, Json(json!({"registered": true}))).into_response()
}

pub async fn health() -> &'static str {
    "ok"
}
