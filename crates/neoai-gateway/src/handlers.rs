// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles health, identity, model catalog, and session management. The
//! streaming chat entry point lives in [`crate::chat`].

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use neoai_config::collect_warnings;
use neoai_core::{CallerIdentity, NeoaiError};
use neoai_storage::queries::{messages, sessions};
use neoai_storage::{Session, StoredMessage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::server::GatewayState;

const DEFAULT_SESSION_MODEL: &str = "gemini-2.5-flash";
const SESSION_MESSAGE_LIMIT: u32 = 100;

/// Parse a JSON request body. An empty body parses as `T::default()`.
pub(crate) fn parse_body<T>(body: &Bytes) -> Result<T, NeoaiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| NeoaiError::invalid_request(format!("Invalid JSON body: {e}")))
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: &'static str,
    pub providers: usize,
    pub env: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub checks: HealthChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// GET /api/health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let db_ok = state.db.ping().await.is_ok();
    let access = &state.config.access;
    let access_ready = access.team_domain.as_deref().is_some_and(|d| !d.trim().is_empty())
        && access.audience.as_deref().is_some_and(|a| !a.trim().is_empty());
    let env_ok = state.config.is_development() || access_ready;

    let warnings = collect_warnings(&state.config);
    Json(HealthResponse {
        status: if db_ok && env_ok { "healthy" } else { "degraded" },
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            database: if db_ok { "ok" } else { "error" },
            providers: state.registry.providers().len(),
            env: if env_ok { "ok" } else { "missing_required" },
        },
        warnings: (!warnings.is_empty()).then_some(warnings),
    })
}

/// GET /api/me
pub async fn me(Extension(caller): Extension<CallerIdentity>) -> Json<serde_json::Value> {
    Json(json!({ "user": caller }))
}

/// GET /api/models
pub async fn models(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    let models = state.registry.list_models();
    let mut providers = Vec::new();
    for model in &models {
        if !providers.contains(&model.provider) {
            providers.push(model.provider);
        }
    }
    Json(json!({
        "count": models.len(),
        "models": models,
        "providers": providers,
    }))
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = sessions::list_sessions(&state.db, &caller.id).await?;
    Ok(Json(SessionListResponse { sessions }))
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: CreateSessionRequest = parse_body(&body)?;
    let model = request
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_SESSION_MODEL);
    let session =
        sessions::create_session(&state.db, &caller.id, model, request.title.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "session": session }))).into_response())
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    pub session: Session,
    pub messages: Vec<StoredMessage>,
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let session = sessions::get_session(&state.db, &id, &caller.id)
        .await?
        .ok_or_else(|| NeoaiError::not_found("Session"))?;
    let messages = messages::get_messages(&state.db, &id, SESSION_MESSAGE_LIMIT).await?;
    Ok(Json(SessionDetailResponse { session, messages }))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// PATCH /api/sessions/{id}
pub async fn update_session(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request: UpdateSessionRequest = parse_body(&body)?;
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| NeoaiError::invalid_request("Title is required"))?;

    sessions::get_session(&state.db, &id, &caller.id)
        .await?
        .ok_or_else(|| NeoaiError::not_found("Session"))?;
    sessions::update_session_title(&state.db, &id, title).await?;
    Ok(Json(json!({ "updated": true })))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !sessions::delete_session(&state.db, &id, &caller.id).await? {
        return Err(NeoaiError::not_found("Session").into());
    }
    Ok(Json(json!({ "deleted": true })))
}

/// Fallback for unknown routes.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    NeoaiError::not_found(format!("Route {method} {}", uri.path())).into()
}
