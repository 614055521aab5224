// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the neoai gateway.
//!
//! Every [`NeoaiError`] carries an [`ErrorKind`] that decides the HTTP status,
//! the stable machine code, and whether the caller may retry. Each error also
//! gets a unique `err_<uuid>` identifier at construction time so a rendered
//! response can be correlated with the log line that recorded it.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::ids::generate_id;

/// A single blocked detection as exposed to the client: the category and a masked hint.
///
/// Raw matched values never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionHint {
    #[serde(rename = "type")]
    pub kind: String,
    pub hint: String,
}

/// Classification of every failure the gateway can surface.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Missing, malformed, expired, or unverifiable bearer assertion.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Request failed validation.
    #[error("invalid request: {message}")]
    InvalidRequest {
        message: String,
        details: Option<Value>,
    },

    /// The outbound message was blocked by the sensitive-content scanner.
    #[error("sensitive content detected ({} detections)", detections.len())]
    SensitiveContentDetected { detections: Vec<DetectionHint> },

    /// A caller-owned resource does not exist (or is owned by someone else).
    #[error("{0} not found")]
    NotFound(String),

    /// The caller exhausted an hourly or daily quota window.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// No available backend serves the requested model.
    #[error("model `{model}` is not available")]
    InvalidModel {
        model: String,
        available_models: Vec<String>,
    },

    /// The backend has no credential configured.
    #[error("backend `{backend}` is unavailable")]
    BackendUnavailable { backend: String },

    /// Upstream transport failure or non-success response.
    #[error("backend `{backend}` error: {message}")]
    BackendError { backend: String, message: String },

    /// Durable store failure.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid or missing configuration discovered at runtime.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The primary error type used across all neoai crates.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct NeoaiError {
    kind: ErrorKind,
    error_id: String,
}

impl From<ErrorKind> for NeoaiError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            error_id: generate_id("err"),
        }
    }
}

impl NeoaiError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        ErrorKind::Unauthenticated(reason.into()).into()
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ErrorKind::InvalidRequest {
            message: message.into(),
            details: None,
        }
        .into()
    }

    pub fn invalid_request_with(message: impl Into<String>, details: Value) -> Self {
        ErrorKind::InvalidRequest {
            message: message.into(),
            details: Some(details),
        }
        .into()
    }

    pub fn sensitive_content(detections: Vec<DetectionHint>) -> Self {
        ErrorKind::SensitiveContentDetected { detections }.into()
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ErrorKind::NotFound(resource.into()).into()
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        ErrorKind::RateLimited { retry_after_secs }.into()
    }

    pub fn invalid_model(model: impl Into<String>, available_models: Vec<String>) -> Self {
        ErrorKind::InvalidModel {
            model: model.into(),
            available_models,
        }
        .into()
    }

    pub fn backend_unavailable(backend: impl Into<String>) -> Self {
        ErrorKind::BackendUnavailable {
            backend: backend.into(),
        }
        .into()
    }

    pub fn backend_error(backend: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorKind::BackendError {
            backend: backend.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ErrorKind::Storage {
            source: Box::new(source),
        }
        .into()
    }

    pub fn config(message: impl Into<String>) -> Self {
        ErrorKind::Config(message.into()).into()
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ErrorKind::Internal(message.into()).into()
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Unique `err_<uuid>` correlation id assigned at construction.
    pub fn error_id(&self) -> &str {
        &self.error_id
    }

    /// HTTP status code for this error class.
    pub fn status(&self) -> u16 {
        match &self.kind {
            ErrorKind::Unauthenticated(_) => 401,
            ErrorKind::InvalidRequest { .. }
            | ErrorKind::SensitiveContentDetected { .. }
            | ErrorKind::InvalidModel { .. } => 400,
            ErrorKind::NotFound(_) => 404,
            ErrorKind::RateLimited { .. } => 429,
            ErrorKind::BackendUnavailable { .. } => 503,
            ErrorKind::BackendError { .. } => 502,
            ErrorKind::Storage { .. } | ErrorKind::Config(_) | ErrorKind::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code rendered into the JSON error body.
    pub fn code(&self) -> &'static str {
        match &self.kind {
            ErrorKind::Unauthenticated(_) => "UNAUTHORIZED",
            ErrorKind::InvalidRequest { .. } => "BAD_REQUEST",
            ErrorKind::SensitiveContentDetected { .. } => "PII_DETECTED",
            ErrorKind::NotFound(_) => "NOT_FOUND",
            ErrorKind::RateLimited { .. } => "RATE_LIMITED",
            ErrorKind::InvalidModel { .. } => "INVALID_MODEL",
            ErrorKind::BackendUnavailable { .. } => "AI_PROVIDER_UNAVAILABLE",
            ErrorKind::BackendError { .. } => "AI_PROVIDER_ERROR",
            ErrorKind::Storage { .. } | ErrorKind::Config(_) | ErrorKind::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::RateLimited { .. }
                | ErrorKind::InvalidModel { .. }
                | ErrorKind::BackendUnavailable { .. }
                | ErrorKind::BackendError { .. }
                | ErrorKind::Storage { .. }
                | ErrorKind::Internal(_)
        )
    }

    /// Message safe to show the caller. Internal failures collapse to a generic text.
    pub fn client_message(&self) -> String {
        match &self.kind {
            ErrorKind::Unauthenticated(_) => "Authentication required".to_string(),
            ErrorKind::InvalidRequest { message, .. } => message.clone(),
            ErrorKind::SensitiveContentDetected { .. } => {
                "Your message contains sensitive personal information that cannot be sent to AI models."
                    .to_string()
            }
            ErrorKind::NotFound(resource) => format!("{resource} not found"),
            ErrorKind::RateLimited { retry_after_secs } => format!(
                "Rate limit exceeded. Please try again in {retry_after_secs} seconds."
            ),
            ErrorKind::InvalidModel { model, .. } => format!("Model \"{model}\" is not available"),
            ErrorKind::BackendUnavailable { backend } => {
                format!("AI provider \"{backend}\" is not configured or unavailable.")
            }
            ErrorKind::BackendError { backend, .. } => format!(
                "AI provider \"{backend}\" encountered an error. Please try a different model."
            ),
            ErrorKind::Storage { .. } | ErrorKind::Config(_) | ErrorKind::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Structured details for the error body, when the class defines any.
    pub fn details(&self) -> Option<Value> {
        match &self.kind {
            ErrorKind::InvalidRequest { details, .. } => details.clone(),
            ErrorKind::SensitiveContentDetected { detections } => {
                Some(json!({ "detections": detections }))
            }
            ErrorKind::RateLimited { retry_after_secs } => {
                Some(json!({ "retryAfter": retry_after_secs }))
            }
            ErrorKind::InvalidModel {
                available_models, ..
            } => Some(json!({ "availableModels": available_models })),
            _ => None,
        }
    }

    /// Seconds the caller should wait, for rate-limited errors.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self.kind {
            ErrorKind::RateLimited { retry_after_secs } => Some(retry_after_secs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_gets_a_distinct_error_id() {
        let a = NeoaiError::internal("boom");
        let b = NeoaiError::internal("boom");
        assert!(a.error_id().starts_with("err_"));
        assert_ne!(a.error_id(), b.error_id());
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(NeoaiError::unauthenticated("x").status(), 401);
        assert_eq!(NeoaiError::invalid_request("x").status(), 400);
        assert_eq!(NeoaiError::sensitive_content(vec![]).status(), 400);
        assert_eq!(NeoaiError::rate_limited(5).status(), 429);
        assert_eq!(NeoaiError::invalid_model("m", vec![]).status(), 400);
        assert_eq!(NeoaiError::backend_unavailable("Groq").status(), 503);
        assert_eq!(NeoaiError::backend_error("Groq", "500").status(), 502);
        assert_eq!(NeoaiError::internal("x").status(), 500);
        assert_eq!(NeoaiError::not_found("Session").status(), 404);
    }

    #[test]
    fn retryability_matches_error_class() {
        assert!(!NeoaiError::unauthenticated("x").is_retryable());
        assert!(!NeoaiError::invalid_request("x").is_retryable());
        assert!(!NeoaiError::sensitive_content(vec![]).is_retryable());
        assert!(NeoaiError::rate_limited(1).is_retryable());
        assert!(NeoaiError::invalid_model("m", vec![]).is_retryable());
        assert!(NeoaiError::backend_error("Gemini", "x").is_retryable());
        assert!(NeoaiError::internal("x").is_retryable());
    }

    #[test]
    fn rate_limited_details_and_message() {
        let err = NeoaiError::rate_limited(42);
        assert_eq!(err.code(), "RATE_LIMITED");
        assert_eq!(err.details(), Some(json!({ "retryAfter": 42 })));
        assert_eq!(
            err.client_message(),
            "Rate limit exceeded. Please try again in 42 seconds."
        );
        assert_eq!(err.retry_after_secs(), Some(42));
    }

    #[test]
    fn invalid_model_lists_available_models() {
        let err = NeoaiError::invalid_model("unknown", vec!["m1".into()]);
        assert_eq!(err.details(), Some(json!({ "availableModels": ["m1"] })));
        assert_eq!(err.client_message(), "Model \"unknown\" is not available");
    }

    #[test]
    fn sensitive_content_details_only_carry_masked_hints() {
        let err = NeoaiError::sensitive_content(vec![DetectionHint {
            kind: "email".into(),
            hint: "j***@e***.com".into(),
        }]);
        assert_eq!(err.code(), "PII_DETECTED");
        assert_eq!(
            err.details(),
            Some(json!({ "detections": [{ "type": "email", "hint": "j***@e***.com" }] }))
        );
    }

    #[test]
    fn internal_errors_do_not_leak_their_message() {
        let err = NeoaiError::internal("sqlite busy at /var/lib/neoai.db");
        assert_eq!(err.client_message(), "Internal server error");
        let storage = NeoaiError::storage(std::io::Error::other("disk full"));
        assert_eq!(storage.client_message(), "Internal server error");
        assert_eq!(storage.code(), "INTERNAL_ERROR");
    }
}
