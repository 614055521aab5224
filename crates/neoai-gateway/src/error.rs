// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON error rendering for the HTTP surface.
//!
//! Handlers return [`ApiError`]. Its response carries an [`ErrorReport`]
//! extension that the request logging middleware completes with the request
//! id, logs, and renders as the final body.

use axum::Json;
use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use neoai_core::NeoaiError;
use neoai_security::mask_for_log;
use serde_json::{Map, Value, json};
use tracing::{error, warn};

/// Handler-facing error wrapper.
#[derive(Debug)]
pub struct ApiError(pub NeoaiError);

impl From<NeoaiError> for ApiError {
    fn from(e: NeoaiError) -> Self {
        Self(e)
    }
}

/// Everything needed to render and log one failed response.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub error_id: String,
    pub retryable: bool,
    pub details: Option<Value>,
    cause: String,
}

impl ErrorReport {
    pub fn from_error(e: &NeoaiError) -> Self {
        Self {
            status: StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code: e.code(),
            message: e.client_message(),
            error_id: e.error_id().to_string(),
            retryable: e.is_retryable(),
            details: e.details(),
            cause: e.to_string(),
        }
    }

    /// The `{error: {...}}` body. `requestId` is omitted when unknown.
    pub fn body(&self, request_id: Option<&str>) -> Value {
        let mut error = Map::new();
        error.insert("code".into(), json!(self.code));
        error.insert("message".into(), json!(self.message));
        error.insert("errorId".into(), json!(self.error_id));
        if let Some(request_id) = request_id {
            error.insert("requestId".into(), json!(request_id));
        }
        error.insert(
            "timestamp".into(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        error.insert("retryable".into(), json!(self.retryable));
        if let Some(details) = &self.details {
            error.insert("details".into(), details.clone());
        }
        json!({ "error": error })
    }

    /// Log at the boundary: 5xx as errors, everything else as warnings.
    pub fn log(&self, request_id: &str) {
        let cause = mask_for_log(&self.cause);
        if self.status.is_server_error() {
            error!(
                request_id,
                error_id = %self.error_id,
                status = self.status.as_u16(),
                code = self.code,
                "{cause}"
            );
        } else {
            warn!(
                request_id,
                error_id = %self.error_id,
                status = self.status.as_u16(),
                code = self.code,
                "{cause}"
            );
        }
    }

    /// Replace the body of `response` with the completed JSON error.
    pub fn render_into(&self, response: &mut Response, request_id: &str) {
        let bytes = serde_json::to_vec(&self.body(Some(request_id))).unwrap_or_default();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response.headers_mut().remove(header::CONTENT_LENGTH);
        *response.body_mut() = Body::from(bytes);
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from_error(&self.0);
        let mut response = (report.status, Json(report.body(None))).into_response();
        if let Some(secs) = self.0.retry_after_secs()
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response.extensions_mut().insert(report);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn rate_limited_sets_retry_after() {
        let response = ApiError(NeoaiError::rate_limited(2670)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2670");
        assert!(response.extensions().get::<ErrorReport>().is_some());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "RATE_LIMITED");
        assert_eq!(json["error"]["details"]["retryAfter"], 2670);
        assert_eq!(json["error"]["retryable"], true);
    }

    #[test]
    fn internal_errors_do_not_leak() {
        let report = ErrorReport::from_error(&NeoaiError::internal("db file at /var/secret"));
        let body = report.body(Some("req_1"));
        assert_eq!(body["error"]["message"], "Internal server error");
        assert_eq!(body["error"]["requestId"], "req_1");
        assert!(body["error"]["errorId"].as_str().unwrap().starts_with("err_"));
        assert!(body["error"].get("details").is_none());
    }
}
