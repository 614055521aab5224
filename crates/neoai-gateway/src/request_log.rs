// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request id assignment and access logging.

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use neoai_core::generate_id;
use tracing::{error, info, warn};

use crate::error::ErrorReport;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `req_<uuid>` assigned to every inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Outermost middleware: tags the request, finishes error bodies, and logs the exchange.
pub async fn request_log(mut request: Request, next: Next) -> Response {
    let request_id = generate_id("req");
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    info!(request_id = %request_id, %method, path = %path, "→ request");

    let mut response = next.run(request).await;

    if let Some(report) = response.extensions_mut().remove::<ErrorReport>() {
        report.log(&request_id);
        report.render_into(&mut response, &request_id);
    }
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = response.status().as_u16();
    let duration_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        error!(request_id = %request_id, status, duration_ms, "← response");
    } else if response.status().is_client_error() {
        warn!(request_id = %request_id, status, duration_ms, "← response");
    } else {
        info!(request_id = %request_id, status, duration_ms, "← response");
    }
    response
}
