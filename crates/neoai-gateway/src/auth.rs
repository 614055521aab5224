// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access assertion middleware.
//!
//! Reads the signed assertion from the configured header, verifies it, and
//! attaches the resulting [`CallerIdentity`] to the request extensions.
//! In development with no team domain configured every request is treated
//! as a fixed local identity.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use neoai_core::{CallerIdentity, NeoaiError};
use tracing::{debug, error};

use crate::error::ApiError;
use crate::server::GatewayState;

/// The identity attached when the development bypass applies.
pub fn dev_identity() -> CallerIdentity {
    CallerIdentity::new("dev-user", "dev@localhost", Some("Dev User".to_string()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let access = &state.config.access;
    let team_domain = non_blank(access.team_domain.as_deref());

    let caller = match team_domain {
        None if state.config.is_development() => dev_identity(),
        None => {
            error!("access team domain is not configured, rejecting request");
            return Err(NeoaiError::unauthenticated("Access verification is not configured").into());
        }
        Some(team_domain) => {
            let Some(audience) = non_blank(access.audience.as_deref()) else {
                error!("access audience is not configured, rejecting request");
                return Err(
                    NeoaiError::unauthenticated("Access verification is not configured").into(),
                );
            };
            let token = request
                .headers()
                .get(access.header_name.as_str())
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| NeoaiError::unauthenticated("Missing access token"))?;
            state.verifier.verify(token, team_domain, audience).await?
        }
    };

    debug!(caller = %caller.id, "caller authenticated");
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
