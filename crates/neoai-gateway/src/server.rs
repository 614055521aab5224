// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use neoai_auth_jwt::TokenVerifier;
use neoai_config::NeoaiConfig;
use neoai_core::{BackgroundTasks, NeoaiError};
use neoai_quota::QuotaTracker;
use neoai_router::BackendRegistry;
use neoai_storage::Database;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::auth_middleware;
use crate::request_log::{REQUEST_ID_HEADER, request_log};
use crate::{chat, handlers};

pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Shared state for axum request handlers. Cheap to clone.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<NeoaiConfig>,
    pub db: Database,
    pub tasks: BackgroundTasks,
    pub verifier: Arc<TokenVerifier>,
    pub quota: Arc<QuotaTracker>,
    pub registry: Arc<BackendRegistry>,
}

impl GatewayState {
    /// Assemble the state, building the verifier and quota tracker from `config`.
    pub fn new(
        config: NeoaiConfig,
        db: Database,
        tasks: BackgroundTasks,
        registry: BackendRegistry,
        client: reqwest::Client,
    ) -> Self {
        let verifier = TokenVerifier::from_config(client, &config.access);
        let quota = QuotaTracker::new(db.clone(), tasks.clone(), &config.quota);
        Self {
            config: Arc::new(config),
            db,
            tasks,
            verifier: Arc::new(verifier),
            quota: Arc::new(quota),
            registry: Arc::new(registry),
        }
    }
}

/// Build the `/api` router.
///
/// - GET /api/health (public)
/// - GET /api/me, GET /api/models
/// - POST /api/chat
/// - GET|POST /api/sessions, GET|PATCH|DELETE /api/sessions/{id}
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new().route("/api/health", get(handlers::health));

    let api_routes = Router::new()
        .route("/api/me", get(handlers::me))
        .route("/api/models", get(handlers::models))
        .route("/api/chat", post(chat::post_chat))
        .route(
            "/api/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session)
                .patch(handlers::update_session)
                .delete(handlers::delete_session),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = CorsLayer::permissive()
        .expose_headers([
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(SESSION_ID_HEADER),
        ])
        .max_age(Duration::from_secs(86_400));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn(request_log))
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` resolves, then stop accepting connections.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), NeoaiError> {
    if let Ok(addr) = listener.local_addr() {
        info!("gateway listening on {addr}");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| NeoaiError::internal(format!("gateway server error: {e}")))
}

/// Bind `host:port`.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, NeoaiError> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|e| NeoaiError::config(format!("failed to bind gateway to {addr}: {e}")))
}
