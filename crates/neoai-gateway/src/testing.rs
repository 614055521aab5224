// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process gateway harness for handler tests.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request};
use axum::response::Response;
use neoai_config::NeoaiConfig;
use neoai_core::BackgroundTasks;
use neoai_router::BackendRegistry;
use neoai_storage::Database;
use neoai_test_utils::MockBackend;
use serde_json::Value;
use tower::ServiceExt;

use crate::server::{GatewayState, router};

/// Default configuration in development mode, so the auth bypass applies.
pub(crate) fn dev_config() -> NeoaiConfig {
    let mut config = NeoaiConfig::default();
    config.server.environment = "development".to_string();
    config
}

pub(crate) struct TestGateway {
    pub state: GatewayState,
}

impl TestGateway {
    pub async fn new(backend: MockBackend, config: NeoaiConfig) -> Self {
        let db = Database::open_in_memory().await.unwrap();
        let registry = BackendRegistry::from_adapters(vec![Arc::new(backend)]);
        let state = GatewayState::new(
            config,
            db,
            BackgroundTasks::new(),
            registry,
            reqwest::Client::new(),
        );
        Self { state }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        router(self.state.clone()).oneshot(request).await.unwrap()
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn post_raw(&self, uri: &str, body: &'static str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
