// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini backend adapter for neoai.
//!
//! Streams `models/{model}:streamGenerateContent?alt=sse` and forwards the
//! text of each candidate chunk. The API key travels in the
//! `x-goog-api-key` header so it never appears in a logged URL.

pub mod types;

use async_trait::async_trait;
use neoai_config::model::ApiKeyBackendConfig;
use neoai_core::stream::normalize_sse;
use neoai_core::{
    BackendAdapter, BackendChatRequest, BackendId, ModelDescriptor, NeoaiError, TokenStream,
    upstream_status_error, upstream_transport_error,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::types::{GenerateContentRequest, extract_delta};

pub const DISPLAY_NAME: &str = "Google Gemini";
const API_NAME: &str = "Gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini adapter. Available when an API key is configured.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(client: reqwest::Client, config: &ApiKeyBackendConfig) -> Self {
        Self {
            client,
            api_key: config
                .api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .map(|k| SecretString::from(k.to_string())),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl BackendAdapter for GeminiBackend {
    fn id(&self) -> BackendId {
        BackendId::Gemini
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn list_models(&self) -> Vec<ModelDescriptor> {
        [
            (
                "gemini-2.5-flash",
                "Gemini 2.5 Flash",
                "Fast thinking model with hybrid reasoning.",
            ),
            (
                "gemini-2.5-flash-lite",
                "Gemini 2.5 Flash Lite",
                "Lightweight thinking model tuned for speed.",
            ),
            (
                "gemini-3-flash-preview",
                "Gemini 3 Flash Preview",
                "Next-generation Flash model with thinking, in preview.",
            ),
        ]
        .into_iter()
        .map(|(id, name, description)| ModelDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            provider: BackendId::Gemini,
            description: description.to_string(),
            context_window: 1_048_576,
            max_output_tokens: 65_536,
            is_free: true,
        })
        .collect()
    }

    async fn chat(&self, request: BackendChatRequest) -> Result<TokenStream, NeoaiError> {
        let Some(api_key) = &self.api_key else {
            return Err(NeoaiError::backend_unavailable(DISPLAY_NAME));
        };

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, request.model
        );
        let body = GenerateContentRequest::from_chat(&request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream_transport_error(DISPLAY_NAME, API_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(upstream_status_error(
                DISPLAY_NAME,
                API_NAME,
                status.as_u16(),
                &text,
            ));
        }

        debug!(model = %request.model, "gemini stream opened");
        Ok(normalize_sse(
            response.bytes_stream(),
            DISPLAY_NAME,
            extract_delta,
        ))
    }
}
