// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HuggingFace Inference API backend adapter for neoai.
//!
//! Model ids are namespaced with an `hf:` prefix so they never collide with
//! other backends. The prefix is stripped when building the upstream URL.

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

use crate::types::{GenerateRequest, extract_delta};

pub const DISPLAY_NAME: &str = "HuggingFace";
const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";
const MODEL_PREFIX: &str = "hf:";

pub struct HuggingFaceBackend {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl HuggingFaceBackend {
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

/// Upstream repository name for a namespaced model id.
fn upstream_model(model: &str) -> &str {
    model.strip_prefix(MODEL_PREFIX).unwrap_or(model)
}

#[async_trait]
impl BackendAdapter for HuggingFaceBackend {
    fn id(&self) -> BackendId {
        BackendId::Huggingface
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn list_models(&self) -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor {
                id: "hf:mistralai/Mistral-7B-Instruct-v0.3".to_string(),
                name: "Mistral 7B v0.3 (HF)".to_string(),
                provider: BackendId::Huggingface,
                description: "Mistral 7B instruction tuned, served by the Inference API."
                    .to_string(),
                context_window: 32_768,
                max_output_tokens: 2_048,
                is_free: true,
            },
            ModelDescriptor {
                id: "hf:microsoft/Phi-3-mini-4k-instruct".to_string(),
                name: "Phi-3 Mini 4K (HF)".to_string(),
                provider: BackendId::Huggingface,
                description: "Microsoft Phi-3 Mini, a compact and capable model.".to_string(),
                context_window: 4_096,
                max_output_tokens: 2_048,
                is_free: true,
            },
        ]
    }

    async fn chat(&self, request: BackendChatRequest) -> Result<TokenStream, NeoaiError> {
        let Some(api_key) = &self.api_key else {
            return Err(NeoaiError::backend_unavailable(DISPLAY_NAME));
        };

        let url = format!("{}/{}", self.base_url, upstream_model(&request.model));
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&GenerateRequest::streaming(&request))
            .send()
            .await
            .map_err(|e| upstream_transport_error(DISPLAY_NAME, DISPLAY_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(upstream_status_error(
                DISPLAY_NAME,
                DISPLAY_NAME,
                status.as_u16(),
                &text,
            ));
        }

        debug!(model = %request.model, "huggingface stream opened");
        Ok(normalize_sse(
            response.bytes_stream(),
            DISPLAY_NAME,
            extract_delta,
        ))
    }
}
