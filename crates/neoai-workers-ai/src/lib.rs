// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloudflare Workers AI backend adapter for neoai.
//!
//! Calls the REST `accounts/{account_id}/ai/run/{model}` endpoint. Streaming
//! responses carry `{"response": "..."}` records; if the upstream answers
//! with a plain JSON payload instead, its text is emitted as one chunk.

pub mod types;

use async_trait::async_trait;
use bytes::Bytes;
use neoai_config::model::WorkersAiConfig;
use neoai_core::stream::normalize_sse;
use neoai_core::{
    BackendAdapter, BackendChatRequest, BackendId, ModelDescriptor, NeoaiError, TokenStream,
    upstream_status_error, upstream_transport_error,
};
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::types::{RunRequest, extract_delta, extract_full_response};

pub const DISPLAY_NAME: &str = "Cloudflare Workers AI";
const API_NAME: &str = "Workers AI";
const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

const CATALOG: &[(&str, &str, &str)] = &[
    (
        "@cf/meta/llama-3.1-8b-instruct",
        "Llama 3.1 8B (Workers AI)",
        "Meta Llama 3.1 8B on Cloudflare's edge network.",
    ),
    (
        "@cf/meta/llama-3.3-70b-instruct-fp8-fast",
        "Llama 3.3 70B Fast (Workers AI)",
        "FP8-quantized Llama 3.3 70B tuned for low latency.",
    ),
    (
        "@cf/deepseek-ai/deepseek-r1-distill-qwen-32b",
        "DeepSeek R1 Qwen 32B (Workers AI)",
        "DeepSeek R1 distilled into Qwen 32B for reasoning.",
    ),
];

struct Credentials {
    account_id: String,
    api_token: SecretString,
}

pub struct WorkersAiBackend {
    client: reqwest::Client,
    credentials: Option<Credentials>,
    base_url: String,
}

impl WorkersAiBackend {
    pub fn new(client: reqwest::Client, config: &WorkersAiConfig) -> Self {
        let non_blank = |v: &Option<String>| v.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_string);
        let credentials = match (non_blank(&config.account_id), non_blank(&config.api_token)) {
            (Some(account_id), Some(api_token)) => Some(Credentials {
                account_id,
                api_token: SecretString::from(api_token),
            }),
            _ => None,
        };
        Self {
            client,
            credentials,
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
impl BackendAdapter for WorkersAiBackend {
    fn id(&self) -> BackendId {
        BackendId::WorkersAi
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    fn is_available(&self) -> bool {
        self.credentials.is_some()
    }

    fn list_models(&self) -> Vec<ModelDescriptor> {
        CATALOG
            .iter()
            .map(|&(id, name, description)| ModelDescriptor {
                id: id.to_string(),
                name: name.to_string(),
                provider: BackendId::WorkersAi,
                description: description.to_string(),
                context_window: 4_096,
                max_output_tokens: 2_048,
                is_free: true,
            })
            .collect()
    }

    async fn chat(&self, request: BackendChatRequest) -> Result<TokenStream, NeoaiError> {
        let Some(credentials) = &self.credentials else {
            return Err(NeoaiError::backend_unavailable(DISPLAY_NAME));
        };

        let url = format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, credentials.account_id, request.model
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(credentials.api_token.expose_secret())
            .json(&RunRequest::streaming(&request))
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

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let body = response
                .bytes()
                .await
                .map_err(|e| upstream_transport_error(DISPLAY_NAME, API_NAME, e))?;
            let text = extract_full_response(&body);
            if text.is_none() {
                warn!(model = %request.model, "workers ai payload carried no response text");
            }
            let chunks: Vec<Result<Bytes, NeoaiError>> = text
                .filter(|t| !t.is_empty())
                .map(|t| Ok(Bytes::from(t)))
                .into_iter()
                .collect();
            return Ok(Box::pin(futures::stream::iter(chunks)));
        }

        debug!(model = %request.model, "workers ai stream opened");
        Ok(normalize_sse(
            response.bytes_stream(),
            DISPLAY_NAME,
            extract_delta,
        ))
    }
}
