// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Groq backend adapter for neoai.
//!
//! Groq speaks the OpenAI chat completions protocol, so roles pass through
//! unchanged and the stream carries `choices[0].delta.content` fragments.

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

use crate::types::{ChatCompletionRequest, extract_delta};

pub const DISPLAY_NAME: &str = "Groq";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// (id, name, description, context window, max output tokens)
const CATALOG: &[(&str, &str, &str, u32, u32)] = &[
    (
        "llama-3.3-70b-versatile",
        "Llama 3.3 70B",
        "Meta Llama 3.3 70B, a strong general-purpose model.",
        128_000,
        4_096,
    ),
    (
        "llama-3.1-8b-instant",
        "Llama 3.1 8B",
        "Fast, lightweight Llama 3.1 8B for quick responses.",
        128_000,
        4_096,
    ),
    (
        "mixtral-8x7b-32768",
        "Mixtral 8x7B",
        "Mistral mixture-of-experts model with 32K context.",
        32_768,
        4_096,
    ),
    (
        "gemma2-9b-it",
        "Gemma 2 9B",
        "Google Gemma 2 9B, instruction tuned.",
        8_192,
        4_096,
    ),
    (
        "deepseek-r1-distill-llama-70b",
        "DeepSeek R1 70B",
        "DeepSeek R1 distilled into Llama 70B for reasoning tasks.",
        131_072,
        16_384,
    ),
];

pub struct GroqBackend {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl GroqBackend {
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
impl BackendAdapter for GroqBackend {
    fn id(&self) -> BackendId {
        BackendId::Groq
    }

    fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn list_models(&self) -> Vec<ModelDescriptor> {
        CATALOG
            .iter()
            .map(|&(id, name, description, context_window, max_output_tokens)| ModelDescriptor {
                id: id.to_string(),
                name: name.to_string(),
                provider: BackendId::Groq,
                description: description.to_string(),
                context_window,
                max_output_tokens,
                is_free: true,
            })
            .collect()
    }

    async fn chat(&self, request: BackendChatRequest) -> Result<TokenStream, NeoaiError> {
        let Some(api_key) = &self.api_key else {
            return Err(NeoaiError::backend_unavailable(DISPLAY_NAME));
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&ChatCompletionRequest::streaming(&request))
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

        debug!(model = %request.model, "groq stream opened");
        Ok(normalize_sse(
            response.bytes_stream(),
            DISPLAY_NAME,
            extract_delta,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use neoai_core::{ChatMessage, ErrorKind, Role};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> GroqBackend {
        GroqBackend::new(
            reqwest::Client::new(),
            &ApiKeyBackendConfig {
                api_key: Some("gsk_test".into()),
                base_url: Some(server.uri()),
            },
        )
    }

    fn request() -> BackendChatRequest {
        BackendChatRequest {
            model: "llama-3.3-70b-versatile".into(),
            messages: vec![ChatMessage::new(Role::User, "Hi")],
            temperature: 0.7,
            max_tokens: 4096,
        }
    }

    #[tokio::test]
    async fn streams_delta_content_and_ignores_done() {
        let server = MockServer::start().await;
        let body = [
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
            "not json at all",
            r#"{"choices":[{"delta":{"content":"!"},"finish_reason":"stop"}]}"#,
            "[DONE]",
        ]
        .iter()
        .map(|r| format!("data: {r}\n\n"))
        .collect::<String>();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "stream": true,
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let stream = backend(&server).chat(request()).await.unwrap();
        let text: String = stream
            .map(|chunk| String::from_utf8(chunk.unwrap().to_vec()).unwrap())
            .collect()
            .await;
        assert_eq!(text, "Hello!");
    }

    #[tokio::test]
    async fn rate_limited_upstream_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_string(r#"{"error":{"message":"Rate limit reached"}}"#),
            )
            .mount(&server)
            .await;

        let Err(err) = backend(&server).chat(request()).await else {
            panic!("expected error");
        };
        assert!(matches!(
            err.kind(),
            ErrorKind::BackendError { message, .. }
                if message.starts_with("Groq API error 429: ")
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn catalog_limits() {
        let backend = GroqBackend::new(reqwest::Client::new(), &ApiKeyBackendConfig::default());
        assert!(!backend.is_available());
        let models = backend.list_models();
        assert_eq!(models.len(), 5);
        let r1 = models
            .iter()
            .find(|m| m.id == "deepseek-r1-distill-llama-70b")
            .unwrap();
        assert_eq!((r1.context_window, r1.max_output_tokens), (131_072, 16_384));
    }
}
