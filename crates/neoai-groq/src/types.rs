// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible chat completion wire types.

use neoai_core::stream::json_delta;
use neoai_core::{BackendChatRequest, ChatMessage, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
    pub role: Role,
    pub content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role,
            content: &message.content,
        }
    }
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn streaming(request: &'a BackendChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// Text delta at `choices[0].delta.content`. `[DONE]` and malformed chunks yield `None`.
pub fn extract_delta(data: &str) -> Option<String> {
    if data.trim() == "[DONE]" {
        return None;
    }
    json_delta::<ChunkResponse, _>(data, |chunk| {
        chunk.choices.into_iter().next()?.delta?.content
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_pass_through_unchanged() {
        let request = BackendChatRequest {
            model: "llama-3.1-8b-instant".into(),
            messages: vec![
                ChatMessage::new(Role::System, "sys"),
                ChatMessage::new(Role::User, "hi"),
                ChatMessage::new(Role::Assistant, "hello"),
            ],
            temperature: 0.7,
            max_tokens: 4096,
        };
        let body = serde_json::to_value(ChatCompletionRequest::streaming(&request)).unwrap();
        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 4096);
        let roles: Vec<_> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, ["system", "user", "assistant"]);
    }

    #[test]
    fn extracts_delta_content() {
        let data = r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Hi"}}]}"#;
        assert_eq!(extract_delta(data).as_deref(), Some("Hi"));
    }

    #[test]
    fn role_only_and_terminal_chunks_are_skipped() {
        assert_eq!(
            extract_delta(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            None
        );
        assert_eq!(
            extract_delta(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#),
            None
        );
        assert_eq!(extract_delta("[DONE]"), None);
    }
}
