// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini `streamGenerateContent` wire types.

use neoai_core::stream::json_delta;
use neoai_core::{BackendChatRequest, ChatMessage, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
}

impl GenerateContentRequest {
    pub fn from_chat(request: &BackendChatRequest) -> Self {
        Self {
            contents: to_contents(&request.messages),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                top_p: 0.95,
            },
        }
    }
}

/// Map uniform messages onto Gemini turns.
///
/// Gemini has no system role. System messages are joined with newlines and
/// prepended to the first user turn that follows them.
pub fn to_contents(messages: &[ChatMessage]) -> Vec<Content> {
    let mut contents = Vec::with_capacity(messages.len());
    let mut pending_system: Vec<&str> = Vec::new();

    for message in messages {
        match message.role {
            Role::System => pending_system.push(&message.content),
            Role::User => {
                let text = if pending_system.is_empty() {
                    message.content.clone()
                } else {
                    let system = pending_system.join("\n");
                    pending_system.clear();
                    format!("{system}\n{}", message.content)
                };
                contents.push(Content {
                    role: "user",
                    parts: vec![Part { text }],
                });
            }
            Role::Assistant => contents.push(Content {
                role: "model",
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            }),
        }
    }
    contents
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Text delta at `candidates[0].content.parts[0].text`.
pub fn extract_delta(data: &str) -> Option<String> {
    json_delta::<StreamChunk, _>(data, |chunk| {
        chunk
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_text_is_prepended_to_first_user_turn_only() {
        let messages = vec![
            ChatMessage::new(Role::System, "Be brief."),
            ChatMessage::new(Role::System, "Use markdown."),
            ChatMessage::new(Role::User, "Hi"),
            ChatMessage::new(Role::Assistant, "Hello!"),
            ChatMessage::new(Role::User, "What is Rust?"),
        ];
        let contents = to_contents(&messages);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[0].parts[0].text, "Be brief.\nUse markdown.\nHi");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[1].parts[0].text, "Hello!");
        assert_eq!(contents[2].parts[0].text, "What is Rust?");
    }

    #[test]
    fn request_body_shape() {
        let request = BackendChatRequest {
            model: "gemini-2.5-flash".into(),
            messages: vec![ChatMessage::new(Role::User, "Hi")],
            temperature: 0.5,
            max_tokens: 1024,
        };
        let body = serde_json::to_value(GenerateContentRequest::from_chat(&request)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hi");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert!(body["generationConfig"]["topP"].as_f64().unwrap() > 0.94);
    }

    #[test]
    fn extracts_first_candidate_part() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"Hel"}],"role":"model"}}]}"#;
        assert_eq!(extract_delta(data).as_deref(), Some("Hel"));
    }

    #[test]
    fn chunks_without_text_are_skipped() {
        assert_eq!(extract_delta(r#"{"candidates":[]}"#), None);
        assert_eq!(extract_delta(r#"{"usageMetadata":{"totalTokenCount":9}}"#), None);
        assert_eq!(extract_delta(r#"{"candidates":[{"finishReason":"STOP"}]}"#), None);
        assert_eq!(extract_delta("{not json"), None);
    }
}
