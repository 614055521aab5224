// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generation-inference wire types and prompt templating.

use neoai_core::stream::json_delta;
use neoai_core::{BackendChatRequest, ChatMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub inputs: String,
    pub parameters: GenerateParameters,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateParameters {
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub return_full_text: bool,
    pub do_sample: bool,
}

impl GenerateRequest {
    pub fn streaming(request: &BackendChatRequest) -> Self {
        Self {
            inputs: build_prompt(&request.messages),
            parameters: GenerateParameters {
                temperature: request.temperature,
                max_new_tokens: request.max_tokens,
                return_full_text: false,
                do_sample: true,
            },
            stream: true,
        }
    }
}

/// Render a chat transcript with `<|role|>` markers, ending on an open assistant turn.
pub fn build_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = messages
        .iter()
        .map(|m| format!("<|{}|>\n{}</s>", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    prompt.push_str("\n<|assistant|>\n");
    prompt
}

#[derive(Debug, Deserialize)]
struct StreamRecord {
    token: Option<Token>,
}

#[derive(Debug, Deserialize)]
struct Token {
    text: Option<String>,
    #[serde(default)]
    special: bool,
}

/// Token text, skipping special tokens such as `</s>`.
pub fn extract_delta(data: &str) -> Option<String> {
    json_delta::<StreamRecord, _>(data, |record| {
        let token = record.token?;
        if token.special { None } else { token.text }
    })
}
