// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workers AI `ai/run` wire types.

use neoai_core::{BackendChatRequest, ChatMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RunRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl<'a> RunRequest<'a> {
    pub fn streaming(request: &'a BackendChatRequest) -> Self {
        Self {
            messages: &request.messages,
            stream: true,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamRecord {
    response: Option<String>,
}

/// Delta for one streamed record.
///
/// JSON records carry their text in `response`. Anything that is not JSON is
/// forwarded verbatim as text.
pub fn extract_delta(data: &str) -> Option<String> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    match serde_json::from_str::<StreamRecord>(data) {
        Ok(record) => record.response,
        Err(_) if serde_json::from_str::<serde_json::Value>(data).is_ok() => None,
        Err(_) => Some(data.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct RunEnvelope {
    result: Option<StreamRecord>,
    response: Option<String>,
}

/// Text of a non-streamed run response: `result.response`, else `response`.
pub fn extract_full_response(body: &[u8]) -> Option<String> {
    let envelope: RunEnvelope = serde_json::from_slice(body).ok()?;
    envelope
        .result
        .and_then(|r| r.response)
        .or(envelope.response)
}
