// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the verifier, backends, registry, and gateway.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identity of a verified caller. Built once per request, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

impl CallerIdentity {
    /// Build an identity, falling back to the local part of the email for the display name.
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: Option<String>) -> Self {
        let email = email.into();
        let display_name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        Self {
            id: id.into(),
            email,
            display_name,
        }
    }
}

/// Uniform chat roles. Backends map these onto their own vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Caller-supplied body of the streaming chat entry point.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A validated request handed to the backend registry.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The closed set of upstream backends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum BackendId {
    Gemini,
    Groq,
    Huggingface,
    WorkersAi,
}

/// Static catalog entry for a model served by one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub provider: BackendId,
    pub description: String,
    pub context_window: u32,
    pub max_output_tokens: u32,
    pub is_free: bool,
}
