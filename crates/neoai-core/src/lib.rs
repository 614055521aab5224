// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the neoai gateway.
//!
//! This crate provides the error taxonomy, the shared request and identity
//! types, the [`BackendAdapter`] capability trait every upstream implements,
//! event-stream normalization, and the background task facility used by the
//! gateway pipeline.

pub mod backend;
pub mod error;
pub mod ids;
pub mod stream;
pub mod tasks;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use backend::{BackendAdapter, TokenStream, upstream_status_error, upstream_transport_error};
pub use error::{DetectionHint, ErrorKind, NeoaiError};
pub use ids::{generate_id, hash_caller_id};
pub use tasks::BackgroundTasks;
pub use types::{
    BackendChatRequest, BackendId, CallerIdentity, ChatEnvelope, ChatMessage, ModelDescriptor,
    Role,
};
