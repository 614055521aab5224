// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend adapter trait implemented once per upstream text-generation API.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;

use crate::error::NeoaiError;
use crate::types::{BackendChatRequest, BackendId, ModelDescriptor};

/// Ordered, finite sequence of raw UTF-8 text fragments produced by one upstream call.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<Bytes, NeoaiError>> + Send>>;

/// Adapter for one upstream backend.
///
/// Implementations translate a uniform request into the upstream's wire call and
/// normalize its streaming response into a [`TokenStream`].
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn id(&self) -> BackendId;

    /// Human-readable backend name used in error messages.
    fn display_name(&self) -> &'static str;

    /// True iff the credential or binding this backend needs is configured.
    fn is_available(&self) -> bool;

    /// Static model catalog.
    fn list_models(&self) -> Vec<ModelDescriptor>;

    /// Issue the upstream call and return the normalized token stream.
    ///
    /// Fails with `BackendUnavailable` when not configured and `BackendError`
    /// when the upstream answers with a non-success status.
    async fn chat(&self, request: BackendChatRequest) -> Result<TokenStream, NeoaiError>;
}

/// `BackendError` for a non-success upstream response. The body is cut to 200 characters.
pub fn upstream_status_error(backend: &str, api: &str, status: u16, body: &str) -> NeoaiError {
    let snippet: String = body.chars().take(200).collect();
    NeoaiError::backend_error(backend, format!("{api} API error {status}: {snippet}"))
}

/// `BackendError` for a request that never got a response.
pub fn upstream_transport_error(
    backend: &str,
    api: &str,
    error: impl std::fmt::Display,
) -> NeoaiError {
    NeoaiError::backend_error(backend, format!("{api} API request failed: {error}"))
}
