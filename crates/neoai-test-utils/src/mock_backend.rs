// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted backend adapter for deterministic pipeline tests.
//!
//! `MockBackend` implements [`BackendAdapter`] with a fixed chunk script so
//! gateway and registry tests never touch the network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use tokio::sync::Mutex;

use neoai_core::{
    BackendAdapter, BackendChatRequest, BackendId, ModelDescriptor, NeoaiError, TokenStream,
};

/// A backend that replays scripted chunks.
///
/// Every `chat` call is recorded so tests can assert on the assembled prompt.
pub struct MockBackend {
    id: BackendId,
    display_name: &'static str,
    available: bool,
    models: Vec<ModelDescriptor>,
    chunks: Vec<String>,
    chunk_delay: Option<Duration>,
    mid_stream_error: Option<String>,
    open_error: Option<String>,
    requests: Arc<Mutex<Vec<BackendChatRequest>>>,
}

impl MockBackend {
    /// An available backend serving no models and streaming "mock response".
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            display_name: "Mock Backend",
            available: true,
            models: Vec::new(),
            chunks: vec!["mock response".to_string()],
            chunk_delay: None,
            mid_stream_error: None,
            open_error: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_display_name(mut self, name: &'static str) -> Self {
        self.display_name = name;
        self
    }

    /// Advertise the given model ids with default limits.
    pub fn with_models(mut self, ids: &[&str]) -> Self {
        self.models = ids.iter().map(|id| mock_model(id, self.id)).collect();
        self
    }

    pub fn with_descriptors(mut self, models: Vec<ModelDescriptor>) -> Self {
        self.models = models;
        self
    }

    /// Chunks streamed, in order, by every `chat` call.
    pub fn with_chunks<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks = chunks.into_iter().map(Into::into).collect();
        self
    }

    /// Sleep this long before yielding each chunk.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Yield a `BackendError` after the scripted chunks.
    pub fn failing_mid_stream(mut self, message: impl Into<String>) -> Self {
        self.mid_stream_error = Some(message.into());
        self
    }

    /// Fail `chat` itself with a `BackendError` before any chunk.
    pub fn failing_on_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Shared handle to the requests received so far.
    pub fn request_log(&self) -> Arc<Mutex<Vec<BackendChatRequest>>> {
        Arc::clone(&self.requests)
    }
}

/// A free model descriptor with 8192/4096 limits.
pub fn mock_model(id: &str, provider: BackendId) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        name: format!("Mock {id}"),
        provider,
        description: "Scripted test model".to_string(),
        context_window: 8_192,
        max_output_tokens: 4_096,
        is_free: true,
    }
}

#[async_trait]
impl BackendAdapter for MockBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn display_name(&self) -> &'static str {
        self.display_name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn list_models(&self) -> Vec<ModelDescriptor> {
        self.models.clone()
    }

    async fn chat(&self, request: BackendChatRequest) -> Result<TokenStream, NeoaiError> {
        self.requests.lock().await.push(request);

        if !self.available {
            return Err(NeoaiError::backend_unavailable(self.display_name));
        }
        if let Some(message) = &self.open_error {
            return Err(NeoaiError::backend_error(self.display_name, message.clone()));
        }

        let mut items: Vec<Result<Bytes, NeoaiError>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.clone())))
            .collect();
        if let Some(message) = &self.mid_stream_error {
            items.push(Err(NeoaiError::backend_error(
                self.display_name,
                message.clone(),
            )));
        }

        let delay = self.chunk_delay;
        let stream = stream::iter(items).then(move |item| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            item
        });
        Ok(Box::pin(stream))
    }
}
