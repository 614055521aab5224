// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-to-backend routing.
//!
//! Built once at startup and immutable thereafter. Only adapters that report
//! themselves available are retained. On a model id collision the adapter
//! registered last wins.

use std::collections::HashMap;
use std::sync::Arc;

use neoai_config::NeoaiConfig;
use neoai_core::{
    BackendAdapter, BackendChatRequest, BackendId, ErrorKind, ModelDescriptor, NeoaiError,
    TokenStream,
};
use neoai_gemini::GeminiBackend;
use neoai_groq::GroqBackend;
use neoai_huggingface::HuggingFaceBackend;
use neoai_workers_ai::WorkersAiBackend;
use tracing::{debug, info, warn};

/// Registry of available backends and the models they serve.
pub struct BackendRegistry {
    adapters: Vec<Arc<dyn BackendAdapter>>,
    /// model id -> (adapter index, descriptor)
    index: HashMap<String, (usize, ModelDescriptor)>,
}

impl BackendRegistry {
    /// Build the registry over every known backend, configured from `config`.
    pub fn from_config(client: reqwest::Client, config: &NeoaiConfig) -> Self {
        Self::from_adapters(vec![
            Arc::new(GeminiBackend::new(client.clone(), &config.gemini)),
            Arc::new(GroqBackend::new(client.clone(), &config.groq)),
            Arc::new(WorkersAiBackend::new(client.clone(), &config.workers_ai)),
            Arc::new(HuggingFaceBackend::new(client, &config.huggingface)),
        ])
    }

    /// Retain the available adapters and index their catalogs.
    pub fn from_adapters(candidates: Vec<Arc<dyn BackendAdapter>>) -> Self {
        let mut adapters = Vec::new();
        let mut index = HashMap::new();

        for adapter in candidates {
            if !adapter.is_available() {
                debug!(backend = adapter.display_name(), "backend not configured, skipping");
                continue;
            }
            let slot = adapters.len();
            for model in adapter.list_models() {
                if let Some((previous, _)) = index.insert(model.id.clone(), (slot, model)) {
                    if previous != slot {
                        let previous: &Arc<dyn BackendAdapter> = &adapters[previous];
                        warn!(
                            previous = previous.display_name(),
                            backend = adapter.display_name(),
                            "model id served by two backends, keeping the later one"
                        );
                    }
                }
            }
            adapters.push(adapter);
        }

        info!(
            backends = adapters.len(),
            models = index.len(),
            "backend registry initialized"
        );
        Self { adapters, index }
    }

    /// Every model served by a retained backend, grouped by backend in registration order.
    pub fn list_models(&self) -> Vec<ModelDescriptor> {
        self.adapters
            .iter()
            .flat_map(|adapter| adapter.list_models())
            .collect()
    }

    /// Descriptor for `model_id` if an available backend routes it.
    pub fn model(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.index.get(model_id).map(|(_, descriptor)| descriptor)
    }

    /// Ids of the retained backends.
    pub fn providers(&self) -> Vec<BackendId> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Descriptor for `model_id`, or `InvalidModel` listing every routable model.
    pub fn resolve(&self, model_id: &str) -> Result<&ModelDescriptor, NeoaiError> {
        self.model(model_id)
            .ok_or_else(|| NeoaiError::invalid_model(model_id, self.available_ids()))
    }

    fn available_ids(&self) -> Vec<String> {
        let mut available: Vec<String> = self.index.keys().cloned().collect();
        available.sort();
        available
    }

    /// Route `request` to the backend owning its model.
    ///
    /// Fails with `InvalidModel` when no backend does. Adapter failures other
    /// than the backend classes are rewrapped as `BackendError` under the
    /// adapter's display name.
    pub async fn chat(&self, request: BackendChatRequest) -> Result<TokenStream, NeoaiError> {
        let Some((slot, _)) = self.index.get(&request.model) else {
            return Err(NeoaiError::invalid_model(request.model, self.available_ids()));
        };
        let adapter = &self.adapters[*slot];
        debug!(model = %request.model, backend = adapter.display_name(), "routing chat request");

        adapter.chat(request).await.map_err(|e| match e.kind() {
            ErrorKind::BackendError { .. } | ErrorKind::BackendUnavailable { .. } => e,
            _ => NeoaiError::backend_error(adapter.display_name(), e.to_string()),
        })
    }
}
