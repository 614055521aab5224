// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `neoai serve`: wire storage, backends, and the gateway together.

use std::time::Duration;

use neoai_config::NeoaiConfig;
use neoai_core::{BackgroundTasks, NeoaiError};
use neoai_gateway::{GatewayState, bind, serve};
use neoai_router::BackendRegistry;
use neoai_security::RedactingMakeWriter;
use neoai_storage::Database;
use tracing::{error, info, warn};

use crate::shutdown;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the gateway until SIGINT/SIGTERM, then drain background work and close storage.
pub async fn run_serve(config: NeoaiConfig) -> Result<(), NeoaiError> {
    init_tracing(&config.server.log_level);

    for warning in neoai_config::collect_warnings(&config) {
        warn!("{warning}");
    }

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| NeoaiError::config(format!("failed to build HTTP client: {e}")))?;

    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let registry = BackendRegistry::from_config(client.clone(), &config);
    if registry.is_empty() {
        warn!("no backends configured, every chat request will be rejected");
    } else {
        info!(
            backends = registry.providers().len(),
            models = registry.list_models().len(),
            "backend registry ready"
        );
    }

    let tasks = BackgroundTasks::new();
    let listener = bind(&config.server.bind_address, config.server.port).await?;
    let state = GatewayState::new(config, db.clone(), tasks.clone(), registry, client);

    let cancel = shutdown::install_signal_handler();
    let result = serve(listener, state, async move { cancel.cancelled().await }).await;

    info!(pending = tasks.len(), "waiting for background tasks");
    tasks.shutdown().await;
    if let Err(e) = db.close().await {
        error!(error = %e, "failed to close database cleanly");
    }
    info!("neoai stopped");
    result
}

/// Initializes the tracing subscriber with the given log level.
///
/// Output passes through the redacting writer so secrets never reach stderr.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("neoai={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(RedactingMakeWriter::stderr())
        .init();
}
