// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `triage serve`: the HTTP query and update API.

use tracing::info;

use triage_config::TriageConfig;
use triage_core::{PluginAdapter, TriageError};
use triage_gateway::{GatewayState, ServerConfig, start_server};

use crate::{shutdown, wiring};

/// Serves the gateway until SIGINT or SIGTERM, then closes the store.
pub async fn run_serve(
    config: &TriageConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), TriageError> {
    let server = bind_address(config, host, port);
    let classifier = wiring::build_classifier(config)?;
    let storage = wiring::open_storage(config).await?;

    let cancel = shutdown::install_signal_handler();
    let state = GatewayState {
        storage: storage.clone(),
        classifier,
        ingest: config.ingest.clone(),
    };

    start_server(&server, state, async move { cancel.cancelled().await }).await?;

    storage.shutdown().await?;
    info!("triage serve shutdown complete");
    Ok(())
}

fn bind_address(config: &TriageConfig, host: Option<String>, port: Option<u16>) -> ServerConfig {
    let mut server = ServerConfig::from(&config.gateway);
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    server
}
