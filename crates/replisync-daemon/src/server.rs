//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::controller::Controller;
use crate::error::{DaemonError, DaemonResult};
use crate::store::{InMemoryStore, ResourceStore};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Replisync daemon server
pub struct Server {
    config: DaemonConfig,
    store: Arc<dyn ResourceStore>,
    controller: Arc<Controller>,
}

impl Server {
    /// Create a new server backed by an in-memory store
    pub fn new(config: DaemonConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryStore::new()))
    }

    /// Create a new server over an existing store
    pub fn with_store(config: DaemonConfig, store: Arc<dyn ResourceStore>) -> Self {
        let controller = Controller::new(config.controller.clone(), store.clone());
        Self {
            config,
            store,
            controller,
        }
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(self.store.clone(), self.controller.clone());
        let app = create_router(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Replisync daemon listening on {}", addr);
        tracing::info!(
            label = %self.config.controller.correlation_label_key,
            "Syncing secondaries by correlation label"
        );

        let controller_handle = tokio::spawn(self.controller.clone().run());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Replisync daemon shutting down");

        self.controller.stop();
        controller_handle
            .await
            .map_err(|e| DaemonError::Server(format!("controller task failed: {}", e)))?;

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
