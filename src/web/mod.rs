//! Web server, stream fan-out and service lifecycle.
//!
//! This module wires the subscriber registry, the broadcast loop and the
//! HTTP endpoints together: `/sse` for the live event stream, `/info` for
//! host information, `/health` and optional static files.

pub mod broadcast;
pub mod config;
pub mod encoder;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod sink;
pub mod state;
pub mod stream;

// Re-export commonly used items
pub use broadcast::BroadcastLoop;
pub use config::WebConfig;
pub use encoder::{frame_event, StatusEncoder};
pub use registry::{BroadcastReport, Registration, SubscriberRegistry};
pub use router::create_app;
pub use sink::{ChannelSink, EventSink, Flushable};
pub use state::AppState;

use crate::error::{Result, SystemError};
use crate::metrics::{MetricsProvider, StatusSampler};
use state::shutdown_requested;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A running server together with its stop hook.
pub struct ServerHandle {
    local_addr: SocketAddr,
    state: AppState,
    shutdown: watch::Sender<bool>,
    server: JoinHandle<Result<()>>,
}

impl ServerHandle {
    /// The address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Stop the broadcast loop and drain open connections.
    ///
    /// Returns once the server has exited, or once the configured drain
    /// timeout has passed.
    pub async fn stop(self) -> Result<()> {
        info!("Stopping server on {}", self.local_addr);
        self.shutdown.send_replace(true);
        self.server
            .await
            .map_err(|e| SystemError::web_server_error(format!("Server task failed: {}", e)))?
    }
}

/// Bind, spawn the broadcast loop and serve in the background.
///
/// A relative static path in `config` is resolved against `base_dir`.
pub async fn spawn_web_server(
    config: WebConfig,
    provider: Arc<dyn MetricsProvider>,
    base_dir: &Path,
) -> Result<ServerHandle> {
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| SystemError::config_error(format!("Invalid bind address: {}", e)))?;

    let static_dir = config.resolve_static_path(base_dir);
    let interval = config.interval();
    let drain_timeout = config.shutdown_timeout();

    let (state, shutdown) = AppState::new(config, provider);
    let app = create_app(state.clone(), static_dir)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| SystemError::web_server_error(format!("Failed to bind to address: {}", e)))?;
    let local_addr = listener.local_addr()?;

    let broadcaster = BroadcastLoop::new(
        StatusSampler::new(state.provider.clone()),
        state.registry.clone(),
        interval,
        state.shutdown.clone(),
    )
    .spawn();

    let server = tokio::spawn(serve(
        listener,
        app,
        broadcaster,
        state.shutdown.clone(),
        drain_timeout,
    ));

    info!("Unified server (SSE + Web + Info) started at {}", local_addr);
    Ok(ServerHandle {
        local_addr,
        state,
        shutdown,
        server,
    })
}

/// Run the server until Ctrl-C, then stop it.
pub async fn start_web_server(
    config: WebConfig,
    provider: Arc<dyn MetricsProvider>,
    base_dir: &Path,
) -> Result<()> {
    let handle = spawn_web_server(config, provider, base_dir).await?;
    let addr = handle.local_addr();

    info!("Dashboard available at http://{}/", addr);
    info!("Stream endpoint: http://{}/sse", addr);
    info!("Info endpoint: http://{}/info", addr);

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    handle.stop().await
}

async fn serve(
    listener: TcpListener,
    app: axum::Router,
    broadcaster: JoinHandle<()>,
    shutdown: watch::Receiver<bool>,
    drain_timeout: Duration,
) -> Result<()> {
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_requested(shutdown.clone()))
    .into_future();

    let deadline = async move {
        shutdown_requested(shutdown).await;
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| SystemError::web_server_error(format!("Server error: {}", e)))?;
        }
        _ = deadline => {
            warn!("Connections still open after {:?}, forcing shutdown", drain_timeout);
        }
    }

    if let Err(e) = broadcaster.await {
        error!("Broadcaster task failed: {}", e);
    }

    info!("Server stopped");
    Ok(())
}
