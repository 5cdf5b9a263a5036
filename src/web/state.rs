//! Process-scoped context shared by the broadcast loop and request handlers.

use crate::metrics::MetricsProvider;
use crate::web::config::WebConfig;
use crate::web::registry::SubscriberRegistry;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared application state.
///
/// Created once at startup and cloned into every handler. The shutdown
/// receiver flips to `true` exactly once, when the service is stopped.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SubscriberRegistry>,
    pub provider: Arc<dyn MetricsProvider>,
    pub config: Arc<WebConfig>,
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// Build the state and the sender that triggers shutdown.
    pub fn new(config: WebConfig, provider: Arc<dyn MetricsProvider>) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Self {
            registry: Arc::new(SubscriberRegistry::new(config.event_name.clone())),
            provider,
            config: Arc::new(config),
            shutdown: shutdown_rx,
        };
        (state, shutdown_tx)
    }
}

/// Resolves once `shutdown` reports `true` or its sender is gone.
pub async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}
