//! Registry of live stream subscribers and the broadcast fan-out.

use crate::web::encoder::frame_event;
use crate::web::sink::EventSink;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

struct Subscriber {
    sink: Arc<dyn EventSink>,
    connected_at: DateTime<Utc>,
}

/// Outcome of one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers that accepted and flushed the event
    pub delivered: usize,
    /// Subscribers whose write or flush failed
    pub failed: usize,
}

/// Thread-safe set of active subscribers keyed by subscriber id.
///
/// Mutations take the write lock. A broadcast holds the read lock for the
/// whole pass, so every subscriber present when the pass starts receives
/// the same frame and no add or remove can interleave with it. A slow sink
/// therefore delays the rest of its pass.
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<String, Subscriber>>,
    event_name: Option<String>,
}

impl SubscriberRegistry {
    /// Create an empty registry framing events with `event_name`.
    pub fn new(event_name: Option<String>) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            event_name,
        }
    }

    /// Register a sink under `id`.
    ///
    /// Returns `false` without registering when the sink cannot flush.
    pub async fn add(&self, id: impl Into<String>, sink: Arc<dyn EventSink>) -> bool {
        if sink.as_flushable().is_none() {
            return false;
        }

        let subscriber = Subscriber {
            sink,
            connected_at: Utc::now(),
        };
        self.subscribers.write().await.insert(id.into(), subscriber);
        true
    }

    /// Remove a subscriber. Removing an unknown id is a no-op.
    pub async fn remove(&self, id: &str) {
        let removed = self.subscribers.write().await.remove(id);
        log_removed(id, removed);
    }

    /// Number of registered subscribers.
    pub async fn count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Deliver `payload` to every registered subscriber.
    ///
    /// A failing subscriber is logged and skipped. It stays registered until
    /// its own connection closes.
    pub async fn broadcast(&self, payload: &str) -> BroadcastReport {
        let frame = frame_event(self.event_name.as_deref(), payload);
        let mut report = BroadcastReport::default();

        let subscribers = self.subscribers.read().await;
        for (id, subscriber) in subscribers.iter() {
            if let Err(e) = subscriber.sink.write(frame.as_bytes()).await {
                warn!("Failed to send to client {}: {}", id, e);
                report.failed += 1;
                continue;
            }

            let flushed = match subscriber.sink.as_flushable() {
                Some(flusher) => flusher.flush().await,
                None => Err(crate::error::SystemError::unsupported_sink(id.clone())),
            };
            match flushed {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Failed to flush client {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Remove without waiting, for use from synchronous cleanup paths.
    fn release(self: &Arc<Self>, id: String) {
        if let Ok(mut subscribers) = self.subscribers.try_write() {
            let removed = subscribers.remove(&id);
            log_removed(&id, removed);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let registry = Arc::clone(self);
                handle.spawn(async move { registry.remove(&id).await });
            }
            Err(_) => warn!("No runtime to deregister client {}", id),
        }
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(Some(crate::DEFAULT_EVENT_NAME.to_string()))
    }
}

fn log_removed(id: &str, removed: Option<Subscriber>) {
    if let Some(subscriber) = removed {
        let connected_for = Utc::now().signed_duration_since(subscriber.connected_at);
        debug!(
            "Removed client {} after {}s",
            id,
            connected_for.num_seconds()
        );
    }
}

/// Keeps a subscriber registered for as long as it is alive.
///
/// Dropping the guard deregisters the subscriber on every exit path.
pub struct Registration {
    registry: Arc<SubscriberRegistry>,
    id: String,
}

impl Registration {
    /// Register `sink` and return the guard, or `None` if the sink cannot flush.
    pub async fn register(
        registry: Arc<SubscriberRegistry>,
        id: String,
        sink: Arc<dyn EventSink>,
    ) -> Option<Self> {
        if registry.add(id.clone(), sink).await {
            Some(Self { registry, id })
        } else {
            None
        }
    }

    /// The registered subscriber id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.release(std::mem::take(&mut self.id));
    }
}
