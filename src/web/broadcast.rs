//! The fixed-interval producer: sample, encode, fan out.

use crate::metrics::StatusSampler;
use crate::web::encoder::StatusEncoder;
use crate::web::registry::{BroadcastReport, SubscriberRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

/// Periodic broadcaster of status snapshots.
///
/// Each tick samples a snapshot, encodes it and broadcasts it to the
/// registry. The loop checks the shutdown signal before every sample; a
/// broadcast already in flight is allowed to finish.
pub struct BroadcastLoop {
    sampler: StatusSampler,
    encoder: StatusEncoder,
    registry: Arc<SubscriberRegistry>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BroadcastLoop {
    pub fn new(
        sampler: StatusSampler,
        registry: Arc<SubscriberRegistry>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sampler,
            encoder: StatusEncoder,
            registry,
            interval,
            shutdown,
        }
    }

    /// Run one sample/encode/broadcast cycle.
    ///
    /// Returns `None` when encoding failed and nothing was sent.
    pub async fn tick(&self) -> Option<BroadcastReport> {
        let snapshot = self.sampler.sample().await;

        let message = match self.encoder.encode(&snapshot) {
            Ok(message) => message,
            Err(e) => {
                error!("Failed to marshal system status: {}", e);
                return None;
            }
        };
        debug!("Generated JSON data: {}", message);

        let report = self.registry.broadcast(&message).await;
        debug!(
            "Broadcasted to {} clients ({} failed)",
            report.delivered, report.failed
        );
        Some(report)
    }

    /// Run until the shutdown signal fires.
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.interval);
        // Sampling can take about as long as the interval itself.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Shutting down broadcaster");
    }

    /// Spawn the loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
