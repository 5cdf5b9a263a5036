//! Composes provider calls into one status snapshot per tick.

use crate::error::Result;
use crate::metrics::{
    data::{DiskStats, MemoryStats, StatusSnapshot},
    traits::MetricsProvider,
};
use std::sync::Arc;
use tracing::{error, warn};

/// Best-effort sampler over a [`MetricsProvider`].
///
/// Each sub-metric is read independently. A failed read is logged and the
/// affected fields are reported as zero, so one broken sensor never stops
/// the rest of the telemetry. There are no retries: every tick starts fresh.
#[derive(Clone)]
pub struct StatusSampler {
    provider: Arc<dyn MetricsProvider>,
}

impl StatusSampler {
    /// Create a sampler over the given provider.
    pub fn new(provider: Arc<dyn MetricsProvider>) -> Self {
        Self { provider }
    }

    /// The provider this sampler reads from.
    pub fn provider(&self) -> &Arc<dyn MetricsProvider> {
        &self.provider
    }

    /// Take one snapshot on the current thread.
    ///
    /// Blocks for the provider's CPU measurement window.
    pub fn sample_blocking(&self) -> StatusSnapshot {
        let disk = or_zero(self.provider.disk(), DiskStats::default());
        let memory = or_zero(self.provider.memory(), MemoryStats::default());
        let cpu_usage = or_zero(self.provider.cpu_usage(), 0.0);
        let temperature = or_zero(self.provider.temperature(), 0.0);
        let cpu_frequency = or_zero(self.provider.cpu_frequency(), 0);

        StatusSnapshot::from_parts(
            cpu_usage as u32,
            temperature as i32,
            memory,
            disk,
            cpu_frequency,
        )
    }

    /// Take one snapshot on a blocking thread.
    pub async fn sample(&self) -> StatusSnapshot {
        let sampler = self.clone();
        match tokio::task::spawn_blocking(move || sampler.sample_blocking()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Sampling task failed: {}", e);
                StatusSnapshot::default()
            }
        }
    }
}

fn or_zero<T>(reading: Result<T>, zero: T) -> T {
    reading.unwrap_or_else(|e| {
        warn!("{}", e);
        zero
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SystemError;
    use crate::metrics::data::HostInfo;

    struct FixedProvider {
        fail_temperature: bool,
        fail_all: bool,
    }

    impl FixedProvider {
        fn check(&self, metric: &'static str) -> Result<()> {
            if self.fail_all || (self.fail_temperature && metric == "temperature") {
                Err(SystemError::provider_error(metric, "sensor offline"))
            } else {
                Ok(())
            }
        }
    }

    impl MetricsProvider for FixedProvider {
        fn cpu_usage(&self) -> Result<f32> {
            self.check("cpu usage").map(|_| 42.7)
        }

        fn temperature(&self) -> Result<f32> {
            self.check("temperature").map(|_| 55.2)
        }

        fn memory(&self) -> Result<MemoryStats> {
            self.check("memory").map(|_| MemoryStats {
                total_mb: 8192,
                used_mb: 4096,
                usage_percent: 50,
            })
        }

        fn disk(&self) -> Result<DiskStats> {
            self.check("disk").map(|_| DiskStats {
                total_gb: 500.0,
                used_gb: 100.0,
                usage_percent: 20,
            })
        }

        fn cpu_frequency(&self) -> Result<u64> {
            self.check("cpu frequency").map(|_| 2400)
        }

        fn host_info(&self) -> Result<HostInfo> {
            Ok(HostInfo::default())
        }
    }

    fn sampler(fail_temperature: bool, fail_all: bool) -> StatusSampler {
        StatusSampler::new(Arc::new(FixedProvider {
            fail_temperature,
            fail_all,
        }))
    }

    #[test]
    fn test_healthy_provider_fills_every_field() {
        let snapshot = sampler(false, false).sample_blocking();
        assert_eq!(snapshot.cpu_usage, 42);
        assert_eq!(snapshot.temperature, 55);
        assert_eq!(snapshot.memory_usage, 50);
        assert_eq!(snapshot.memory_total, 8192);
        assert_eq!(snapshot.memory_used, 4096);
        assert_eq!(snapshot.storage_usage, 20);
        assert_eq!(snapshot.storage_total, 500.0);
        assert_eq!(snapshot.storage_used, 100.0);
        assert_eq!(snapshot.cpu_frequency, 2400);
    }

    #[tokio::test]
    async fn test_failed_temperature_only_zeroes_temperature() {
        let snapshot = sampler(true, false).sample().await;
        assert_eq!(snapshot.temperature, 0);
        assert_eq!(snapshot.cpu_usage, 42);
        assert_eq!(snapshot.memory_usage, 50);
        assert_eq!(snapshot.storage_usage, 20);
        assert_eq!(snapshot.cpu_frequency, 2400);
        assert_eq!(snapshot.memory_total, 8192);
        assert_eq!(snapshot.storage_total, 500.0);
    }

    #[tokio::test]
    async fn test_total_outage_still_yields_snapshot() {
        let snapshot = sampler(false, true).sample().await;
        assert_eq!(snapshot, StatusSnapshot::default());
    }
}
