//! Traits for host metrics collection.

use crate::error::Result;
use crate::metrics::data::{DiskStats, HostInfo, MemoryStats};

/// Source of raw host counters.
///
/// Every call is blocking and may fail independently of the others, so
/// callers on an async runtime should run them on a blocking thread.
/// Implementations must be shareable between the broadcast loop and the
/// request handlers.
pub trait MetricsProvider: Send + Sync {
    /// CPU usage percentage across all cores.
    ///
    /// Blocks for the provider's measurement window.
    fn cpu_usage(&self) -> Result<f32>;

    /// CPU temperature in Celsius.
    fn temperature(&self) -> Result<f32>;

    /// Current memory statistics.
    fn memory(&self) -> Result<MemoryStats>;

    /// Aggregate disk statistics.
    fn disk(&self) -> Result<DiskStats>;

    /// Current CPU frequency in MHz.
    fn cpu_frequency(&self) -> Result<u64>;

    /// Operating system and hardware summary.
    fn host_info(&self) -> Result<HostInfo>;
}
