//! Host metrics collection and data structures.
//!
//! This module provides the provider interface over raw OS counters, a
//! sysinfo-backed implementation, and the sampler that turns provider
//! readings into one status snapshot per broadcast tick.

pub mod collector;
pub mod data;
pub mod sampler;
pub mod traits;

// Re-export commonly used items
pub use collector::SystemCollector;
pub use data::{DiskStats, HostInfo, MemoryStats, StatusSnapshot};
pub use sampler::StatusSampler;
pub use traits::MetricsProvider;
