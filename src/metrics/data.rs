//! Data structures for sampled host telemetry.

use serde::{Deserialize, Serialize};

/// One immutable sampled set of host telemetry, produced once per broadcast tick.
///
/// Field names are the wire names of the stream payload. Memory figures are
/// whole megabytes and storage figures are gigabytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// CPU usage percentage (0 to 100)
    pub cpu_usage: u32,
    /// CPU temperature in Celsius
    pub temperature: i32,
    /// Memory usage percentage (0 to 100)
    pub memory_usage: u32,
    /// Storage usage percentage (0 to 100)
    pub storage_usage: u32,
    /// Current CPU frequency in MHz
    pub cpu_frequency: u64,
    /// Total memory in MB
    pub memory_total: u64,
    /// Used memory in MB
    pub memory_used: u64,
    /// Total storage in GB
    pub storage_total: f64,
    /// Used storage in GB
    pub storage_used: f64,
}

/// Memory statistics as reported by a metrics provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Total memory in MB
    pub total_mb: u64,
    /// Used memory in MB
    pub used_mb: u64,
    /// Usage percentage (0 to 100)
    pub usage_percent: u32,
}

impl MemoryStats {
    /// Build memory stats from raw byte counts.
    pub fn from_bytes(total_bytes: u64, used_bytes: u64) -> Self {
        let usage_percent = if total_bytes > 0 {
            (used_bytes.saturating_mul(100) / total_bytes) as u32
        } else {
            0
        };

        Self {
            total_mb: total_bytes / 1024 / 1024,
            used_mb: used_bytes / 1024 / 1024,
            usage_percent,
        }
    }
}

/// Aggregate disk statistics over all physical disks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    /// Total space in GB
    pub total_gb: f64,
    /// Used space in GB
    pub used_gb: f64,
    /// Usage percentage (0 to 100)
    pub usage_percent: u32,
}

impl DiskStats {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    /// Build disk stats from aggregated byte counts.
    pub fn from_bytes(total_bytes: u64, used_bytes: u64) -> Self {
        let usage_percent = if total_bytes > 0 {
            ((used_bytes as f64 / total_bytes as f64) * 100.0) as u32
        } else {
            0
        };

        Self {
            total_gb: total_bytes as f64 / Self::GB,
            used_gb: used_bytes as f64 / Self::GB,
            usage_percent,
        }
    }
}

/// Static-ish host information served by the info endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Operating system name
    pub os: String,
    /// Operating system version
    pub platform: String,
    /// Kernel version
    pub kernel: String,
    /// System uptime in seconds
    pub uptime_seconds: u64,
    /// CPU model string
    pub cpu_model: String,
    /// Core/thread summary, e.g. "4 Cores / 8 Threads"
    pub cpu_specs: String,
    /// Total memory in GB
    pub mem_total_gb: f64,
    /// Total disk in GB
    pub disk_total_gb: f64,
}

/// Format the core/thread summary used in [`HostInfo::cpu_specs`].
pub fn cpu_specs(physical_cores: usize, threads: usize) -> String {
    format!("{} Cores / {} Threads", physical_cores, threads)
}

impl StatusSnapshot {
    /// Assemble a snapshot from independently sampled parts.
    pub fn from_parts(
        cpu_usage: u32,
        temperature: i32,
        memory: MemoryStats,
        disk: DiskStats,
        cpu_frequency: u64,
    ) -> Self {
        Self {
            cpu_usage,
            temperature,
            memory_usage: memory.usage_percent,
            storage_usage: disk.usage_percent,
            cpu_frequency,
            memory_total: memory.total_mb,
            memory_used: memory.used_mb,
            storage_total: disk.total_gb,
            storage_used: disk.used_gb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stats_percent() {
        let stats = MemoryStats::from_bytes(8 * 1024 * 1024 * 1024, 2 * 1024 * 1024 * 1024);
        assert_eq!(stats.total_mb, 8192);
        assert_eq!(stats.used_mb, 2048);
        assert_eq!(stats.usage_percent, 25);
    }

    #[test]
    fn test_zero_totals_do_not_divide() {
        assert_eq!(MemoryStats::from_bytes(0, 0).usage_percent, 0);
        assert_eq!(DiskStats::from_bytes(0, 0).usage_percent, 0);
    }

    #[test]
    fn test_disk_stats_units() {
        let gb = 1024 * 1024 * 1024;
        let stats = DiskStats::from_bytes(500 * gb, 125 * gb);
        assert_eq!(stats.total_gb, 500.0);
        assert_eq!(stats.used_gb, 125.0);
        assert_eq!(stats.usage_percent, 25);
    }

    #[test]
    fn test_cpu_specs_format() {
        assert_eq!(cpu_specs(4, 8), "4 Cores / 8 Threads");
    }
}
