//! Host metrics provider backed by sysinfo and direct `/sys` access.

use crate::error::{Result, SystemError};
use crate::metrics::{
    data::{cpu_specs, DiskStats, HostInfo, MemoryStats},
    traits::MetricsProvider,
};
use std::collections::HashSet;
use std::fs;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use sysinfo::{Components, Disks, System};

const CPU_FREQ_PATH: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq";
const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Component labels that identify a CPU package sensor, in preference order.
const CPU_SENSOR_LABELS: &[&str] = &["package", "tctl", "tdie", "cpu", "core", "soc"];

/// System metrics collector using sysinfo.
pub struct SystemCollector {
    system: Mutex<System>,
    cpu_window: Duration,
}

impl SystemCollector {
    /// Create a new collector whose CPU usage reading spans `cpu_window`.
    pub fn new(cpu_window: Duration) -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            system: Mutex::new(system),
            cpu_window: cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    fn lock(&self) -> MutexGuard<'_, System> {
        // A poisoned lock only means another sampler panicked mid-refresh.
        self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read current CPU frequency in MHz from cpufreq.
    fn read_cpu_frequency(&self) -> Option<u64> {
        let freq_khz = fs::read_to_string(CPU_FREQ_PATH)
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()?;

        Some(freq_khz / 1000)
    }

    /// Read the first thermal zone in Celsius.
    fn read_thermal_zone(&self) -> Option<f32> {
        let millicelsius = fs::read_to_string(THERMAL_ZONE_PATH)
            .ok()?
            .trim()
            .parse::<i32>()
            .ok()?;

        Some(millicelsius as f32 / 1000.0)
    }
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::DEFAULT_CPU_SAMPLE_MS))
    }
}

impl MetricsProvider for SystemCollector {
    fn cpu_usage(&self) -> Result<f32> {
        self.lock().refresh_cpu_usage();
        std::thread::sleep(self.cpu_window);

        let mut system = self.lock();
        system.refresh_cpu_usage();

        let cpus = system.cpus();
        if cpus.is_empty() {
            return Err(SystemError::provider_error(
                "cpu usage",
                "no CPU information available",
            ));
        }

        let usage = cpus.iter().map(|cpu| cpu.cpu_usage()).sum::<f32>() / cpus.len() as f32;
        Ok(usage.clamp(0.0, 100.0))
    }

    fn temperature(&self) -> Result<f32> {
        let components = Components::new_with_refreshed_list();

        let sensor = CPU_SENSOR_LABELS.iter().find_map(|wanted| {
            components
                .iter()
                .find(|c| c.label().to_lowercase().contains(wanted))
        });

        if let Some(component) = sensor {
            let celsius = component.temperature();
            if celsius.is_finite() {
                return Ok(celsius);
            }
        }

        self.read_thermal_zone().ok_or_else(|| {
            SystemError::provider_error("temperature", "no CPU temperature sensor found")
        })
    }

    fn memory(&self) -> Result<MemoryStats> {
        let mut system = self.lock();
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return Err(SystemError::provider_error("memory", "total memory reported as zero"));
        }

        Ok(MemoryStats::from_bytes(total, system.used_memory()))
    }

    fn disk(&self) -> Result<DiskStats> {
        let disks = Disks::new_with_refreshed_list();

        let mut seen = HashSet::new();
        let mut total: u64 = 0;
        let mut used: u64 = 0;

        for disk in disks.iter() {
            // Bind mounts report the same device more than once.
            if !seen.insert(disk.name().to_os_string()) {
                continue;
            }
            let disk_total = disk.total_space();
            total = total.saturating_add(disk_total);
            used = used.saturating_add(disk_total.saturating_sub(disk.available_space()));
        }

        if total == 0 {
            return Err(SystemError::provider_error("disk", "no valid disk data found"));
        }

        Ok(DiskStats::from_bytes(total, used))
    }

    fn cpu_frequency(&self) -> Result<u64> {
        if let Some(mhz) = self.read_cpu_frequency() {
            return Ok(mhz);
        }

        let mut system = self.lock();
        system.refresh_cpu_frequency();
        system
            .cpus()
            .first()
            .map(|cpu| cpu.frequency())
            .filter(|mhz| *mhz > 0)
            .ok_or_else(|| SystemError::provider_error("cpu frequency", "frequency unavailable"))
    }

    fn host_info(&self) -> Result<HostInfo> {
        let (cpu_model, physical, threads) = {
            let mut system = self.lock();
            system.refresh_cpu_frequency();
            let cpus = system.cpus();
            let model = cpus
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            (model, system.physical_core_count().unwrap_or(0), cpus.len())
        };

        let memory = self.memory()?;
        let disk = self.disk()?;

        Ok(HostInfo {
            os: System::name().unwrap_or_else(|| "unknown".to_string()),
            platform: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            uptime_seconds: System::uptime(),
            cpu_model,
            cpu_specs: cpu_specs(physical, threads),
            mem_total_gb: memory.total_mb as f64 / 1024.0,
            disk_total_gb: disk.total_gb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_creation() {
        let collector = SystemCollector::new(Duration::from_millis(10));
        assert!(collector.cpu_window >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    }

    #[test]
    fn test_memory_reading() {
        let collector = SystemCollector::default();
        let memory = collector.memory().expect("host should report memory");
        assert!(memory.total_mb > 0);
        assert!(memory.usage_percent <= 100);
    }

    #[test]
    fn test_cpu_usage_in_range() {
        let collector = SystemCollector::new(Duration::from_millis(250));
        if let Ok(usage) = collector.cpu_usage() {
            assert!((0.0..=100.0).contains(&usage));
        }
    }

    #[test]
    fn test_host_info_specs_shape() {
        let collector = SystemCollector::default();
        if let Ok(info) = collector.host_info() {
            assert!(info.cpu_specs.contains(" Cores / "));
            assert!(info.cpu_specs.ends_with(" Threads"));
        }
    }
}
