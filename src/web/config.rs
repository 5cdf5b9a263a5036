//! Web server configuration.

use crate::error::{Result, SystemError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for the web server and the broadcast loop.
///
/// Missing fields in a config file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Host to bind the server to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Broadcast interval in milliseconds
    pub interval_ms: u64,
    /// CPU usage measurement window in milliseconds
    pub cpu_sample_ms: u64,
    /// Event name for stream frames; `None` sends bare `data:` frames
    pub event_name: Option<String>,
    /// Whether to enable CORS on the info endpoint
    pub enable_cors: bool,
    /// Whether to serve static files
    pub static_enabled: bool,
    /// Path to serve static files from
    pub static_path: Option<String>,
    /// File served for the root path
    pub index_file: String,
    /// Upper bound on draining connections at shutdown, in seconds
    pub shutdown_timeout_secs: u64,
    /// Frames buffered per subscriber before writes wait
    pub channel_capacity: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            interval_ms: crate::DEFAULT_INTERVAL_MS,
            cpu_sample_ms: crate::DEFAULT_CPU_SAMPLE_MS,
            event_name: Some(crate::DEFAULT_EVENT_NAME.to_string()),
            enable_cors: true,
            static_enabled: true,
            static_path: Some("html".to_string()),
            index_file: "index.html".to_string(),
            shutdown_timeout_secs: 30,
            channel_capacity: 16,
        }
    }
}

impl WebConfig {
    /// Create a new web configuration with custom host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Load the config at `path`, writing the defaults there first if it
    /// does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {:?} not found, creating default config", path);
            let config = Self::default();
            config.save(path)?;
            info!("Default config created at {:?}", path);
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SystemError::config_error(format!("failed to read config file: {}", e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| SystemError::config_error(format!("failed to parse config file: {}", e)))?;

        info!("Config loaded from {:?}", path);
        Ok(config)
    }

    /// Write this config to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SystemError::config_error(format!("failed to create config directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            SystemError::config_error(format!("failed to write config file: {}", e))
        })?;
        Ok(())
    }

    /// Set the host for the web server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port for the web server.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the broadcast interval in milliseconds.
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the CPU measurement window in milliseconds.
    pub fn with_cpu_sample_ms(mut self, cpu_sample_ms: u64) -> Self {
        self.cpu_sample_ms = cpu_sample_ms;
        self
    }

    /// Set the stream event name.
    pub fn with_event_name(mut self, event_name: Option<String>) -> Self {
        self.event_name = event_name;
        self
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    /// Set the static files path; `None` disables static serving.
    pub fn with_static_path(mut self, path: Option<String>) -> Self {
        self.static_enabled = path.is_some();
        self.static_path = path;
        self
    }

    /// Set the shutdown drain timeout in seconds.
    pub fn with_shutdown_timeout_secs(mut self, secs: u64) -> Self {
        self.shutdown_timeout_secs = secs;
        self
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Broadcast interval as a duration (never zero).
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// CPU measurement window as a duration.
    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_ms)
    }

    /// Shutdown drain timeout as a duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// The static directory to serve, with a relative path resolved
    /// against `base_dir`.
    pub fn resolve_static_path(&self, base_dir: &Path) -> Option<PathBuf> {
        if !self.static_enabled {
            return None;
        }
        let path = PathBuf::from(self.static_path.as_ref()?);
        if path.is_absolute() {
            Some(path)
        } else {
            Some(base_dir.join(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_path_resolution() {
        let config = WebConfig::default();
        assert_eq!(
            config.resolve_static_path(Path::new("/opt/statcast")),
            Some(PathBuf::from("/opt/statcast/html"))
        );

        let disabled = WebConfig::default().with_static_path(None);
        assert_eq!(disabled.resolve_static_path(Path::new("/opt")), None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: WebConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.interval_ms, crate::DEFAULT_INTERVAL_MS);
        assert_eq!(config.event_name.as_deref(), Some("update"));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = WebConfig::default().with_interval_ms(0);
        assert_eq!(config.interval(), Duration::from_millis(1));
    }
}
