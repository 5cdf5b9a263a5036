//! # statcast - live host telemetry over Server-Sent Events
//!
//! Periodically samples host telemetry (CPU load, temperature, memory, disk,
//! CPU frequency) and fans each sample out to every connected subscriber of
//! a long-lived `text/event-stream` response.
//!
//! ## Features
//!
//! - **Fixed-interval sampling**: one immutable snapshot per tick
//! - **Partial-failure tolerance**: a failing sensor or a broken subscriber
//!   never degrades the stream for anyone else
//! - **Subscriber registry**: every live subscriber receives the same frame
//!   in each broadcast pass
//! - **Host info endpoint**: OS, kernel, CPU and capacity summary as JSON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statcast::{spawn_web_server, SystemCollector, WebConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WebConfig::default().with_port(8080);
//!     let provider = Arc::new(SystemCollector::new(config.cpu_window()));
//!
//!     let server = spawn_web_server(config, provider, std::path::Path::new(".")).await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod metrics;
pub mod web;

// Re-export public API
pub use error::{Result, SystemError};
pub use metrics::{
    collector::SystemCollector,
    data::{DiskStats, HostInfo, MemoryStats, StatusSnapshot},
    sampler::StatusSampler,
    traits::MetricsProvider,
};

pub use web::{
    spawn_web_server, start_web_server, AppState, BroadcastLoop, ServerHandle, StatusEncoder,
    SubscriberRegistry, WebConfig,
};

/// The default broadcast interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 2000;

/// The default CPU usage measurement window in milliseconds
pub const DEFAULT_CPU_SAMPLE_MS: u64 = 1000;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8080;

/// The default event name for stream frames
pub const DEFAULT_EVENT_NAME: &str = "update";
