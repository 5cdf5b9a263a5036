//! Error handling for the statcast telemetry broadcaster.

/// A specialized `Result` type for statcast operations.
pub type Result<T> = std::result::Result<T, SystemError>;

/// The main error type for statcast operations.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A single metrics sub-call failed
    #[error("Failed to read {metric}: {reason}")]
    Provider {
        metric: &'static str,
        reason: String,
    },

    /// Writing or flushing to one subscriber failed
    #[error("Transport write error: {0}")]
    Transport(String),

    /// The connecting transport cannot stream incremental flushes
    #[error("Sink does not support streaming: {0}")]
    UnsupportedSink(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),
}

impl SystemError {
    /// Create a new provider error for the named metric
    pub fn provider_error(metric: &'static str, reason: impl Into<String>) -> Self {
        Self::Provider {
            metric,
            reason: reason.into(),
        }
    }

    /// Create a new transport error
    pub fn transport_error(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new unsupported sink error
    pub fn unsupported_sink(msg: impl Into<String>) -> Self {
        Self::UnsupportedSink(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_names_metric() {
        let err = SystemError::provider_error("temperature", "no sensor");
        assert_eq!(err.to_string(), "Failed to read temperature: no sensor");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SystemError = io.into();
        assert!(matches!(err, SystemError::Io(_)));
    }
}
