//! Bridge startup and lifecycle errors.

use serde_json::json;
use serde_json::Value;
use thiserror::Error;
use uia_bridge_protocol::ErrorCategory;

use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
    #[error("Failed to setup signal handler: {0}")]
    SignalSetup(String),
    #[error("Failed to load device fixture {path}: {reason}")]
    Fixture { path: String, reason: String },
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaemonError {
    /// Returns the error category for programmatic handling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DaemonError::Fixture { .. } => ErrorCategory::InvalidInput,
            DaemonError::Bind { .. } | DaemonError::SignalSetup(_) | DaemonError::Io(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns structured context about the error for debugging.
    pub fn context(&self) -> Value {
        match self {
            DaemonError::Bind { addr, reason } => {
                json!({ "operation": "bind", "addr": addr, "reason": reason })
            }
            DaemonError::SignalSetup(reason) => {
                json!({ "operation": "signal_setup", "reason": reason })
            }
            DaemonError::Fixture { path, reason } => {
                json!({ "operation": "load_fixture", "path": path, "reason": reason })
            }
            DaemonError::Io(e) => json!({ "operation": "io", "reason": e.to_string() }),
        }
    }

    /// Returns a helpful suggestion for resolving the error.
    pub fn suggestion(&self) -> String {
        match self {
            DaemonError::Bind { .. } => {
                "Another process may own the port. Pick another with --port or UIA_BRIDGE_PORT."
                    .to_string()
            }
            DaemonError::SignalSetup(_) => {
                "Signal handler setup failed. Check system signal configuration.".to_string()
            }
            DaemonError::Fixture { .. } => {
                "Check that the fixture file exists and contains a JSON device description."
                    .to_string()
            }
            DaemonError::Io(_) => "Check the network configuration and retry.".to_string(),
        }
    }

    /// Returns whether this error is potentially transient and may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DaemonError::Bind { .. } | DaemonError::Io(_))
    }
}

impl From<TransportError> for DaemonError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Io(e) => DaemonError::Io(e),
            other => DaemonError::Io(std::io::Error::other(other.to_string())),
        }
    }
}
