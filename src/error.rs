//! Orchestrator-wide error type.
//!
//! Missing environment variables are never errors; they resolve to defaults.
//! Everything else either aborts startup (construction, route conflicts) or
//! aborts the running process (listener failure).

use axum::http::Method;
use thiserror::Error;

/// Result alias for bootstrap operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors raised while starting or running the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Resolved configuration failed pre-flight validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A subsystem could not be built from the resolved configuration.
    #[error("Failed to construct {subsystem}: {reason}")]
    Construction {
        subsystem: &'static str,
        reason: String,
    },

    /// Two handlers claimed the same route.
    #[error("Route conflict: {method} {path} is already registered as {existing}")]
    RouteConflict {
        method: Method,
        path: String,
        existing: String,
    },

    /// A listener's serving operation returned an error.
    #[error("{listener} listener failed: {source}")]
    Listener {
        listener: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A listener task panicked instead of returning.
    #[error("{listener} listener panicked: {message}")]
    ListenerPanicked {
        listener: &'static str,
        message: String,
    },
}

impl OrchestratorError {
    pub(crate) fn listener(listener: &'static str, source: std::io::Error) -> Self {
        Self::Listener { listener, source }
    }

    /// Name of the listener that failed, if this is a listener error.
    pub fn listener_name(&self) -> Option<&'static str> {
        match self {
            Self::Listener { listener, .. } | Self::ListenerPanicked { listener, .. } => {
                Some(*listener)
            }
            _ => None,
        }
    }
}
