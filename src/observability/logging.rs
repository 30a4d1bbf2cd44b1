//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber once, at process start
//! - Honor `RUST_LOG`, falling back to an info-level default
//!
//! # Design Decisions
//! - Human-readable fmt output; the process runs under a system supervisor
//!   that captures stderr
//! - Initialization failure is reported, not fatal

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "host_orchestrator=info,tower_http=info";

/// Build the filter from `RUST_LOG`, or the default.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn second_init_is_refused() {
        init_logging();
        assert!(!init_logging());
    }
}
