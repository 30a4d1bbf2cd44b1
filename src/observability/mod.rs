//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields: listener, route, operation, ...)
//!     → logging.rs subscriber (EnvFilter + fmt layer)
//!
//! HTTP requests:
//!     → x-request-id set or propagated by the router layers
//!     → tower_http TraceLayer span per request
//! ```

pub mod logging;

pub use logging::init_logging;
