//! Host orchestrator composition root.
//!
//! Resolves configuration from the environment, builds the device pool and
//! orchestration collaborators, composes one router and serves it on a Unix
//! control socket, plaintext HTTP and optional HTTPS.
//!
//! # Architecture Overview
//!
//! ```text
//!   env ──▶ config ──▶ lifecycle::startup ──▶ routing::compose_router
//!                           │                        │
//!                           ▼                        ▼
//!                  operator + orchestrator    RouteTable + Fallback
//!                                                    │
//!                                                    ▼
//!                      net::listener (control-socket | http | https)
//!                                                    │
//!                                                    ▼
//!                               lifecycle::supervisor (fail fast)
//! ```

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod routing;

// Collaborators
pub mod operator;
pub mod orchestrator;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, Result};
pub use lifecycle::run;
