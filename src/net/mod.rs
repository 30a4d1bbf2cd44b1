//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Shared Router
//!     → listener.rs serve_control_socket (Unix socket, local clients)
//!     → listener.rs serve_http           (0.0.0.0:http_port)
//!     → listener.rs serve_https          (0.0.0.0:https_port)
//!         → tls.rs (certificate + key loaded before bind)
//! ```
//!
//! # Design Decisions
//! - One router, several front-ends; listeners add no routes of their own
//! - TLS material is checked when the HTTPS listener starts, not earlier

pub mod listener;
pub mod tls;
