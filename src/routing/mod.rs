//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Composition (at startup):
//!     operator handlers (intercept.rs applied to device files)
//!     → table.rs   (controller routes added, conflicts rejected)
//!     → fallback.rs (web UI proxy or static files)
//!     → compose.rs  (request-id + trace layers)
//!     → Frozen axum::Router, cloned into every listener
//! ```
//!
//! # Design Decisions
//! - Routes are registered once, immutable at runtime
//! - A (method, path) pair has exactly one owner
//! - Anything unmatched goes to the fallback, never to a 404 handler of our own

pub mod compose;
pub mod fallback;
pub mod intercept;
pub mod table;

pub use compose::compose_router;
pub use fallback::Fallback;
pub use table::RouteTable;
