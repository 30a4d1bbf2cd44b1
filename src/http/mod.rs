//! HTTP protocol helpers shared by the router.
//!
//! # Data Flow
//! ```text
//! request with no matching control-plane route
//!     → routing::fallback (selected once at startup)
//!     → proxy.rs (rewrite URI, strip hop-by-hop headers, forward)
//!     → web UI origin
//! ```

pub mod proxy;

pub use proxy::ReverseProxy;
