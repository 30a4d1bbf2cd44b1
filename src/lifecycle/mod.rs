//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolved config → Validate → Build subsystems → Compose router
//!
//! Supervision (supervisor.rs):
//!     control socket | http | https (optional)
//!     → first failure aborts the rest and is returned to main
//!
//! Exit (exit.rs):
//!     outcome → logged cause → status 0 or 1
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then collaborators, then listeners
//! - No graceful shutdown; a failed listener takes the process down

pub mod exit;
pub mod startup;
pub mod supervisor;

pub use startup::{run, Subsystems};
pub use supervisor::{ServerStarter, Supervisor};
