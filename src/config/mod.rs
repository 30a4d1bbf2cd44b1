//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (lookup each ORCHESTRATOR_* variable, apply defaults)
//!     → OrchestratorConfig (resolved once, immutable)
//!     → validation.rs (pre-flight semantic checks)
//!     → shared by reference with the subsystem builder and listeners
//! ```
//!
//! # Design Decisions
//! - No config file and no CLI flags; the environment is the only source
//! - Absent variables silently fall back to defaults
//! - Paths under the artifact root are derived in one place

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{AndroidBuild, ArtifactPaths, OrchestratorConfig, TlsPaths};
