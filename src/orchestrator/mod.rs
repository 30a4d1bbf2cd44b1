//! Orchestrator collaborators.
//!
//! # Data Flow
//! ```text
//! OrchestratorConfig
//!     → operations.rs     (long-running operation registry)
//!     → user_artifacts.rs (upload directories under the artifact root)
//!     → debug.rs          (static + mutable debug variables)
//!     → controller.rs     (HTTP routes over all three)
//! ```
//!
//! # Design Decisions
//! - Every collaborator is built once and shared through `Arc`
//! - The controller receives references; it never builds its dependencies

pub mod controller;
pub mod debug;
pub mod operations;
pub mod user_artifacts;

pub use controller::{Controller, ControllerConfig, DEFAULT_WAIT_OPERATION_DURATION};
pub use debug::{DebugVariablesManager, StaticVariables};
pub use operations::MapOperationManager;
pub use user_artifacts::{UserArtifactsManager, UserArtifactsOptions};
