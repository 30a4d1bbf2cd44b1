//! Router composition.
//!
//! # Responsibilities
//! - Start from the device-pool routes, with intercept rules applied
//! - Add the controller's routes, rejecting conflicts
//! - Install the fallback chosen from the configuration
//! - Wrap everything in request-id and trace layers
//!
//! # Design Decisions
//! - The result is immutable and shared by every listener
//! - Composition performs no I/O

use axum::Router;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::OrchestratorConfig;
use crate::error::Result;
use crate::lifecycle::startup::Subsystems;
use crate::operator::create_http_handlers;
use crate::routing::fallback::Fallback;
use crate::routing::intercept::maybe_intercept;

/// Build the single router served by every listener.
pub fn compose_router(subsystems: &Subsystems, config: &OrchestratorConfig) -> Result<Router> {
    let fallback = Fallback::select(config)?;

    let mut table = create_http_handlers(
        subsystems.pool.clone(),
        subsystems.polled.clone(),
        subsystems.infra.clone(),
        maybe_intercept,
        config.asset_root.clone(),
        config.paths.runtimes_root_dir.clone(),
    )?;
    subsystems.controller.add_routes(&mut table)?;

    tracing::info!(routes = table.len(), fallback = %fallback, "Router composed");

    Ok(table
        .into_router(fallback)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)))
}
