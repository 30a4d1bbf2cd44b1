//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate the resolved configuration
//! - Build every subsystem in dependency order
//! - Compose the shared router
//! - Start the listeners under fail-fast supervision
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)
//! - Missing TLS material fails the HTTPS listener, not startup

use std::sync::Arc;

use axum::Router;

use crate::config::validation::validate_config;
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::lifecycle::supervisor::{ServerStarter, Supervisor};
use crate::net::listener::{self, serve_control_socket, serve_http, serve_https};
use crate::operator::{DevicePool, InfraConfig, PolledSet};
use crate::orchestrator::{
    Controller, ControllerConfig, DebugVariablesManager, MapOperationManager, StaticVariables,
    UserArtifactsManager, UserArtifactsOptions, DEFAULT_WAIT_OPERATION_DURATION,
};
use crate::routing::compose_router;

/// Every long-lived collaborator, built once and shared.
#[derive(Debug, Clone)]
pub struct Subsystems {
    pub pool: Arc<DevicePool>,
    pub polled: Arc<PolledSet>,
    pub infra: InfraConfig,
    pub operations: Arc<MapOperationManager>,
    pub user_artifacts: Arc<UserArtifactsManager>,
    pub debug_vars: Arc<DebugVariablesManager>,
    pub controller: Controller,
}

impl Subsystems {
    /// Build the subsystems from `config`. Performs no I/O.
    pub fn build(config: &OrchestratorConfig) -> Result<Self> {
        let pool = Arc::new(DevicePool::new());
        let polled = Arc::new(PolledSet::new());
        let infra = InfraConfig::default();
        let debug_vars = Arc::new(DebugVariablesManager::new(StaticVariables::from(
            &config.tools_build,
        )));
        let user_artifacts = UserArtifactsManager::new(UserArtifactsOptions::with_uuid_names(
            config.paths.user_artifacts_dir.clone(),
        ))
        .map(Arc::new)
        .map_err(|e| OrchestratorError::Construction {
            subsystem: "user artifacts manager",
            reason: e.to_string(),
        })?;
        let operations = Arc::new(MapOperationManager::new());

        let controller = Controller {
            config: Arc::new(ControllerConfig::from(config)),
            operations: operations.clone(),
            wait_operation_duration: DEFAULT_WAIT_OPERATION_DURATION,
            user_artifacts: user_artifacts.clone(),
            debug_vars: debug_vars.clone(),
        };

        tracing::debug!(
            user_artifacts_dir = %user_artifacts.root_dir().display(),
            "Subsystems built"
        );

        Ok(Self {
            pool,
            polled,
            infra,
            operations,
            user_artifacts,
            debug_vars,
            controller,
        })
    }
}

/// One starter per enabled listener, all serving `router`.
pub fn listener_starters(config: &OrchestratorConfig, router: Router) -> Vec<ServerStarter> {
    let mut starters = vec![
        ServerStarter::new(
            listener::CONTROL_SOCKET,
            serve_control_socket(config.socket_path.clone(), router.clone()),
        ),
        ServerStarter::new(
            listener::HTTP,
            serve_http(config.http_port.clone(), router.clone()),
        ),
    ];
    if let Some(port) = &config.https_port {
        starters.push(ServerStarter::new(
            listener::HTTPS,
            serve_https(port.clone(), config.tls.clone(), router),
        ));
    }
    starters
}

/// Validate, build, compose and serve. Returns only when a listener fails,
/// or when every listener has stopped on its own.
pub async fn run(config: OrchestratorConfig) -> Result<()> {
    validate_config(&config).map_err(|errors| {
        OrchestratorError::InvalidConfig(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;

    let subsystems = Subsystems::build(&config)?;
    let router = compose_router(&subsystems, &config)?;

    let mut supervisor = Supervisor::new();
    for starter in listener_starters(&config, router) {
        tracing::info!(listener = starter.name(), "Listener scheduled");
        supervisor.add(starter);
    }
    supervisor.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_listener_only_when_port_set() {
        let config = OrchestratorConfig::default();
        let names: Vec<_> = listener_starters(&config, Router::new())
            .iter()
            .map(ServerStarter::name)
            .collect();
        assert_eq!(names, vec!["control-socket", "http"]);

        let config = OrchestratorConfig {
            https_port: Some("1443".into()),
            ..Default::default()
        };
        let names: Vec<_> = listener_starters(&config, Router::new())
            .iter()
            .map(ServerStarter::name)
            .collect();
        assert_eq!(names, vec!["control-socket", "http", "https"]);
    }

    #[test]
    fn build_shares_collaborators_with_controller() {
        let subsystems = Subsystems::build(&OrchestratorConfig::default()).unwrap();
        assert!(Arc::ptr_eq(&subsystems.operations, &subsystems.controller.operations));
        assert!(Arc::ptr_eq(&subsystems.debug_vars, &subsystems.controller.debug_vars));
        assert_eq!(
            subsystems.user_artifacts.root_dir(),
            std::path::Path::new("/var/lib/cuttlefish-common/user_artifacts")
        );
        assert_eq!(
            subsystems.controller.wait_operation_duration,
            DEFAULT_WAIT_OPERATION_DURATION
        );
    }

    #[test]
    fn empty_user_artifacts_dir_fails_construction() {
        let mut config = OrchestratorConfig::default();
        config.paths.user_artifacts_dir = std::path::PathBuf::new();
        let err = Subsystems::build(&config).unwrap_err();
        assert!(matches!(err, OrchestratorError::Construction { subsystem: "user artifacts manager", .. }));
    }

    #[tokio::test]
    async fn port_clash_is_rejected_before_listening() {
        let config = OrchestratorConfig {
            https_port: Some("1080".into()),
            ..Default::default()
        };
        let err = run(config).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(_)));
    }
}
