//! Orchestrator controller routes.
//!
//! # Responsibilities
//! - Expose operations, user artifacts and debug variables over HTTP
//! - Bound every operation wait by the controller's wait duration
//!
//! # Design Decisions
//! - The controller is handed its collaborators; it constructs none of them
//! - Routes are added to the shared table, so clashes with the device pool
//!   surface as composition errors

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::{AndroidBuild, ArtifactPaths, OrchestratorConfig};
use crate::error::Result;
use crate::orchestrator::debug::{DebugVariablesManager, Variables, Varz};
use crate::orchestrator::operations::{MapOperationManager, Operation, OperationError, OperationResult};
use crate::orchestrator::user_artifacts::{ArtifactError, UserArtifactsManager};
use crate::routing::RouteTable;

/// Upper bound for `POST /operations/{name}/wait`.
pub const DEFAULT_WAIT_OPERATION_DURATION: Duration = Duration::from_secs(2 * 60);

/// Settings the controller needs from the resolved configuration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ControllerConfig {
    pub paths: ArtifactPaths,
    pub cvd_tools_version: AndroidBuild,
    pub android_build_service_url: String,
    pub cvd_user: Option<String>,
}

impl From<&OrchestratorConfig> for ControllerConfig {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            paths: config.paths.clone(),
            cvd_tools_version: config.tools_build.clone(),
            android_build_service_url: config.android_build_url.clone(),
            cvd_user: config.cvd_user.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Controller {
    pub config: Arc<ControllerConfig>,
    pub operations: Arc<MapOperationManager>,
    pub wait_operation_duration: Duration,
    pub user_artifacts: Arc<UserArtifactsManager>,
    pub debug_vars: Arc<DebugVariablesManager>,
}

impl Controller {
    /// Register the controller's routes on `table`.
    pub fn add_routes(&self, table: &mut RouteTable) -> Result<()> {
        table
            .scope(self.clone())
            .route("/operations", Method::GET, list_operations)?
            .route("/operations/{name}", Method::GET, get_operation)?
            .route("/operations/{name}/result", Method::GET, get_operation_result)?
            .route("/operations/{name}/wait", Method::POST, wait_operation)?
            .route("/userartifacts", Method::GET, list_user_artifacts)?
            .route("/userartifacts", Method::POST, create_user_artifacts_dir)?
            .route("/userartifacts/{dir}/{file}", Method::PUT, upload_user_artifact)?
            .route("/_debug/varz", Method::GET, get_varz)?
            .route("/_debug/varz", Method::PUT, put_varz)?
            .route("/_debug/statusz", Method::GET, statusz)?;
        Ok(())
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let status = match self {
            OperationError::NotFound(_) => StatusCode::NOT_FOUND,
            OperationError::AlreadyDone(_) | OperationError::NotDone(_) => StatusCode::CONFLICT,
            OperationError::WaitTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl IntoResponse for ArtifactError {
    fn into_response(self) -> Response {
        let status = match self {
            ArtifactError::InvalidName(_) => StatusCode::BAD_REQUEST,
            ArtifactError::DirNotFound(_) => StatusCode::NOT_FOUND,
            ArtifactError::DirExists(_) => StatusCode::CONFLICT,
            ArtifactError::EmptyRoot | ArtifactError::Io(_) => {
                tracing::error!(error = %self, "User artifacts operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

async fn list_operations(State(ctrl): State<Controller>) -> Json<Vec<Operation>> {
    Json(ctrl.operations.list())
}

async fn get_operation(
    State(ctrl): State<Controller>,
    Path(name): Path<String>,
) -> std::result::Result<Json<Operation>, OperationError> {
    ctrl.operations.get(&name).map(Json)
}

async fn get_operation_result(
    State(ctrl): State<Controller>,
    Path(name): Path<String>,
) -> std::result::Result<Json<OperationResult>, OperationError> {
    ctrl.operations.result(&name).map(Json)
}

async fn wait_operation(
    State(ctrl): State<Controller>,
    Path(name): Path<String>,
) -> std::result::Result<Json<OperationResult>, OperationError> {
    ctrl.operations
        .wait(&name, ctrl.wait_operation_duration)
        .await
        .map(Json)
}

async fn list_user_artifacts(
    State(ctrl): State<Controller>,
) -> std::result::Result<Json<Vec<String>>, ArtifactError> {
    ctrl.user_artifacts.list_dirs().await.map(Json)
}

async fn create_user_artifacts_dir(
    State(ctrl): State<Controller>,
) -> std::result::Result<(StatusCode, Json<serde_json::Value>), ArtifactError> {
    let name = ctrl.user_artifacts.create_dir().await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "name": name }))))
}

async fn upload_user_artifact(
    State(ctrl): State<Controller>,
    Path((dir, file)): Path<(String, String)>,
    body: Body,
) -> std::result::Result<StatusCode, ArtifactError> {
    // `Body` bypasses the default body limit; artifacts are often hundreds of MiB.
    ctrl.user_artifacts
        .write_file(&dir, &file, body.into_data_stream())
        .await?;
    Ok(StatusCode::OK)
}

async fn get_varz(State(ctrl): State<Controller>) -> Json<Varz> {
    Json(ctrl.debug_vars.varz())
}

async fn put_varz(State(ctrl): State<Controller>, Json(vars): Json<Variables>) -> Json<Varz> {
    ctrl.debug_vars.update(vars);
    Json(ctrl.debug_vars.varz())
}

async fn statusz() -> &'static str {
    "ok"
}
