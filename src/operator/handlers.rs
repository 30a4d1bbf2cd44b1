//! Device and control-plane HTTP handlers.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::Result;
use crate::operator::{validate_device_id, Device, DevicePool, InfraConfig, OperatorError, PolledSet};
use crate::routing::intercept::InterceptRule;
use crate::routing::RouteTable;

/// State shared by every device-pool handler.
#[derive(Clone)]
pub struct OperatorState {
    pub pool: Arc<DevicePool>,
    pub polled: Arc<PolledSet>,
    pub infra: Arc<InfraConfig>,
    pub intercept: InterceptRule,
    /// Directory intercepted paths are resolved against.
    pub asset_root: Arc<PathBuf>,
    /// Parent of every device's files directory.
    pub devices_root: Arc<PathBuf>,
}

/// Build the base route table exposing the device pool.
///
/// A device registered as `id` serves its files from `devices_root/id`.
pub fn create_http_handlers(
    pool: Arc<DevicePool>,
    polled: Arc<PolledSet>,
    infra: InfraConfig,
    intercept: InterceptRule,
    asset_root: PathBuf,
    devices_root: PathBuf,
) -> Result<RouteTable> {
    let state = OperatorState {
        pool,
        polled,
        infra: Arc::new(infra),
        intercept,
        asset_root: Arc::new(asset_root),
        devices_root: Arc::new(devices_root),
    };

    let mut table = RouteTable::new();
    table
        .scope(state)
        .route("/devices", Method::GET, list_devices)?
        .route("/devices", Method::POST, register_device)?
        .route("/devices/{id}", Method::GET, get_device)?
        .route("/devices/{id}", Method::DELETE, unregister_device)?
        .route("/devices/{id}/files/{*path}", Method::GET, get_device_file)?
        .route("/infra_config", Method::GET, get_infra_config)?
        .route("/polled_connections", Method::GET, list_polled)?
        .route("/polled_connections", Method::POST, open_polled)?
        .route("/polled_connections/{id}", Method::DELETE, close_polled)?
        .route("/polled_connections/{id}/messages", Method::GET, drain_messages)?
        .route("/polled_connections/{id}/messages", Method::POST, push_message)?;
    Ok(table)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterDevice {
    pub device_id: String,
    #[serde(default)]
    pub info: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct OpenPolled {
    pub device_id: String,
}

async fn list_devices(State(state): State<OperatorState>) -> Json<Vec<String>> {
    Json(state.pool.list())
}

async fn register_device(
    State(state): State<OperatorState>,
    Json(req): Json<RegisterDevice>,
) -> std::result::Result<(StatusCode, Json<Device>), OperatorError> {
    validate_device_id(&req.device_id)?;
    let device = state.pool.register(Device {
        files_dir: state.devices_root.join(&req.device_id),
        id: req.device_id,
        info: req.info,
    })?;
    Ok((StatusCode::CREATED, Json(device.as_ref().clone())))
}

async fn get_device(
    State(state): State<OperatorState>,
    UrlPath(id): UrlPath<String>,
) -> std::result::Result<Json<Device>, OperatorError> {
    match state.pool.get(&id) {
        Some(device) => Ok(Json(device.as_ref().clone())),
        None => Err(OperatorError::DeviceNotFound(id)),
    }
}

async fn unregister_device(
    State(state): State<OperatorState>,
    UrlPath(id): UrlPath<String>,
) -> std::result::Result<StatusCode, OperatorError> {
    state.pool.unregister(&id)?;
    let closed = state.polled.close_device(&id);
    if closed > 0 {
        tracing::debug!(device_id = %id, closed, "Closed polled connections of unregistered device");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Serve a file from a device, unless the interception rule swaps it for a
/// maintainer-owned asset.
async fn get_device_file(
    State(state): State<OperatorState>,
    UrlPath((id, file)): UrlPath<(String, String)>,
    request: Request<Body>,
) -> Response {
    let Some(device) = state.pool.get(&id) else {
        return OperatorError::DeviceNotFound(id).into_response();
    };

    let file = file.trim_start_matches('/');
    let request_path = format!("/{}", file);

    let resolved = match (state.intercept)(&request_path) {
        Some(replacement) => {
            tracing::debug!(device_id = %id, path = %request_path, replacement = %replacement, "Intercepting device file");
            state.asset_root.join(replacement)
        }
        None => match safe_join(&device.files_dir, file) {
            Some(path) => path,
            None => return OperatorError::InvalidPath(request_path).into_response(),
        },
    };

    match ServeFile::new(resolved).oneshot(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}

async fn get_infra_config(State(state): State<OperatorState>) -> Json<InfraConfig> {
    Json(state.infra.as_ref().clone())
}

async fn list_polled(State(state): State<OperatorState>) -> impl IntoResponse {
    Json(state.polled.list())
}

async fn open_polled(
    State(state): State<OperatorState>,
    Json(req): Json<OpenPolled>,
) -> std::result::Result<(StatusCode, Json<serde_json::Value>), OperatorError> {
    if state.pool.get(&req.device_id).is_none() {
        return Err(OperatorError::DeviceNotFound(req.device_id));
    }
    let connection_id = state.polled.open(&req.device_id)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "connection_id": connection_id })),
    ))
}

async fn close_polled(
    State(state): State<OperatorState>,
    UrlPath(id): UrlPath<String>,
) -> std::result::Result<StatusCode, OperatorError> {
    if state.polled.close(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(OperatorError::ConnectionNotFound(id))
    }
}

async fn drain_messages(
    State(state): State<OperatorState>,
    UrlPath(id): UrlPath<String>,
) -> std::result::Result<Json<Vec<serde_json::Value>>, OperatorError> {
    state.polled.drain(&id).map(Json)
}

async fn push_message(
    State(state): State<OperatorState>,
    UrlPath(id): UrlPath<String>,
    Json(message): Json<serde_json::Value>,
) -> std::result::Result<StatusCode, OperatorError> {
    state.polled.push(&id, message)?;
    Ok(StatusCode::ACCEPTED)
}

/// Join `file` under `root`, refusing anything that could escape it.
fn safe_join(root: &Path, file: &str) -> Option<PathBuf> {
    let relative = Path::new(file);
    let clean = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    clean.then(|| root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::fallback::Fallback;
    use crate::routing::intercept::maybe_intercept;
    use axum::Router;

    struct Fixture {
        _dir: tempfile::TempDir,
        router: Router,
        pool: Arc<DevicePool>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("assets");
        let runtimes = dir.path().join("runtimes");
        let device_files = runtimes.join("cvd-1");

        std::fs::create_dir_all(assets.join("intercept/js")).unwrap();
        std::fs::write(assets.join("intercept/js/server_connector.js"), "// orchestrator connector").unwrap();
        std::fs::create_dir_all(device_files.join("js")).unwrap();
        std::fs::write(device_files.join("js/server_connector.js"), "// device connector").unwrap();
        std::fs::write(device_files.join("js/app.js"), "// device app").unwrap();

        let pool = Arc::new(DevicePool::new());
        pool.register(Device {
            id: "cvd-1".into(),
            files_dir: device_files,
            info: serde_json::json!({}),
        })
        .unwrap();

        let table = create_http_handlers(
            Arc::clone(&pool),
            Arc::new(PolledSet::new()),
            InfraConfig::default(),
            maybe_intercept,
            assets.clone(),
            runtimes,
        )
        .unwrap();
        let router = table.into_router(Fallback::Static(assets.join("static")));

        Fixture {
            _dir: dir,
            router,
            pool,
        }
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
        let res = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn server_connector_is_served_from_intercept_dir() {
        let fx = fixture();
        let (status, body) = get(&fx.router, "/devices/cvd-1/files/js/server_connector.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "// orchestrator connector");
    }

    #[tokio::test]
    async fn other_device_files_come_from_device() {
        let fx = fixture();
        let (status, body) = get(&fx.router, "/devices/cvd-1/files/js/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "// device app");

        let (status, _) = get(&fx.router, "/devices/cvd-1/files/js/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn device_file_errors() {
        let fx = fixture();
        let (status, _) = get(&fx.router, "/devices/cvd-9/files/js/app.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(&fx.router, "/devices/cvd-1/files/../secret").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn device_registration_round() {
        let fx = fixture();
        let body = serde_json::json!({ "device_id": "cvd-2", "info": { "type": "phone" } }).to_string();
        let register = || {
            Request::post("/devices")
                .header("content-type", "application/json")
                .body(Body::from(body.clone()))
                .unwrap()
        };

        let res = fx.router.clone().oneshot(register()).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let res = fx.router.clone().oneshot(register()).await.unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let (status, body) = get(&fx.router, "/devices").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"["cvd-1","cvd-2"]"#);

        let res = fx
            .router
            .clone()
            .oneshot(Request::delete("/devices/cvd-2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(fx.pool.list(), vec!["cvd-1".to_string()]);
    }

    fn register_request(body: serde_json::Value) -> Request<Body> {
        Request::post("/devices")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn clients_cannot_choose_the_files_dir() {
        let fx = fixture();

        let res = fx
            .router
            .clone()
            .oneshot(register_request(serde_json::json!({ "device_id": "evil", "files_dir": "/" })))
            .await
            .unwrap();
        assert!(res.status().is_client_error());
        assert!(fx.pool.get("evil").is_none());

        let res = fx
            .router
            .clone()
            .oneshot(register_request(serde_json::json!({ "device_id": "evil" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value.get("files_dir").is_none());

        let device = fx.pool.get("evil").unwrap();
        assert_eq!(device.files_dir, fx._dir.path().join("runtimes").join("evil"));

        let (status, _) = get(&fx.router, "/devices/evil/files/etc/passwd").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn device_ids_must_be_plain_names() {
        let fx = fixture();
        for id in ["..", "../..", "a/b", ""] {
            let res = fx
                .router
                .clone()
                .oneshot(register_request(serde_json::json!({ "device_id": id })))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "device id {id:?}");
        }
        assert_eq!(fx.pool.list(), vec!["cvd-1".to_string()]);
    }

    #[tokio::test]
    async fn unregistering_closes_polled_connections() {
        let dir = tempfile::tempdir().unwrap();
        let pool = Arc::new(DevicePool::new());
        let polled = Arc::new(PolledSet::new());
        pool.register(Device {
            id: "cvd-1".into(),
            files_dir: dir.path().join("cvd-1"),
            info: serde_json::Value::Null,
        })
        .unwrap();
        let connection = polled.open("cvd-1").unwrap();

        let router = create_http_handlers(
            Arc::clone(&pool),
            Arc::clone(&polled),
            InfraConfig::default(),
            maybe_intercept,
            dir.path().to_path_buf(),
            dir.path().to_path_buf(),
        )
        .unwrap()
        .into_router(Fallback::Static(dir.path().join("static")));

        let res = router
            .oneshot(Request::delete("/devices/cvd-1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(polled.list().is_empty());
        assert!(polled.drain(&connection).is_err());
    }

    #[test]
    fn full_queue_maps_to_too_many_requests() {
        let res = OperatorError::QueueFull("c".into()).into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let res = OperatorError::TooManyConnections("cvd-1".into()).into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn infra_config_payload() {
        let fx = fixture();
        let (status, body) = get(&fx.router, "/infra_config").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["type"], "config");
        assert_eq!(value["ice_servers"][0]["urls"][0], "stun:stun.l.google.com:19302");
    }

    #[tokio::test]
    async fn polled_connection_requires_known_device() {
        let fx = fixture();
        let open = |device: &str| {
            Request::post("/polled_connections")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({ "device_id": device }).to_string()))
                .unwrap()
        };

        let res = fx.router.clone().oneshot(open("cvd-9")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = fx.router.clone().oneshot(open("cvd-1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let id = value["connection_id"].as_str().unwrap().to_string();

        let res = fx
            .router
            .clone()
            .oneshot(
                Request::post(format!("/polled_connections/{id}/messages"))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"offer":"sdp"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);

        let (status, body) = get(&fx.router, &format!("/polled_connections/{id}/messages")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"[{"offer":"sdp"}]"#);
    }

    #[test]
    fn safe_join_rejects_escapes() {
        let root = Path::new("/srv/device");
        assert_eq!(safe_join(root, "js/app.js"), Some(PathBuf::from("/srv/device/js/app.js")));
        assert_eq!(safe_join(root, "../etc/passwd"), None);
        assert_eq!(safe_join(root, "/etc/passwd"), None);
    }
}
