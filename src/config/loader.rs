//! Configuration loading from the environment.
//!
//! Resolution never fails. A variable that is present wins over the default,
//! even when empty; an empty value for an optional setting means "disabled".

use std::path::PathBuf;

use crate::config::schema::*;

pub const ENV_SOCKET_PATH: &str = "ORCHESTRATOR_SOCKET_PATH";
pub const ENV_HTTP_PORT: &str = "ORCHESTRATOR_HTTP_PORT";
pub const ENV_HTTPS_PORT: &str = "ORCHESTRATOR_HTTPS_PORT";
pub const ENV_TLS_CERT_DIR: &str = "ORCHESTRATOR_TLS_CERT_DIR";
pub const ENV_WEBUI_URL: &str = "ORCHESTRATOR_WEBUI_URL";
pub const ENV_CVD_USER: &str = "ORCHESTRATOR_CVD_USER";
pub const ENV_ANDROID_BUILD_URL: &str = "ORCHESTRATOR_ANDROID_BUILD_URL";
pub const ENV_TOOLS_BUILD_ID: &str = "ORCHESTRATOR_CVDBIN_ANDROID_BUILD_ID";
pub const ENV_TOOLS_BUILD_TARGET: &str = "ORCHESTRATOR_CVDBIN_ANDROID_BUILD_TARGET";
pub const ENV_ARTIFACTS_DIR: &str = "ORCHESTRATOR_CVD_ARTIFACTS_DIR";

impl OrchestratorConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let tls_cert_dir = or_default(ENV_TLS_CERT_DIR, DEFAULT_TLS_CERT_DIR);
        let artifacts_dir = or_default(ENV_ARTIFACTS_DIR, DEFAULT_ARTIFACTS_ROOT_DIR);

        Self {
            socket_path: PathBuf::from(or_default(ENV_SOCKET_PATH, DEFAULT_SOCKET_PATH)),
            http_port: or_default(ENV_HTTP_PORT, DEFAULT_HTTP_PORT),
            https_port: non_empty(ENV_HTTPS_PORT),
            tls: TlsPaths::in_dir(tls_cert_dir),
            web_ui_url: non_empty(ENV_WEBUI_URL),
            cvd_user: non_empty(ENV_CVD_USER),
            android_build_url: or_default(ENV_ANDROID_BUILD_URL, DEFAULT_ANDROID_BUILD_URL),
            tools_build: AndroidBuild {
                id: or_default(ENV_TOOLS_BUILD_ID, DEFAULT_TOOLS_BUILD_ID),
                target: or_default(ENV_TOOLS_BUILD_TARGET, DEFAULT_TOOLS_BUILD_TARGET),
            },
            paths: ArtifactPaths::from_root(artifacts_dir),
            asset_root: PathBuf::from("."),
        }
    }
}
