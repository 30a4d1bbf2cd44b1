//! Configuration schema definitions.
//!
//! Every value here is resolved once at startup by [`crate::config::loader`]
//! and never changes afterwards. Types derive `Serialize` so the resolved
//! configuration can be logged and exposed through debug endpoints.

use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOCKET_PATH: &str = "/run/cuttlefish/operator";
pub const DEFAULT_HTTP_PORT: &str = "1080";
pub const DEFAULT_TLS_CERT_DIR: &str = "/etc/cuttlefish-common/host_orchestrator/cert";
pub const DEFAULT_ANDROID_BUILD_URL: &str = "https://androidbuildinternal.googleapis.com";
pub const DEFAULT_TOOLS_BUILD_ID: &str = "10796991";
pub const DEFAULT_TOOLS_BUILD_TARGET: &str = "aosp_cf_x86_64_phone-trunk_staging-userdebug";
pub const DEFAULT_ARTIFACTS_ROOT_DIR: &str = "/var/lib/cuttlefish-common";

/// Directory served by the static fallback, relative to the asset root.
pub const STATIC_FILES_DIR: &str = "static";
/// Directory holding intercepted device assets, relative to the asset root.
pub const INTERCEPT_DIR: &str = "intercept";

/// Root configuration for the orchestrator.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Unix socket the control plane listens on for local clients.
    pub socket_path: PathBuf,

    /// Plaintext HTTP port. Kept as text; it is only parsed at bind time.
    pub http_port: String,

    /// HTTPS port. `None` disables the TLS listener.
    pub https_port: Option<String>,

    /// Certificate and key used by the TLS listener.
    pub tls: TlsPaths,

    /// Web UI origin. `None` selects the static file fallback.
    pub web_ui_url: Option<String>,

    /// User that device-management subprocesses run as.
    pub cvd_user: Option<String>,

    /// Base URL of the Android build service.
    pub android_build_url: String,

    /// Prebuilt toolset the orchestrator expects to use.
    pub tools_build: AndroidBuild,

    /// Directories derived from the artifact root.
    pub paths: ArtifactPaths,

    /// Base directory for `static/` and `intercept/`.
    pub asset_root: PathBuf,
}

impl OrchestratorConfig {
    pub fn static_files_dir(&self) -> PathBuf {
        self.asset_root.join(STATIC_FILES_DIR)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            http_port: DEFAULT_HTTP_PORT.to_string(),
            https_port: None,
            tls: TlsPaths::in_dir(DEFAULT_TLS_CERT_DIR),
            web_ui_url: None,
            cvd_user: None,
            android_build_url: DEFAULT_ANDROID_BUILD_URL.to_string(),
            tools_build: AndroidBuild {
                id: DEFAULT_TOOLS_BUILD_ID.to_string(),
                target: DEFAULT_TOOLS_BUILD_TARGET.to_string(),
            },
            paths: ArtifactPaths::from_root(DEFAULT_ARTIFACTS_ROOT_DIR),
            asset_root: PathBuf::from("."),
        }
    }
}

/// TLS material locations.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TlsPaths {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

impl TlsPaths {
    /// `cert.pem` and `key.pem` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            cert_path: dir.join("cert.pem"),
            key_path: dir.join("key.pem"),
        }
    }
}

/// An Android build coordinate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AndroidBuild {
    pub id: String,
    pub target: String,
}

/// Directory layout under the artifact root.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub root_dir: PathBuf,
    pub tools_dir: PathBuf,
    pub artifacts_root_dir: PathBuf,
    pub runtimes_root_dir: PathBuf,
    pub user_artifacts_dir: PathBuf,
}

impl ArtifactPaths {
    /// Derive every artifact directory from `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root_dir = root.into();
        Self {
            tools_dir: root_dir.clone(),
            artifacts_root_dir: root_dir.join("artifacts"),
            runtimes_root_dir: root_dir.join("runtimes"),
            user_artifacts_dir: root_dir.join("user_artifacts"),
            root_dir,
        }
    }
}
