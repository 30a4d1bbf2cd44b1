//! Device pool and control-plane routes.
//!
//! # Data Flow
//! ```text
//! local device process
//!     → POST /devices (over the control socket)
//!     → pool.rs (registry of live devices)
//!
//! browser / client
//!     → handlers.rs (device info, device files, infra config)
//!     → routing::intercept (swap maintainer-owned assets)
//!     → polled.rs (message queues for polling clients)
//! ```
//!
//! # Design Decisions
//! - Registries are plain values shared through `Arc`, never globals
//! - `DashMap` gives per-entry locking so handlers never contend on one lock

pub mod handlers;
pub mod polled;
pub mod pool;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub use handlers::create_http_handlers;
pub use polled::PolledSet;
pub use pool::{validate_device_id, Device, DevicePool};

/// Errors returned by device pool and polled-set operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperatorError {
    #[error("Device {0} is already registered")]
    AlreadyRegistered(String),

    #[error("Device {0} not found")]
    DeviceNotFound(String),

    #[error("Polled connection {0} not found")]
    ConnectionNotFound(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("Invalid device id {0:?}")]
    InvalidDeviceId(String),

    #[error("Polled connection {0} has too many pending messages")]
    QueueFull(String),

    #[error("Device {0} has too many polled connections")]
    TooManyConnections(String),
}

impl IntoResponse for OperatorError {
    fn into_response(self) -> Response {
        let status = match self {
            OperatorError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            OperatorError::DeviceNotFound(_) | OperatorError::ConnectionNotFound(_) => StatusCode::NOT_FOUND,
            OperatorError::InvalidPath(_) | OperatorError::InvalidDeviceId(_) => StatusCode::BAD_REQUEST,
            OperatorError::QueueFull(_) | OperatorError::TooManyConnections(_) => StatusCode::TOO_MANY_REQUESTS,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// ICE server entry handed to WebRTC clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IceServer {
    pub urls: Vec<String>,
}

/// Infrastructure payload served to clients before they connect to a device.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InfraConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub ice_servers: Vec<IceServer>,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            kind: "config".to_string(),
            ice_servers: vec![IceServer {
                urls: vec!["stun:stun.l.google.com:19302".to_string()],
            }],
        }
    }
}
