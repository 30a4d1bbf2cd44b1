//! Listener front-ends.
//!
//! # Responsibilities
//! - Bind the control socket, plaintext HTTP and HTTPS endpoints
//! - Serve the shared router until the endpoint fails
//!
//! # Design Decisions
//! - Every serve function only returns on failure; returning `Ok` means the
//!   accept loop ended, which the supervisor treats as a normal exit
//! - Errors carry the listener name so the operator knows which one died
//! - TCP listeners bind every interface and expose the peer address to
//!   handlers as `ConnectInfo<SocketAddr>`

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;

use crate::config::TlsPaths;
use crate::error::{OrchestratorError, Result};
use crate::net::tls::load_tls_config;

pub const CONTROL_SOCKET: &str = "control-socket";
pub const HTTP: &str = "http";
pub const HTTPS: &str = "https";

/// Serve plaintext HTTP on `0.0.0.0:port`.
pub async fn serve_http(port: String, router: Router) -> Result<()> {
    let addr = parse_port(HTTP, &port)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| OrchestratorError::listener(HTTP, e))?;

    tracing::info!(address = %addr, "HTTP listener started");
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| OrchestratorError::listener(HTTP, e))
}

/// Serve HTTPS on `0.0.0.0:port` with the certificate and key in `tls`.
pub async fn serve_https(port: String, tls: TlsPaths, router: Router) -> Result<()> {
    let addr = parse_port(HTTPS, &port)?;
    let rustls = load_tls_config(&tls)
        .await
        .map_err(|e| OrchestratorError::listener(HTTPS, e))?;

    tracing::info!(address = %addr, cert = %tls.cert_path.display(), "HTTPS listener started");
    axum_server::bind_rustls(addr, rustls)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| OrchestratorError::listener(HTTPS, e))
}

/// Serve the router on a Unix domain socket at `path`.
#[cfg(unix)]
pub async fn serve_control_socket(path: PathBuf, router: Router) -> Result<()> {
    remove_stale_socket(&path).map_err(|e| OrchestratorError::listener(CONTROL_SOCKET, e))?;

    let listener = tokio::net::UnixListener::bind(&path)
        .map_err(|e| OrchestratorError::listener(CONTROL_SOCKET, e))?;

    tracing::info!(path = %path.display(), "Control socket listener started");
    axum::serve(listener, router)
        .await
        .map_err(|e| OrchestratorError::listener(CONTROL_SOCKET, e))
}

#[cfg(not(unix))]
pub async fn serve_control_socket(path: PathBuf, _router: Router) -> Result<()> {
    Err(OrchestratorError::listener(
        CONTROL_SOCKET,
        std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("unix sockets unavailable for {}", path.display()),
        ),
    ))
}

/// A socket file left behind by a previous run blocks `bind`.
#[cfg(unix)]
fn remove_stale_socket(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::FileTypeExt;

    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            tracing::debug!(path = %path.display(), "Removing stale control socket");
            std::fs::remove_file(path)
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn parse_port(listener: &'static str, port: &str) -> Result<SocketAddr> {
    let port: u16 = port.trim().parse().map_err(|e| {
        OrchestratorError::listener(
            listener,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid port {:?}: {}", port, e),
            ),
        )
    })?;
    Ok(SocketAddr::from(([0, 0, 0, 0], port)))
}
