//! TLS material loading.
//!
//! Certificate and key are read and parsed before the HTTPS listener binds,
//! so a missing or malformed file is reported with the offending path.

use std::io::{self, BufReader};
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsPaths;

/// Load the certificate chain and private key named by `paths`.
pub async fn load_tls_config(paths: &TlsPaths) -> io::Result<RustlsConfig> {
    let cert = read_pem(&paths.cert_path, "Certificate").await?;
    let key = read_pem(&paths.key_path, "Private key").await?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(cert.as_slice()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| invalid(&paths.cert_path, e))?;
    if certs.is_empty() {
        return Err(invalid(&paths.cert_path, "no certificates found"));
    }

    match rustls_pemfile::private_key(&mut BufReader::new(key.as_slice())) {
        Ok(Some(_)) => {}
        Ok(None) => return Err(invalid(&paths.key_path, "no private key found")),
        Err(e) => return Err(invalid(&paths.key_path, e)),
    }

    tracing::debug!(
        cert = %paths.cert_path.display(),
        certs = certs.len(),
        "TLS material loaded"
    );
    RustlsConfig::from_pem(cert, key).await
}

async fn read_pem(path: &Path, what: &str) -> io::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| io::Error::new(e.kind(), format!("{} file {}: {}", what, path.display(), e)))
}

fn invalid(path: &Path, reason: impl std::fmt::Display) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{}: {}", path.display(), reason),
    )
}
