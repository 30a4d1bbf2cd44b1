//! Single-host reverse proxy to the web UI.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the configured origin
//! - Strip hop-by-hop headers in both directions
//! - Stream request and response bodies without buffering
//! - Map upstream failures to 502 Bad Gateway
//! - Record the TCP peer in `X-Forwarded-For`
//!
//! # Design Decisions
//! - Scheme and authority come from the target; the target path is joined
//!   with the request path by a single slash
//! - Queries are concatenated with `&` when both sides carry one
//! - The inbound Host header is forwarded unchanged
//! - `http` and `https` origins share one client; TLS roots are the
//!   compiled-in webpki set
//! - Requests arriving on the control socket have no peer address and get
//!   no `X-Forwarded-For` entry

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::error::{OrchestratorError, Result};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Forwards requests to one upstream origin.
#[derive(Clone)]
pub struct ReverseProxy {
    target: Arc<Url>,
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl std::fmt::Debug for ReverseProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReverseProxy")
            .field("target", &self.target.as_str())
            .finish()
    }
}

impl ReverseProxy {
    /// Create a proxy for `target`, which must be an absolute `http` or
    /// `https` URL.
    pub fn new(target: &str) -> Result<Self> {
        let target = Url::parse(target).map_err(|e| OrchestratorError::Construction {
            subsystem: "web UI proxy",
            reason: format!("invalid target {:?}: {}", target, e),
        })?;
        if target.host_str().is_none() {
            return Err(OrchestratorError::Construction {
                subsystem: "web UI proxy",
                reason: format!("target {:?} has no host", target.as_str()),
            });
        }
        if !matches!(target.scheme(), "http" | "https") {
            return Err(OrchestratorError::Construction {
                subsystem: "web UI proxy",
                reason: format!("target scheme {:?} is not http or https", target.scheme()),
            });
        }

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            target: Arc::new(target),
            client,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }
}

/// Fallback handler: forward the request to the proxy target.
pub async fn forward(State(proxy): State<ReverseProxy>, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();

    let Some(uri) = rewrite_uri(&proxy.target, &parts.uri) else {
        tracing::error!(origin = %proxy.target, uri = %parts.uri, "Failed to build upstream URI");
        return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
    };

    tracing::debug!(
        method = %parts.method,
        path = %parts.uri.path(),
        upstream = %uri,
        "Proxying request to web UI"
    );

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    parts.uri = uri;
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);
    if let Some(ip) = peer {
        append_forwarded_for(&mut parts.headers, ip);
    }

    match proxy.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(origin = %proxy.target, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Map `incoming` onto `target`.
pub fn rewrite_uri(target: &Url, incoming: &Uri) -> Option<Uri> {
    let host = target.host_str()?;
    let authority = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let path = join_path(target.path(), incoming.path());
    let query = match (
        target.query().filter(|q| !q.is_empty()),
        incoming.query().filter(|q| !q.is_empty()),
    ) {
        (Some(t), Some(r)) => Some(format!("{}&{}", t, r)),
        (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
        (None, None) => None,
    };
    let path_and_query = match query {
        Some(q) => format!("{}?{}", path, q),
        None => path,
    };

    Uri::builder()
        .scheme(target.scheme())
        .authority(authority.as_str())
        .path_and_query(path_and_query.as_str())
        .build()
        .ok()
}

fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Add `client` to the `X-Forwarded-For` chain, keeping earlier hops.
fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    let chain = if prior.is_empty() {
        client.to_string()
    } else {
        format!("{}, {}", prior.join(", "), client)
    };
    // Prior values passed `to_str`, so the chain is always a valid header.
    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove("proxy-connection");
}
