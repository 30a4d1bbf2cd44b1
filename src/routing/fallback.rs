//! Catch-all handler selection.
//!
//! The choice between proxying to the web UI and serving local static files
//! is made once, when the router is composed.

use std::path::PathBuf;

use axum::{handler::Handler, Router};
use tower_http::services::ServeDir;

use crate::config::OrchestratorConfig;
use crate::error::Result;
use crate::http::proxy::{forward, ReverseProxy};

/// Handler for every request no registered route matches.
#[derive(Debug, Clone)]
pub enum Fallback {
    /// Forward to the configured web UI origin.
    Proxy(ReverseProxy),
    /// Serve files from a local directory.
    Static(PathBuf),
}

impl Fallback {
    /// Proxy when a web UI URL is configured, static files otherwise.
    pub fn select(config: &OrchestratorConfig) -> Result<Self> {
        match &config.web_ui_url {
            Some(url) => Ok(Fallback::Proxy(ReverseProxy::new(url)?)),
            None => Ok(Fallback::Static(config.static_files_dir())),
        }
    }

    /// Install this fallback on `router`.
    pub fn attach(self, router: Router) -> Router {
        match self {
            Fallback::Proxy(proxy) => router.fallback_service(forward.with_state(proxy)),
            Fallback::Static(dir) => router.fallback_service(ServeDir::new(dir)),
        }
    }
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::Proxy(proxy) => write!(f, "proxy to {}", proxy.target()),
            Fallback::Static(dir) => write!(f, "static files from {}", dir.display()),
        }
    }
}
