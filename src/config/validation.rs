//! Pre-flight configuration validation.
//!
//! Catches mistakes that would otherwise surface only as a bind-time failure
//! or a broken fallback. TLS material is not checked here; the
//! HTTPS listener reports missing or unreadable files when it starts.

use url::Url;

use crate::config::schema::OrchestratorConfig;

/// A single semantic problem with the resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// HTTP and HTTPS listeners would bind the same port.
    PortClash(String),
    /// Web UI URL is not an absolute `http` or `https` URL with a host.
    InvalidWebUiUrl(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::PortClash(port) => {
                write!(f, "HTTP and HTTPS both configured on port {}", port)
            }
            ValidationError::InvalidWebUiUrl(url) => {
                write!(f, "web UI URL {:?} is not a valid http or https URL", url)
            }
        }
    }
}

/// Validate the resolved configuration, returning every problem found.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.https_port.as_deref() == Some(config.http_port.as_str()) {
        errors.push(ValidationError::PortClash(config.http_port.clone()));
    }

    if let Some(raw) = &config.web_ui_url {
        let usable = Url::parse(raw).is_ok_and(|url| {
            matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
        });
        if !usable {
            errors.push(ValidationError::InvalidWebUiUrl(raw.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
