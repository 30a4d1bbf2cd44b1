//! Device file interception.
//!
//! A fixed table of device-served paths that are replaced by assets shipped
//! with the orchestrator. Only exact path matches are redirected.

use crate::config::schema::INTERCEPT_DIR;

/// Maps a device file request path to an optional replacement path.
pub type InterceptRule = fn(&str) -> Option<String>;

const INTERCEPTED_PATHS: &[&str] = &["/js/server_connector.js"];

/// Whether a device file request should be served from the intercept
/// directory instead of the device's own files.
pub fn maybe_intercept(path: &str) -> Option<String> {
    INTERCEPTED_PATHS
        .iter()
        .find(|candidate| **candidate == path)
        .map(|candidate| format!("{}{}", INTERCEPT_DIR, candidate))
}
