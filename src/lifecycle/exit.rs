//! Process exit status.
//!
//! A run that ends in error exits with status 1 after logging which
//! listener (if any) took the process down. A run whose listeners all
//! stopped cleanly exits with 0.

use crate::error::Result;

pub const SUCCESS: u8 = 0;
pub const FAILURE: u8 = 1;

/// Log how the run ended and return the process exit status.
pub fn report(outcome: &Result<()>) -> u8 {
    match outcome {
        Ok(()) => {
            tracing::info!("All listeners stopped");
            SUCCESS
        }
        Err(e) => {
            match e.listener_name() {
                Some(listener) => tracing::error!(listener, error = %e, "Listener failed, exiting"),
                None => tracing::error!(error = %e, "Startup failed, exiting"),
            }
            FAILURE
        }
    }
}
