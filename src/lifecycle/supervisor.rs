//! Fail-fast listener supervision.
//!
//! # Responsibilities
//! - Run every listener concurrently
//! - Surface the first failure (error or panic) and stop the rest
//!
//! # Design Decisions
//! - A panicking listener is reported like a failed one, with its name
//! - Listeners that finish cleanly do not stop the others
//! - No restarts; recovery is the process supervisor's job

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use futures_util::FutureExt;
use tokio::task::JoinSet;

use crate::error::{OrchestratorError, Result};

type StartFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A named listener task, not yet started.
pub struct ServerStarter {
    name: &'static str,
    start: StartFuture,
}

impl ServerStarter {
    pub fn new<F>(name: &'static str, start: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name,
            start: Box::pin(start),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for ServerStarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerStarter").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Runs listeners until one of them fails.
#[derive(Debug, Default)]
pub struct Supervisor {
    starters: Vec<ServerStarter>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, starter: ServerStarter) -> &mut Self {
        self.starters.push(starter);
        self
    }

    /// Start every listener and wait.
    ///
    /// Returns the first error; remaining listeners are aborted. Returns
    /// `Ok` only once every listener has returned `Ok`.
    pub async fn run(self) -> Result<()> {
        let mut tasks = JoinSet::new();
        for ServerStarter { name, start } in self.starters {
            tracing::debug!(listener = name, "Starting listener");
            tasks.spawn(async move {
                let outcome = match AssertUnwindSafe(start).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => Err(OrchestratorError::ListenerPanicked {
                        listener: name,
                        message: panic_message(panic.as_ref()),
                    }),
                };
                (name, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (name, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tasks.abort_all();
                    return Err(OrchestratorError::ListenerPanicked {
                        listener: "unknown",
                        message: e.to_string(),
                    });
                }
            };
            match outcome {
                Ok(()) => tracing::info!(listener = name, "Listener stopped"),
                Err(e) => {
                    tracing::error!(listener = name, error = %e, "Listener failed");
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
