//! Long-running operation tracking.
//!
//! The HTTP surface only reads operations (`get`, `list`, `result`, `wait`).
//! `create` and `complete` belong to the device-management handlers that
//! start and finish long-running work (creating or removing devices,
//! fetching builds). Those handlers live outside this crate and receive the
//! shared `MapOperationManager` through `Subsystems`; in-tree callers of the
//! write side are tests.
//!
//! # States
//! ```text
//! Pending → Done(result)
//! ```
//!
//! # Design Decisions
//! - Each operation owns a `watch` channel so waiters wake on completion
//! - Completing an operation twice is an error, never an overwrite
//! - Waiting is bounded by the caller; the manager never retries

use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

/// Errors from operation bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("Operation {0} not found")]
    NotFound(String),

    #[error("Operation {0} is already done")]
    AlreadyDone(String),

    #[error("Operation {0} is not done yet")]
    NotDone(String),

    #[error("Timed out waiting for operation {0}")]
    WaitTimeout(String),
}

/// Public view of an operation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub done: bool,
}

/// Outcome of a finished operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Value(serde_json::Value),
    Error { message: String },
}

/// Operation manager backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MapOperationManager {
    operations: DashMap<String, watch::Sender<Option<OperationResult>>>,
}

impl MapOperationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new pending operation.
    pub fn create(&self) -> Operation {
        let name = Uuid::new_v4().to_string();
        let (tx, _) = watch::channel(None);
        self.operations.insert(name.clone(), tx);
        tracing::debug!(operation = %name, "Operation created");
        Operation { name, done: false }
    }

    pub fn get(&self, name: &str) -> Result<Operation, OperationError> {
        let tx = self
            .operations
            .get(name)
            .ok_or_else(|| OperationError::NotFound(name.to_string()))?;
        let done = tx.borrow().is_some();
        Ok(Operation {
            name: name.to_string(),
            done,
        })
    }

    /// All operations, sorted by name.
    pub fn list(&self) -> Vec<Operation> {
        let mut ops: Vec<Operation> = self
            .operations
            .iter()
            .map(|entry| Operation {
                name: entry.key().clone(),
                done: entry.value().borrow().is_some(),
            })
            .collect();
        ops.sort_by(|a, b| a.name.cmp(&b.name));
        ops
    }

    /// Record the outcome and wake every waiter.
    pub fn complete(&self, name: &str, result: OperationResult) -> Result<(), OperationError> {
        let tx = self
            .operations
            .get(name)
            .ok_or_else(|| OperationError::NotFound(name.to_string()))?;
        let stored = tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(result);
            true
        });
        if !stored {
            return Err(OperationError::AlreadyDone(name.to_string()));
        }
        tracing::debug!(operation = %name, "Operation completed");
        Ok(())
    }

    pub fn result(&self, name: &str) -> Result<OperationResult, OperationError> {
        let tx = self
            .operations
            .get(name)
            .ok_or_else(|| OperationError::NotFound(name.to_string()))?;
        let result = tx.borrow().clone();
        result.ok_or_else(|| OperationError::NotDone(name.to_string()))
    }

    /// Wait up to `bound` for the operation to finish.
    pub async fn wait(&self, name: &str, bound: Duration) -> Result<OperationResult, OperationError> {
        let mut rx = match self.operations.get(name) {
            Some(tx) => tx.subscribe(),
            None => return Err(OperationError::NotFound(name.to_string())),
        };

        let outcome = match tokio::time::timeout(bound, rx.wait_for(Option::is_some)).await {
            Ok(Ok(result)) => result
                .clone()
                .ok_or_else(|| OperationError::NotDone(name.to_string())),
            Ok(Err(_)) => Err(OperationError::NotFound(name.to_string())),
            Err(_) => Err(OperationError::WaitTimeout(name.to_string())),
        };
        outcome
    }
}
