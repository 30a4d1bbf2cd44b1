//! Message queues for clients that poll instead of holding a connection.
//!
//! Both the number of queued messages per connection and the number of open
//! connections per device are bounded. Connections die with their device.

use std::collections::VecDeque;

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::operator::OperatorError;

/// Messages a connection may hold before pushes are refused.
pub const DEFAULT_MAX_PENDING_MESSAGES: usize = 256;
/// Connections one device may have open at once.
pub const DEFAULT_MAX_CONNECTIONS_PER_DEVICE: usize = 32;

#[derive(Debug)]
struct PolledConnection {
    device_id: String,
    messages: VecDeque<serde_json::Value>,
}

/// Summary of one polled connection.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PolledSummary {
    pub connection_id: String,
    pub device_id: String,
    pub pending: usize,
}

/// Open polled connections keyed by connection id.
#[derive(Debug)]
pub struct PolledSet {
    connections: DashMap<String, PolledConnection>,
    max_pending: usize,
    max_per_device: usize,
}

impl Default for PolledSet {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_PENDING_MESSAGES, DEFAULT_MAX_CONNECTIONS_PER_DEVICE)
    }
}

impl PolledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_pending: usize, max_per_device: usize) -> Self {
        Self {
            connections: DashMap::new(),
            max_pending,
            max_per_device,
        }
    }

    /// Open a connection to `device_id` and return its id.
    pub fn open(&self, device_id: &str) -> Result<String, OperatorError> {
        let open_for_device = self
            .connections
            .iter()
            .filter(|entry| entry.device_id == device_id)
            .count();
        if open_for_device >= self.max_per_device {
            return Err(OperatorError::TooManyConnections(device_id.to_string()));
        }

        let connection_id = Uuid::new_v4().to_string();
        self.connections.insert(
            connection_id.clone(),
            PolledConnection {
                device_id: device_id.to_string(),
                messages: VecDeque::new(),
            },
        );
        tracing::debug!(connection_id = %connection_id, device_id = %device_id, "Polled connection opened");
        Ok(connection_id)
    }

    pub fn list(&self) -> Vec<PolledSummary> {
        let mut summaries: Vec<PolledSummary> = self
            .connections
            .iter()
            .map(|entry| PolledSummary {
                connection_id: entry.key().clone(),
                device_id: entry.device_id.clone(),
                pending: entry.messages.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.connection_id.cmp(&b.connection_id));
        summaries
    }

    /// Queue a message for the connection. Refused once the queue is full.
    pub fn push(&self, connection_id: &str, message: serde_json::Value) -> Result<(), OperatorError> {
        let mut connection = self
            .connections
            .get_mut(connection_id)
            .ok_or_else(|| OperatorError::ConnectionNotFound(connection_id.to_string()))?;
        if connection.messages.len() >= self.max_pending {
            return Err(OperatorError::QueueFull(connection_id.to_string()));
        }
        connection.messages.push_back(message);
        Ok(())
    }

    /// Take every queued message, oldest first.
    pub fn drain(&self, connection_id: &str) -> Result<Vec<serde_json::Value>, OperatorError> {
        let mut connection = self
            .connections
            .get_mut(connection_id)
            .ok_or_else(|| OperatorError::ConnectionNotFound(connection_id.to_string()))?;
        Ok(connection.messages.drain(..).collect())
    }

    pub fn close(&self, connection_id: &str) -> bool {
        self.connections.remove(connection_id).is_some()
    }

    /// Close every connection to `device_id`, returning how many were open.
    pub fn close_device(&self, device_id: &str) -> usize {
        let before = self.connections.len();
        self.connections.retain(|_, connection| connection.device_id != device_id);
        before.saturating_sub(self.connections.len())
    }
}
