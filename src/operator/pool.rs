//! Registry of live devices.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;

use crate::operator::OperatorError;

/// A registered device.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Device {
    pub id: String,
    /// Directory the device serves its client files from. Always derived
    /// from the runtimes root, never supplied by clients.
    #[serde(skip)]
    pub files_dir: PathBuf,
    /// Opaque device description supplied at registration.
    pub info: serde_json::Value,
}

/// Devices currently registered with the orchestrator.
#[derive(Debug, Default)]
pub struct DevicePool {
    devices: DashMap<String, Arc<Device>>,
}

impl DevicePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device. Ids are unique for as long as the device is registered.
    pub fn register(&self, device: Device) -> Result<Arc<Device>, OperatorError> {
        validate_device_id(&device.id)?;
        match self.devices.entry(device.id.clone()) {
            Entry::Occupied(_) => Err(OperatorError::AlreadyRegistered(device.id)),
            Entry::Vacant(slot) => {
                let device = Arc::new(device);
                slot.insert(Arc::clone(&device));
                tracing::info!(device_id = %device.id, "Device registered");
                Ok(device)
            }
        }
    }

    pub fn unregister(&self, id: &str) -> Result<Arc<Device>, OperatorError> {
        let (_, device) = self
            .devices
            .remove(id)
            .ok_or_else(|| OperatorError::DeviceNotFound(id.to_string()))?;
        tracing::info!(device_id = %id, "Device unregistered");
        Ok(device)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Device>> {
        self.devices.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Registered device ids, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Device ids double as directory names under the runtimes root.
pub fn validate_device_id(id: &str) -> Result<(), OperatorError> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(OperatorError::InvalidDeviceId(id.to_string()))
    }
}
