use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::models::Device;

/// Fatal inventory-load failures. Raised before any device is contacted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("inventory file not found: {0}")]
    NotFound(PathBuf),

    #[error("inventory is empty: {0}")]
    Empty(PathBuf),

    #[error("failed to parse inventory: {0}")]
    Parse(String),

    #[error("inventory record {index} has an empty `{field}`")]
    InvalidRecord { index: usize, field: &'static str },

    #[error("duplicate host in inventory: {0}")]
    DuplicateHost(String),

    #[error("inventory I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The ordered list of managed devices, loaded fresh per invocation.
///
/// There is no partial-update path: callers mutate the in-memory copy and
/// call `save` once, which rewrites the whole file.
#[derive(Debug, Clone)]
pub struct Inventory {
    devices: Vec<Device>,
}

impl Inventory {
    /// Read and validate the whole inventory file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let devices: Vec<Device> =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if devices.is_empty() {
            return Err(ConfigError::Empty(path.to_path_buf()));
        }

        let mut seen = HashSet::new();
        for (index, device) in devices.iter().enumerate() {
            for (field, value) in [
                ("host", &device.host),
                ("device_type", &device.device_type),
                ("current_username", &device.current_username),
                ("current_password", &device.current_password),
            ] {
                if value.is_empty() {
                    return Err(ConfigError::InvalidRecord { index, field });
                }
            }
            if !seen.insert(device.host.clone()) {
                return Err(ConfigError::DuplicateHost(device.host.clone()));
            }
        }

        Ok(Self { devices })
    }

    /// Rewrite the whole inventory atomically (temp file + rename),
    /// preserving record order.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let rendered = serde_json::to_string_pretty(&self.devices)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, rendered.as_bytes())?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut [Device] {
        &mut self.devices
    }

    pub fn find(&self, host: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.host == host)
    }
}
