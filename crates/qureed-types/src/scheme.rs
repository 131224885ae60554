//! Persisted experiment schemes.
//!
//! A scheme is the JSON description of a board: the devices placed on it and
//! the signals wiring their ports together. Device and signal identifiers are
//! class paths resolved through a registry at load time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::SimulationSettings;

/// A complete scheme file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    /// Placed devices
    #[serde(default)]
    pub devices: Vec<SchemeDevice>,

    /// Wires between device ports
    #[serde(default)]
    pub connections: Vec<SchemeConnection>,

    /// Optional simulation settings stored with the scheme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SimulationSettings>,
}

/// One device placed on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeDevice {
    /// Registry key of the device class
    pub device: String,

    /// Board position; carried through for editors, unused by the simulation
    #[serde(default)]
    pub location: Option<(f64, f64)>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Device uuid, referenced by connections
    pub uuid: String,

    /// Device parameters (e.g. `{"value": 3}` for variables)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<String, Value>>,
}

/// One wire connecting two ports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeConnection {
    /// Registry key of the signal class carried by the wire
    pub signal: String,

    /// The two endpoints
    pub conn: [SchemeEndpoint; 2],
}

/// A device port referenced by uuid and label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeEndpoint {
    pub device_uuid: String,
    pub port: String,
}

impl SchemeEndpoint {
    pub fn new(device_uuid: &str, port: &str) -> Self {
        Self {
            device_uuid: device_uuid.to_string(),
            port: port.to_string(),
        }
    }
}

impl Scheme {
    /// Create an empty scheme
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device entry
    pub fn add_device(&mut self, device: &str, uuid: &str, name: Option<&str>) -> &mut SchemeDevice {
        self.devices.push(SchemeDevice {
            device: device.to_string(),
            location: None,
            name: name.map(str::to_string),
            uuid: uuid.to_string(),
            values: None,
        });
        let last = self.devices.len() - 1;
        &mut self.devices[last]
    }

    /// Add a connection entry
    pub fn add_connection(&mut self, signal: &str, from: SchemeEndpoint, to: SchemeEndpoint) {
        self.connections.push(SchemeConnection {
            signal: signal.to_string(),
            conn: [from, to],
        });
    }

    /// Look up a device entry by uuid
    pub fn get_device(&self, uuid: &str) -> Option<&SchemeDevice> {
        self.devices.iter().find(|d| d.uuid == uuid)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl SchemeDevice {
    /// Attach a parameter value
    pub fn with_value(&mut self, key: &str, value: Value) -> &mut Self {
        self.values
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value);
        self
    }
}
