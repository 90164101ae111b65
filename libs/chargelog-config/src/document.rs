//! Wire document
//!
//! The JSON artifact consumed by the runtime logger. Field declaration
//! order here is the emitted key order; together with address-ordered
//! banks and insertion-ordered lists it makes serialization fully
//! deterministic, so regenerating an unchanged fleet produces an
//! unchanged file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::DeviceConfig;
use crate::error::Result;
use crate::group::Group;
use crate::serial::SerialPortConfig;

/// Top-level configuration artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetDocument {
    /// Identity of this emitted configuration
    pub config_id: Uuid,
    /// Injected generation timestamp, RFC 3339 UTC
    pub generated_at: DateTime<Utc>,
    pub devices: Vec<DeviceConfig>,
    pub monitor_groups: Vec<Group>,
    pub control_groups: Vec<Group>,
    pub serial_ports: Vec<SerialPortConfig>,
}

impl FleetDocument {
    /// Parse a document from JSON text
    ///
    /// Structural validation only; cross-entity invariants are checked when
    /// the document is turned back into a fleet.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as compact JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
