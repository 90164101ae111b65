//! Fleet assembly
//!
//! `FleetConfig` is the root aggregate: every device on the bus, the monitor
//! and control groups over them, and the serial lines. It owns the
//! cross-entity invariants (unique unit addresses, unique port ids, group
//! roles, resolvable references) and the serialization lifecycle.
//!
//! A fleet starts in the building state. The first `serialize` call seals
//! it; further mutation fails with `FleetSealed` while repeated serialization
//! keeps producing byte-identical output. Identity and timestamp are injected
//! by the caller, so a given input always yields the same document.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

use crate::device::{DeviceConfig, ResolvedRegister};
use crate::document::FleetDocument;
use crate::error::{ConfigError, Result};
use crate::group::{Group, GroupKind, RegisterReference};
use crate::serial::SerialPortConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FleetState {
    #[default]
    Building,
    Serialized,
}

/// The complete configuration of one charger installation
#[derive(Debug, Clone)]
pub struct FleetConfig {
    config_id: Uuid,
    generated_at: DateTime<Utc>,
    devices: Vec<DeviceConfig>,
    monitor_groups: Vec<Group>,
    control_groups: Vec<Group>,
    serial_ports: Vec<SerialPortConfig>,
    state: FleetState,
}

impl FleetConfig {
    /// Create an empty fleet with injected identity and timestamp
    pub fn new(config_id: Uuid, generated_at: DateTime<Utc>) -> Self {
        Self {
            config_id,
            generated_at,
            devices: Vec::new(),
            monitor_groups: Vec::new(),
            control_groups: Vec::new(),
            serial_ports: Vec::new(),
            state: FleetState::Building,
        }
    }

    // ========== Assembly ==========

    /// Add a device, rejecting a unit address already on the bus
    pub fn add_device(&mut self, device: DeviceConfig) -> Result<()> {
        self.ensure_building()?;
        if self.device(device.device_address).is_some() {
            return Err(ConfigError::DuplicateDeviceAddress(device.device_address));
        }
        self.devices.push(device);
        Ok(())
    }

    /// Add a monitor group
    pub fn add_monitor_group(&mut self, group: Group) -> Result<()> {
        self.ensure_building()?;
        Self::ensure_kind(&group, GroupKind::Monitor)?;
        self.monitor_groups.push(group);
        Ok(())
    }

    /// Add a control group
    pub fn add_control_group(&mut self, group: Group) -> Result<()> {
        self.ensure_building()?;
        Self::ensure_kind(&group, GroupKind::Control)?;
        self.control_groups.push(group);
        Ok(())
    }

    /// Add a serial line, rejecting a reused port id
    pub fn add_serial_port(&mut self, port: SerialPortConfig) -> Result<()> {
        self.ensure_building()?;
        if self.serial_ports.iter().any(|existing| existing.id == port.id) {
            return Err(ConfigError::DuplicatePortId(port.id));
        }
        self.serial_ports.push(port);
        Ok(())
    }

    fn ensure_building(&self) -> Result<()> {
        if self.state == FleetState::Serialized {
            return Err(ConfigError::FleetSealed);
        }
        Ok(())
    }

    fn ensure_kind(group: &Group, expected: GroupKind) -> Result<()> {
        if group.kind != expected {
            return Err(ConfigError::GroupKindMismatch {
                group: group.name.clone(),
                expected,
                actual: group.kind,
            });
        }
        Ok(())
    }

    // ========== Lookup / resolution ==========

    /// Look up a device by unit address
    pub fn device(&self, device_address: u8) -> Option<&DeviceConfig> {
        self.devices
            .iter()
            .find(|device| device.device_address == device_address)
    }

    /// Resolve a group reference against the assembled fleet
    ///
    /// Resolution is by exact start address within the named bank; an
    /// address inside an F32 span does not resolve to the float.
    pub fn resolve(&self, reference: &RegisterReference) -> Result<ResolvedRegister<'_>> {
        let device = self
            .device(reference.device_address)
            .ok_or(ConfigError::UnknownDevice(reference.device_address))?;
        device
            .register(reference.kind, reference.register_address)
            .ok_or(ConfigError::UnknownRegister {
                kind: reference.kind,
                device_address: reference.device_address,
                register_address: reference.register_address,
            })
    }

    // ========== Traversal ==========

    pub fn devices(&self) -> &[DeviceConfig] {
        &self.devices
    }

    pub fn monitor_groups(&self) -> &[Group] {
        &self.monitor_groups
    }

    pub fn control_groups(&self) -> &[Group] {
        &self.control_groups
    }

    pub fn serial_ports(&self) -> &[SerialPortConfig] {
        &self.serial_ports
    }

    pub fn config_id(&self) -> Uuid {
        self.config_id
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Check whether the fleet has been sealed by serialization
    pub fn is_sealed(&self) -> bool {
        self.state == FleetState::Serialized
    }

    /// Total reference count across every group
    pub fn reference_count(&self) -> usize {
        self.monitor_groups
            .iter()
            .chain(self.control_groups.iter())
            .map(Group::len)
            .sum()
    }

    // ========== Validation ==========

    /// Check every invariant of the assembled fleet
    ///
    /// Covers device schemas, unit-address and port-id uniqueness, group
    /// roles, transport parameters and the resolvability of every group
    /// reference. Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut seen_addresses = BTreeSet::new();
        for device in &self.devices {
            device.validate()?;
            if !seen_addresses.insert(device.device_address) {
                return Err(ConfigError::DuplicateDeviceAddress(device.device_address));
            }
        }

        let mut seen_ports = BTreeSet::new();
        for port in &self.serial_ports {
            port.validate()?;
            if !seen_ports.insert(port.id) {
                return Err(ConfigError::DuplicatePortId(port.id));
            }
        }

        for group in &self.monitor_groups {
            Self::ensure_kind(group, GroupKind::Monitor)?;
        }
        for group in &self.control_groups {
            Self::ensure_kind(group, GroupKind::Control)?;
        }
        for group in self.monitor_groups.iter().chain(self.control_groups.iter()) {
            for reference in &group.references {
                self.resolve(reference)?;
            }
        }

        debug!(
            devices = self.devices.len(),
            groups = self.monitor_groups.len() + self.control_groups.len(),
            references = self.reference_count(),
            "fleet validated"
        );
        Ok(())
    }

    // ========== Serialization lifecycle ==========

    /// Produce the wire document and seal the fleet
    ///
    /// The first call flips the fleet out of the building state. Calling
    /// again is allowed and yields an identical document; mutating
    /// operations after the first call fail with `FleetSealed`.
    pub fn serialize(&mut self) -> Result<FleetDocument> {
        let document = FleetDocument {
            config_id: self.config_id,
            generated_at: self.generated_at,
            devices: self.devices.clone(),
            monitor_groups: self.monitor_groups.clone(),
            control_groups: self.control_groups.clone(),
            serial_ports: self.serial_ports.clone(),
        };
        if self.state == FleetState::Building {
            debug!(config_id = %self.config_id, "fleet sealed by serialization");
            self.state = FleetState::Serialized;
        }
        Ok(document)
    }

    /// Serialize to a compact JSON string
    pub fn to_json(&mut self) -> Result<String> {
        let document = self.serialize()?;
        Ok(serde_json::to_string(&document)?)
    }

    /// Serialize to a pretty-printed JSON string
    pub fn to_json_pretty(&mut self) -> Result<String> {
        let document = self.serialize()?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Rebuild a fleet from a parsed document
    ///
    /// Group roles are reassigned from the list each group arrived in. The
    /// rebuilt fleet is validated and comes back already sealed; it is a
    /// faithful read-only view of an emitted artifact, not a resumed
    /// authoring session.
    pub fn from_document(document: FleetDocument) -> Result<Self> {
        let FleetDocument {
            config_id,
            generated_at,
            devices,
            mut monitor_groups,
            mut control_groups,
            serial_ports,
        } = document;

        for group in &mut monitor_groups {
            group.kind = GroupKind::Monitor;
        }
        for group in &mut control_groups {
            group.kind = GroupKind::Control;
        }

        let fleet = Self {
            config_id,
            generated_at,
            devices,
            monitor_groups,
            control_groups,
            serial_ports,
            state: FleetState::Serialized,
        };
        fleet.validate()?;
        Ok(fleet)
    }
}
