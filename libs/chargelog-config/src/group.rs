//! Register groups
//!
//! A group names an ordered set of registers, possibly spanning several
//! devices, that the runtime treats as one unit: monitor groups are polled
//! together, control groups are presented together as a write panel.
//!
//! Groups never hold the registers themselves. Each entry is a late-bound
//! reference (bank, device address, register address), resolved against the
//! fleet at validation time so a group can be authored before, or
//! independently of, the devices it points at.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::register::RegisterKind;

/// Group role discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Polled periodically by the runtime logger
    #[default]
    Monitor,
    /// Written on demand from an operator panel
    Control,
}

impl GroupKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Control => "control",
        }
    }
}

impl FromStr for GroupKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monitor" => Ok(Self::Monitor),
            "control" => Ok(Self::Control),
            _ => Err(format!("Unknown group kind: {}", s)),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Late-bound reference to one register of one device
///
/// Carries coordinates only, never a pointer into a device's register map.
/// Resolution happens against the assembled fleet, so a dangling reference
/// surfaces as a validation error instead of an authoring-time crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisterReference {
    /// Bank the register lives in
    #[serde(rename = "register_type")]
    pub kind: RegisterKind,
    /// Unit address of the owning device
    pub device_address: u8,
    /// Bank-local start address of the register
    pub register_address: u16,
}

impl RegisterReference {
    pub fn new(kind: RegisterKind, device_address: u8, register_address: u16) -> Self {
        Self {
            kind,
            device_address,
            register_address,
        }
    }
}

impl fmt::Display for RegisterReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}",
            self.kind, self.device_address, self.register_address
        )
    }
}

/// An ordered, possibly cross-device register collection
///
/// The role (`kind`) is carried in memory only; on the wire it is implied by
/// which document list the group appears in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Human-readable group name shown in the runtime UI
    pub name: String,
    #[serde(skip)]
    pub kind: GroupKind,
    /// Member references in authoring order; duplicates are permitted
    pub references: Vec<RegisterReference>,
}

impl Group {
    pub fn new(name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            name: name.into(),
            kind,
            references: Vec::new(),
        }
    }

    /// Create an empty monitor group
    pub fn monitor(name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Monitor)
    }

    /// Create an empty control group
    pub fn control(name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Control)
    }

    /// Append a reference by coordinates
    pub fn add_register_reference(
        &mut self,
        kind: RegisterKind,
        device_address: u8,
        register_address: u16,
    ) {
        self.references
            .push(RegisterReference::new(kind, device_address, register_address));
    }

    /// Append a pre-built reference
    pub fn add_reference(&mut self, reference: RegisterReference) {
        self.references.push(reference);
    }

    /// Number of member references
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Check whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_group_kind_strings() {
        assert_eq!(GroupKind::Monitor.as_str(), "monitor");
        assert_eq!(GroupKind::from_str("Control").unwrap(), GroupKind::Control);
        assert!(GroupKind::from_str("audit").is_err());
    }

    #[test]
    fn test_group_preserves_insertion_order() {
        let mut group = Group::monitor("Battery Tester 3");
        for address in [5u16, 7, 9, 11] {
            group.add_register_reference(RegisterKind::HoldingRegister, 3, address);
        }

        assert_eq!(group.len(), 4);
        let addresses: Vec<u16> = group.references.iter().map(|r| r.register_address).collect();
        assert_eq!(addresses, vec![5, 7, 9, 11]);
        assert!(group.references.iter().all(|r| r.device_address == 3));
    }

    #[test]
    fn test_group_allows_duplicate_references() {
        let mut group = Group::control("Control Battery Charging Parameters");
        group.add_register_reference(RegisterKind::HoldingRegister, 1, 50);
        group.add_register_reference(RegisterKind::HoldingRegister, 1, 50);
        assert_eq!(group.len(), 2);
        assert_eq!(group.references[0], group.references[1]);
    }

    #[test]
    fn test_group_serde_omits_kind() {
        let mut group = Group::monitor("Battery Tester 1");
        group.add_register_reference(RegisterKind::Coil, 1, 0);

        let json = serde_json::to_value(&group).unwrap();
        assert!(json.get("kind").is_none());
        assert_eq!(json["name"], "Battery Tester 1");
        assert_eq!(json["references"][0]["register_type"], "coil");
        assert_eq!(json["references"][0]["device_address"], 1);
        assert_eq!(json["references"][0]["register_address"], 0);
    }

    #[test]
    fn test_group_deserialization_defaults_kind() {
        let json = r#"{
            "name": "Battery Tester 1",
            "references": []
        }"#;
        let group: Group = serde_json::from_str(json).unwrap();
        // The document layer reassigns the role from the list the group came from
        assert_eq!(group.kind, GroupKind::Monitor);
        assert!(group.is_empty());
    }

    #[test]
    fn test_reference_display() {
        let reference = RegisterReference::new(RegisterKind::HoldingRegister, 7, 50);
        assert_eq!(reference.to_string(), "holding_register@7:50");
    }
}
