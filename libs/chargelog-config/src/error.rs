//! Configuration Model Error Types

use thiserror::Error;

use crate::register::RegisterKind;

/// Result type for chargelog-config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration authoring errors
///
/// Every variant is a synchronous, local authoring mistake raised at the
/// offending `add_*` or `serialize()` call. Nothing here is retryable; the
/// generation driver aborts the whole run on the first error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Two registers of the same bank on one device claim overlapping
    /// address spans
    #[error("duplicate {kind} address: register at {address} overlaps existing register at {conflict}")]
    DuplicateAddress {
        kind: RegisterKind,
        address: u16,
        conflict: u16,
    },

    /// A multi-register span runs past the 16-bit address space
    #[error("{kind} register at {address} with width {width} exceeds the 16-bit address space")]
    AddressOverflow {
        kind: RegisterKind,
        address: u16,
        width: u16,
    },

    /// Device address outside the Modbus unit range 1..=247
    #[error("invalid device address: {0} (must be 1..=247)")]
    InvalidDeviceAddress(u8),

    /// Two devices in one fleet share a device address
    #[error("duplicate device address: {0}")]
    DuplicateDeviceAddress(u8),

    /// Two serial ports registered under one identifier
    #[error("duplicate serial port id: {0}")]
    DuplicatePortId(uuid::Uuid),

    /// A group was appended to the list of the other kind
    #[error("group '{group}' has kind {actual}, expected {expected}")]
    GroupKindMismatch {
        group: String,
        expected: crate::group::GroupKind,
        actual: crate::group::GroupKind,
    },

    /// A group reference names a device absent from the fleet
    #[error("unknown device address: {0}")]
    UnknownDevice(u8),

    /// A group reference names a register absent from the referenced device
    #[error("unknown {kind} register {register_address} on device {device_address}")]
    UnknownRegister {
        kind: RegisterKind,
        device_address: u8,
        register_address: u16,
    },

    /// Structural mutation attempted after the fleet was serialized
    #[error("fleet configuration is sealed after serialization")]
    FleetSealed,

    /// Field-level validation error
    #[error("validation error: {0}")]
    Validation(String),

    /// The document cannot be produced or parsed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serialization(err.to_string())
    }
}

// Helper methods
impl ConfigError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ConfigError::Validation(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        ConfigError::Serialization(msg.into())
    }
}
