//! Register-map primitives
//!
//! The atomic addressable units of a Modbus device schema: word registers
//! (holding / input banks), bit registers (coil / discrete-input banks) and
//! the logging metadata attached to historized channels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Modbus register bank discriminator
///
/// Used by group references to name which of a device's four address spaces
/// a register lives in. Coils and discrete inputs are bit-addressed; holding
/// and input registers are 16-bit word-addressed. Each bank is a separate
/// address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    /// Read/write 16-bit word register (function codes 3/6/16)
    HoldingRegister,
    /// Read-only 16-bit word register (function code 4)
    InputRegister,
    /// Read/write single-bit register (function codes 1/5/15)
    Coil,
    /// Read-only single-bit register (function code 2)
    DiscreteInput,
}

impl RegisterKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HoldingRegister => "holding_register",
            Self::InputRegister => "input_register",
            Self::Coil => "coil",
            Self::DiscreteInput => "discrete_input",
        }
    }

    /// Check if this is a bit-addressed bank (coil / discrete input)
    pub fn is_bit(&self) -> bool {
        matches!(self, Self::Coil | Self::DiscreteInput)
    }

    /// Check if this is a word-addressed bank (holding / input register)
    pub fn is_word(&self) -> bool {
        matches!(self, Self::HoldingRegister | Self::InputRegister)
    }
}

impl FromStr for RegisterKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "holding_register" | "holding" => Ok(Self::HoldingRegister),
            "input_register" | "input" => Ok(Self::InputRegister),
            "coil" => Ok(Self::Coil),
            "discrete_input" | "discrete" => Ok(Self::DiscreteInput),
            _ => Err(format!("Unknown register kind: {}", s)),
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Register value encoding
///
/// Determines how many consecutive registers of the bank one logical value
/// occupies. Word order of the F32 halves is left to the runtime consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterDataType {
    /// Native-width unsigned integer, one register
    #[default]
    U16,
    /// IEEE-754 float spanning two consecutive holding registers
    F32,
}

impl RegisterDataType {
    /// Width in register-type units
    pub fn width(&self) -> u16 {
        match self {
            Self::U16 => 1,
            Self::F32 => 2,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::U16 => "u16",
            Self::F32 => "f32",
        }
    }
}

impl fmt::Display for RegisterDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Historization metadata attached 1:1 to a register
///
/// Purely descriptive; the runtime logger sizes its sample buffer from
/// `history_buffer_length` (large for continuously sampled channels, 1 for
/// write-once calibration values) and renders values with `display_format`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingParameter {
    /// Channel name shown in the logger UI
    pub name: String,
    /// Engineering unit, may be empty
    pub unit: String,
    /// Capacity of retained historical samples, at least 1
    pub history_buffer_length: u32,
    /// printf-style numeric display hint, e.g. "%.1f"
    pub display_format: String,
}

impl LoggingParameter {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        history_buffer_length: u32,
        display_format: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            history_buffer_length,
            display_format: display_format.into(),
        }
    }

    /// Validate logging parameter fields
    pub fn validate(&self) -> Result<()> {
        if self.history_buffer_length == 0 {
            return Err(ConfigError::validation(format!(
                "logging parameter '{}': history buffer length must be >= 1",
                self.name
            )));
        }
        Ok(())
    }
}

/// Common addressing view over any register record
pub trait RegisterSlot {
    /// First address occupied
    fn address(&self) -> u16;

    /// Width in register-type units (1, or 2 for F32 word registers)
    fn width(&self) -> u16;

    /// Last address occupied, or `None` if the span leaves the 16-bit space
    fn end_address(&self) -> Option<u16> {
        self.address().checked_add(self.width() - 1)
    }
}

/// A 16-bit word register of the holding or input bank
///
/// An F32 register occupies `address` and `address + 1`; no other register
/// of the same bank may start inside that span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRegister {
    /// Bank-local start address
    pub address: u16,
    /// Initial/default value, interpreted per `data_type` by the runtime
    pub value: f64,
    /// Short display label, may be empty
    #[serde(default)]
    pub label: String,
    /// Free-form description, may be empty
    #[serde(default)]
    pub description: String,
    /// Value encoding; determines the occupied width
    #[serde(rename = "datatype", default)]
    pub data_type: RegisterDataType,
    /// Historization metadata; absent means the register is not logged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_parameters: Option<LoggingParameter>,
}

impl HoldingRegister {
    pub fn new(
        address: u16,
        value: f64,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            address,
            value,
            label: label.into(),
            description: description.into(),
            data_type: RegisterDataType::U16,
            logging_parameters: None,
        }
    }

    /// Set the value encoding
    pub fn with_data_type(mut self, data_type: RegisterDataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Attach historization metadata
    pub fn with_logging_parameters(mut self, logging_parameters: LoggingParameter) -> Self {
        self.logging_parameters = Some(logging_parameters);
        self
    }

    /// Check whether the register carries logging metadata
    pub fn has_logging(&self) -> bool {
        self.logging_parameters.is_some()
    }

    /// Validate register fields (delegates to the attached logging metadata)
    pub fn validate(&self) -> Result<()> {
        if let Some(logging) = &self.logging_parameters {
            logging.validate()?;
        }
        Ok(())
    }
}

impl RegisterSlot for HoldingRegister {
    fn address(&self) -> u16 {
        self.address
    }

    fn width(&self) -> u16 {
        self.data_type.width()
    }
}

/// A single-bit register of the coil or discrete-input bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coil {
    /// Bank-local address
    pub address: u16,
    /// Initial/default state
    pub value: bool,
    /// Short display label, may be empty
    #[serde(default)]
    pub label: String,
    /// Free-form description, may be empty
    #[serde(default)]
    pub description: String,
}

impl Coil {
    pub fn new(
        address: u16,
        value: bool,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            address,
            value,
            label: label.into(),
            description: description.into(),
        }
    }
}

impl RegisterSlot for Coil {
    fn address(&self) -> u16 {
        self.address
    }

    fn width(&self) -> u16 {
        1
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    // ========== RegisterKind tests ==========

    #[test]
    fn test_register_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&RegisterKind::HoldingRegister).unwrap(),
            "\"holding_register\""
        );
        assert_eq!(
            serde_json::to_string(&RegisterKind::Coil).unwrap(),
            "\"coil\""
        );

        let kind: RegisterKind = serde_json::from_str("\"discrete_input\"").unwrap();
        assert_eq!(kind, RegisterKind::DiscreteInput);
    }

    #[test]
    fn test_register_kind_from_str() {
        assert_eq!(
            RegisterKind::from_str("holding_register").unwrap(),
            RegisterKind::HoldingRegister
        );
        assert_eq!(
            RegisterKind::from_str("holding").unwrap(),
            RegisterKind::HoldingRegister
        );
        assert_eq!(RegisterKind::from_str("COIL").unwrap(), RegisterKind::Coil);
        assert!(RegisterKind::from_str("flux_capacitor").is_err());
    }

    #[test]
    fn test_register_kind_predicates() {
        assert!(RegisterKind::HoldingRegister.is_word());
        assert!(RegisterKind::InputRegister.is_word());
        assert!(RegisterKind::Coil.is_bit());
        assert!(RegisterKind::DiscreteInput.is_bit());
        assert!(!RegisterKind::Coil.is_word());
    }

    // ========== RegisterDataType tests ==========

    #[test]
    fn test_data_type_widths() {
        assert_eq!(RegisterDataType::U16.width(), 1);
        assert_eq!(RegisterDataType::F32.width(), 2);
        assert_eq!(RegisterDataType::default(), RegisterDataType::U16);
    }

    #[test]
    fn test_data_type_serialization() {
        assert_eq!(
            serde_json::to_string(&RegisterDataType::F32).unwrap(),
            "\"f32\""
        );
        let dt: RegisterDataType = serde_json::from_str("\"u16\"").unwrap();
        assert_eq!(dt, RegisterDataType::U16);
    }

    // ========== LoggingParameter tests ==========

    #[test]
    fn test_logging_parameter_validate_rejects_zero_buffer() {
        let param = LoggingParameter::new("Battery Voltage", "V", 0, "%.1f");
        assert!(param.validate().is_err());

        let param = LoggingParameter::new("Battery Voltage", "V", 1, "%.1f");
        assert!(param.validate().is_ok());
    }

    // ========== HoldingRegister tests ==========

    #[test]
    fn test_holding_register_defaults() {
        let reg = HoldingRegister::new(5, 0.0, "AIN0", "calibrated analog input 0");
        assert_eq!(reg.data_type, RegisterDataType::U16);
        assert_eq!(reg.width(), 1);
        assert!(!reg.has_logging());
        assert_eq!(reg.end_address(), Some(5));
    }

    #[test]
    fn test_f32_register_spans_two_addresses() {
        let reg = HoldingRegister::new(5, 0.0, "AIN0", "")
            .with_data_type(RegisterDataType::F32)
            .with_logging_parameters(LoggingParameter::new("Battery Voltage", "", 7200, "%.1f"));
        assert_eq!(reg.width(), 2);
        assert_eq!(reg.end_address(), Some(6));
        assert!(reg.has_logging());
    }

    #[test]
    fn test_f32_register_at_address_space_end_overflows() {
        let reg =
            HoldingRegister::new(u16::MAX, 0.0, "", "").with_data_type(RegisterDataType::F32);
        assert_eq!(reg.end_address(), None);
    }

    #[test]
    fn test_holding_register_serde_shape() {
        let reg = HoldingRegister::new(0, 0.0, "pwm", "PWM Value");
        let json = serde_json::to_string(&reg).unwrap();

        // Unlogged registers omit logging_parameters entirely
        assert!(!json.contains("logging_parameters"));
        assert!(json.contains("\"datatype\":\"u16\""));

        let restored: HoldingRegister = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, reg);
    }

    #[test]
    fn test_holding_register_deserialization_minimal() {
        // label/description/datatype all default
        let json = r#"{"address": 37, "value": 0.0}"#;
        let reg: HoldingRegister = serde_json::from_str(json).unwrap();
        assert_eq!(reg.address, 37);
        assert_eq!(reg.data_type, RegisterDataType::U16);
        assert!(reg.label.is_empty());
        assert!(reg.logging_parameters.is_none());
    }

    #[test]
    fn test_logged_register_serde_roundtrip() {
        let reg = HoldingRegister::new(9, 0.0, "AIN2", "calibrated analog input 2")
            .with_data_type(RegisterDataType::F32)
            .with_logging_parameters(LoggingParameter::new("Charging Current", "A", 7200, "%.1f"));

        let json = serde_json::to_string(&reg).unwrap();
        assert!(json.contains("\"history_buffer_length\":7200"));

        let restored: HoldingRegister = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, reg);
    }

    // ========== Coil tests ==========

    #[test]
    fn test_coil_is_always_single_width() {
        let coil = Coil::new(3, false, "DOUT3", "value of digital output 3");
        assert_eq!(coil.width(), 1);
        assert_eq!(coil.end_address(), Some(3));
    }

    #[test]
    fn test_coil_serde_roundtrip() {
        let coil = Coil::new(4, true, "DIN0", "value of digital input 0");
        let json = serde_json::to_string(&coil).unwrap();
        assert!(json.contains("\"value\":true"));
        let restored: Coil = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, coil);
    }
}
