//! Serial transport configuration
//!
//! Describes the RS-485 line a fleet hangs off: port name, baud rate,
//! framing and the per-request reply timeout. Purely declarative; opening
//! the port is the runtime's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{ConfigError, Result};

/// Serial parity configuration
///
/// Wire form uses the capitalized names ("None", "Even", "Odd") the runtime
/// expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

impl Parity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Even => "Even",
            Self::Odd => "Odd",
        }
    }
}

impl FromStr for Parity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "even" => Ok(Self::Even),
            "odd" => Ok(Self::Odd),
            _ => Err(format!("Unknown parity: {}", s)),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serial stop bits configuration
///
/// Serialized as the bare number (1 or 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl TryFrom<u8> for StopBits {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            _ => Err(format!("Invalid stop bits: {}", value)),
        }
    }
}

impl From<StopBits> for u8 {
    fn from(value: StopBits) -> Self {
        match value {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// One serial line shared by every device of the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialPortConfig {
    /// Stable identity, injected by the caller
    pub id: Uuid,
    /// OS-level port name, e.g. "com6" or "/dev/ttyUSB0"
    pub port_name: String,
    /// Line speed in bit/s
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default)]
    pub parity: Parity,
    #[serde(default)]
    pub stop_bits: StopBits,
    /// Reply timeout per request, milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
}

fn default_baud_rate() -> u32 {
    19200
}

fn default_timeout_ms() -> u32 {
    1000
}

impl SerialPortConfig {
    /// Create a port configuration with common RS-485 defaults
    pub fn new(id: Uuid, port_name: impl Into<String>) -> Self {
        Self {
            id,
            port_name: port_name.into(),
            baud_rate: default_baud_rate(),
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Set baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set parity
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set stop bits
    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Set reply timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Validate port configuration
    pub fn validate(&self) -> Result<()> {
        if self.port_name.is_empty() {
            return Err(ConfigError::validation("serial port name cannot be empty"));
        }

        // Common baud rates validation
        match self.baud_rate {
            300 | 600 | 1200 | 2400 | 4800 | 9600 | 19200 | 38400 | 57600 | 115200 | 230400 => {}
            _ => {
                return Err(ConfigError::validation(format!(
                    "unsupported baud rate: {}",
                    self.baud_rate
                )))
            }
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::validation("reply timeout must be at least 1 ms"));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    fn fixed_id() -> Uuid {
        Uuid::parse_str("86b1f3c2-11e5-46a3-8f5e-2d9b3a1c4d77").unwrap()
    }

    #[test]
    fn test_defaults() {
        let port = SerialPortConfig::new(fixed_id(), "com6");
        assert_eq!(port.baud_rate, 19200);
        assert_eq!(port.parity, Parity::None);
        assert_eq!(port.stop_bits, StopBits::One);
        assert_eq!(port.timeout_ms, 1000);
        assert!(port.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nonstandard_baud() {
        let port = SerialPortConfig::new(fixed_id(), "com6").with_baud_rate(12345);
        assert!(port.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let port = SerialPortConfig::new(fixed_id(), "");
        assert!(port.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let port = SerialPortConfig::new(fixed_id(), "com6").with_timeout_ms(0);
        assert!(port.validate().is_err());
    }

    #[test]
    fn test_parity_wire_names_are_capitalized() {
        assert_eq!(serde_json::to_string(&Parity::None).unwrap(), "\"None\"");
        assert_eq!(serde_json::to_string(&Parity::Even).unwrap(), "\"Even\"");
        assert_eq!(Parity::from_str("odd").unwrap(), Parity::Odd);
        assert!(Parity::from_str("mark").is_err());
    }

    #[test]
    fn test_stop_bits_serialize_as_number() {
        assert_eq!(serde_json::to_string(&StopBits::One).unwrap(), "1");
        assert_eq!(serde_json::to_string(&StopBits::Two).unwrap(), "2");

        let bits: StopBits = serde_json::from_str("2").unwrap();
        assert_eq!(bits, StopBits::Two);
        assert!(serde_json::from_str::<StopBits>("3").is_err());
    }

    #[test]
    fn test_port_serde_roundtrip() {
        let port = SerialPortConfig::new(fixed_id(), "com6")
            .with_baud_rate(19200)
            .with_timeout_ms(1000);

        let json = serde_json::to_value(&port).unwrap();
        assert_eq!(json["port_name"], "com6");
        assert_eq!(json["parity"], "None");
        assert_eq!(json["stop_bits"], 1);

        let restored: SerialPortConfig = serde_json::from_str(&json.to_string()).unwrap();
        assert_eq!(restored, port);
    }
}
