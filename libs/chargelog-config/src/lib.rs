//! Chargelog Configuration Library
//!
//! Register-map and fleet configuration model for Modbus-RTU battery
//! charger installations. This library provides the pure authoring logic,
//! without any bus or serial I/O.
//!
//! # Modules
//!
//! - `register`: Word/bit register records, data types, logging metadata
//! - `device`: Per-unit register banks with overlap-checked insertion
//! - `group`: Monitor/control groups over late-bound register references
//! - `serial`: RS-485 transport parameters
//! - `fleet`: The root aggregate, reference resolution, sealing lifecycle
//! - `document`: The deterministic JSON artifact and its parsing
//! - `error`: Error taxonomy shared by every operation
//!
//! # Example
//!
//! ```
//! use chargelog_config::{
//!     DeviceConfig, FleetConfig, Group, HoldingRegister, RegisterKind,
//! };
//! use chrono::TimeZone;
//!
//! let mut device = DeviceConfig::new(uuid::Uuid::nil(), 1, "Battery Tester").unwrap();
//! device
//!     .add_holding_register(HoldingRegister::new(0, 0.0, "pwm", "PWM Value"))
//!     .unwrap();
//!
//! let mut group = Group::monitor("Battery Tester 1");
//! group.add_register_reference(RegisterKind::HoldingRegister, 1, 0);
//!
//! let mut fleet = FleetConfig::new(
//!     uuid::Uuid::nil(),
//!     chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
//! );
//! fleet.add_device(device).unwrap();
//! fleet.add_monitor_group(group).unwrap();
//! fleet.validate().unwrap();
//!
//! let json = fleet.to_json().unwrap();
//! assert!(json.contains("\"monitor_groups\""));
//! ```

pub mod device;
pub mod document;
pub mod error;
pub mod fleet;
pub mod group;
pub mod register;
pub mod serial;

// Re-exports for convenience
pub use device::{DeviceConfig, InterfaceType, ResolvedRegister, MAX_DEVICE_ADDRESS};
pub use document::FleetDocument;
pub use error::{ConfigError, Result};
pub use fleet::FleetConfig;
pub use group::{Group, GroupKind, RegisterReference};
pub use register::{
    Coil, HoldingRegister, LoggingParameter, RegisterDataType, RegisterKind, RegisterSlot,
};
pub use serial::{Parity, SerialPortConfig, StopBits};
