//! Device register maps
//!
//! A `DeviceConfig` is the schema of one Modbus-RTU unit on the bus: its
//! unit address, a display name, the transport it is reached over and four
//! register banks. Banks are keyed by start address; insertion rejects any
//! span overlap, so a well-formed device can never carry two registers
//! claiming the same word. Multi-word registers (F32) occupy their full
//! span for the purpose of that check.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{ConfigError, Result};
use crate::register::{Coil, HoldingRegister, RegisterKind, RegisterSlot};
use crate::serial::SerialPortConfig;

/// Highest unit address addressable on a Modbus-RTU bus
pub const MAX_DEVICE_ADDRESS: u8 = 247;

/// Transport flavor a device is reached over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceType {
    /// Serial RS-485 line
    #[default]
    Rtu,
    /// Modbus-TCP endpoint
    Tcp,
}

impl InterfaceType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rtu => "rtu",
            Self::Tcp => "tcp",
        }
    }
}

impl FromStr for InterfaceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rtu" => Ok(Self::Rtu),
            "tcp" => Ok(Self::Tcp),
            _ => Err(format!("Unknown interface type: {}", s)),
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Borrowed view of a resolved register, independent of its bank shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedRegister<'a> {
    /// Word register from the holding or input bank
    Word(&'a HoldingRegister),
    /// Bit register from the coil or discrete-input bank
    Bit(&'a Coil),
}

impl ResolvedRegister<'_> {
    /// Start address of the resolved register
    pub fn address(&self) -> u16 {
        match self {
            Self::Word(register) => register.address,
            Self::Bit(coil) => coil.address,
        }
    }

    /// Width in register-type units
    pub fn width(&self) -> u16 {
        match self {
            Self::Word(register) => register.width(),
            Self::Bit(_) => 1,
        }
    }

    /// Display label of the resolved register
    pub fn label(&self) -> &str {
        match self {
            Self::Word(register) => &register.label,
            Self::Bit(coil) => &coil.label,
        }
    }
}

/// Register schema of one bus unit
///
/// The four banks are separate address spaces; holding register 0 and
/// coil 0 coexist. Register mutation goes through the `add_*` operations
/// so the no-overlap invariant holds for every reachable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Correlation id for the runtime, injected by the caller
    pub device_id: Uuid,
    /// Bus unit address, 1..=247
    pub device_address: u8,
    /// Model or role name shown in the runtime UI
    pub device_name: String,
    #[serde(default)]
    pub interface_type: InterfaceType,
    /// Transport parameters, opaque to the register model
    #[serde(default)]
    pub interface_descriptor: Value,
    #[serde(with = "regmap", default)]
    holding_registers: BTreeMap<u16, HoldingRegister>,
    #[serde(with = "regmap", default)]
    input_registers: BTreeMap<u16, HoldingRegister>,
    #[serde(with = "regmap", default)]
    coils: BTreeMap<u16, Coil>,
    #[serde(with = "regmap", default)]
    discrete_inputs: BTreeMap<u16, Coil>,
}

impl DeviceConfig {
    /// Create an empty device schema
    ///
    /// Rejects unit addresses outside 1..=247 (0 is the Modbus broadcast
    /// address and may not identify a device).
    pub fn new(device_id: Uuid, device_address: u8, device_name: impl Into<String>) -> Result<Self> {
        if device_address == 0 || device_address > MAX_DEVICE_ADDRESS {
            return Err(ConfigError::InvalidDeviceAddress(device_address));
        }
        Ok(Self {
            device_id,
            device_address,
            device_name: device_name.into(),
            interface_type: InterfaceType::Rtu,
            interface_descriptor: Value::Null,
            holding_registers: BTreeMap::new(),
            input_registers: BTreeMap::new(),
            coils: BTreeMap::new(),
            discrete_inputs: BTreeMap::new(),
        })
    }

    // ========== Transport ==========

    /// Attach a transport descriptor; last write wins
    pub fn configure_interface(&mut self, interface_type: InterfaceType, descriptor: Value) {
        self.interface_type = interface_type;
        self.interface_descriptor = descriptor;
    }

    /// Point the device at a shared serial line
    ///
    /// The port parameters are embedded as the transport descriptor so the
    /// runtime can open the line without consulting the fleet-level port
    /// list.
    pub fn configure_serial_interface(&mut self, port: &SerialPortConfig) -> Result<()> {
        let descriptor = serde_json::to_value(port)?;
        self.configure_interface(InterfaceType::Rtu, descriptor);
        Ok(())
    }

    // ========== Insertion ==========

    /// Add a register to the holding bank
    pub fn add_holding_register(&mut self, register: HoldingRegister) -> Result<()> {
        insert_register(
            &mut self.holding_registers,
            RegisterKind::HoldingRegister,
            register,
        )
    }

    /// Add a register to the input bank
    pub fn add_input_register(&mut self, register: HoldingRegister) -> Result<()> {
        insert_register(
            &mut self.input_registers,
            RegisterKind::InputRegister,
            register,
        )
    }

    /// Add a coil
    pub fn add_coil(&mut self, coil: Coil) -> Result<()> {
        insert_register(&mut self.coils, RegisterKind::Coil, coil)
    }

    /// Add a discrete input
    pub fn add_discrete_input(&mut self, coil: Coil) -> Result<()> {
        insert_register(&mut self.discrete_inputs, RegisterKind::DiscreteInput, coil)
    }

    // ========== Lookup ==========

    /// Look up a holding register by exact start address
    ///
    /// An address inside an F32 span but not at its start does not resolve.
    pub fn holding_register(&self, address: u16) -> Option<&HoldingRegister> {
        self.holding_registers.get(&address)
    }

    /// Look up an input register by exact start address
    pub fn input_register(&self, address: u16) -> Option<&HoldingRegister> {
        self.input_registers.get(&address)
    }

    /// Look up a coil by address
    pub fn coil(&self, address: u16) -> Option<&Coil> {
        self.coils.get(&address)
    }

    /// Look up a discrete input by address
    pub fn discrete_input(&self, address: u16) -> Option<&Coil> {
        self.discrete_inputs.get(&address)
    }

    /// Look up any register by bank and exact start address
    pub fn register(&self, kind: RegisterKind, address: u16) -> Option<ResolvedRegister<'_>> {
        match kind {
            RegisterKind::HoldingRegister => {
                self.holding_register(address).map(ResolvedRegister::Word)
            }
            RegisterKind::InputRegister => {
                self.input_register(address).map(ResolvedRegister::Word)
            }
            RegisterKind::Coil => self.coil(address).map(ResolvedRegister::Bit),
            RegisterKind::DiscreteInput => self.discrete_input(address).map(ResolvedRegister::Bit),
        }
    }

    // ========== Traversal ==========

    /// Holding-bank registers in address order
    pub fn holding_registers(&self) -> impl Iterator<Item = &HoldingRegister> {
        self.holding_registers.values()
    }

    /// Input-bank registers in address order
    pub fn input_registers(&self) -> impl Iterator<Item = &HoldingRegister> {
        self.input_registers.values()
    }

    /// Coils in address order
    pub fn coils(&self) -> impl Iterator<Item = &Coil> {
        self.coils.values()
    }

    /// Discrete inputs in address order
    pub fn discrete_inputs(&self) -> impl Iterator<Item = &Coil> {
        self.discrete_inputs.values()
    }

    /// Word registers carrying logging metadata, holding bank then input bank
    pub fn logged_registers(&self) -> impl Iterator<Item = &HoldingRegister> {
        self.holding_registers
            .values()
            .chain(self.input_registers.values())
            .filter(|register| register.has_logging())
    }

    /// Total register count across all four banks
    pub fn register_count(&self) -> usize {
        self.holding_registers.len()
            + self.input_registers.len()
            + self.coils.len()
            + self.discrete_inputs.len()
    }

    // ========== Validation ==========

    /// Re-check every invariant the operations enforce
    ///
    /// Needed for schemas built from a parsed document, which bypass the
    /// constructor and the checked insertion path.
    pub fn validate(&self) -> Result<()> {
        if self.device_address == 0 || self.device_address > MAX_DEVICE_ADDRESS {
            return Err(ConfigError::InvalidDeviceAddress(self.device_address));
        }

        validate_bank(&self.holding_registers, RegisterKind::HoldingRegister)?;
        validate_bank(&self.input_registers, RegisterKind::InputRegister)?;
        validate_bank(&self.coils, RegisterKind::Coil)?;
        validate_bank(&self.discrete_inputs, RegisterKind::DiscreteInput)?;

        for register in self
            .holding_registers
            .values()
            .chain(self.input_registers.values())
        {
            register.validate()?;
        }

        Ok(())
    }
}

/// Insert into a bank, rejecting span overlap with either neighbor
fn insert_register<R: RegisterSlot>(
    bank: &mut BTreeMap<u16, R>,
    kind: RegisterKind,
    register: R,
) -> Result<()> {
    let address = register.address();
    let end = register.end_address().ok_or(ConfigError::AddressOverflow {
        kind,
        address,
        width: register.width(),
    })?;

    // Nearest register starting at or below the new start may reach into it
    if let Some((&conflict, prior)) = bank.range(..=address).next_back() {
        if prior.end_address().is_some_and(|prior_end| prior_end >= address) {
            return Err(ConfigError::DuplicateAddress {
                kind,
                address,
                conflict,
            });
        }
    }

    // Any register starting inside the new span collides with it
    if let Some((&conflict, _)) = bank.range(address..=end).next() {
        return Err(ConfigError::DuplicateAddress {
            kind,
            address,
            conflict,
        });
    }

    bank.insert(address, register);
    Ok(())
}

/// Walk a bank in address order and re-check span disjointness
fn validate_bank<R: RegisterSlot>(bank: &BTreeMap<u16, R>, kind: RegisterKind) -> Result<()> {
    let mut prior: Option<(u16, u16)> = None;
    for (&address, register) in bank {
        let end = register.end_address().ok_or(ConfigError::AddressOverflow {
            kind,
            address,
            width: register.width(),
        })?;
        if let Some((conflict, prior_end)) = prior {
            if prior_end >= address {
                return Err(ConfigError::DuplicateAddress {
                    kind,
                    address,
                    conflict,
                });
            }
        }
        prior = Some((address, end));
    }
    Ok(())
}

/// Banks travel as address-ordered arrays, not JSON maps
mod regmap {
    use super::RegisterSlot;
    use serde::de::Error as DeError;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, R>(bank: &BTreeMap<u16, R>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        R: Serialize,
    {
        let mut seq = serializer.serialize_seq(Some(bank.len()))?;
        for register in bank.values() {
            seq.serialize_element(register)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D, R>(deserializer: D) -> Result<BTreeMap<u16, R>, D::Error>
    where
        D: Deserializer<'de>,
        R: Deserialize<'de> + RegisterSlot,
    {
        let entries = Vec::<R>::deserialize(deserializer)?;
        let mut bank = BTreeMap::new();
        for register in entries {
            let address = register.address();
            if bank.insert(address, register).is_some() {
                return Err(D::Error::custom(format!(
                    "duplicate register address {} in bank",
                    address
                )));
            }
        }
        Ok(bank)
    }
}
