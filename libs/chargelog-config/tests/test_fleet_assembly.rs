//! Fleet assembly integration tests
//!
//! Builds installation-sized fleets through the public API and checks the
//! cross-entity properties: per-device monitor groups, reference
//! resolution, sealing and deterministic output.

use chargelog_config::{
    Coil, ConfigError, DeviceConfig, FleetConfig, Group, HoldingRegister, InterfaceType,
    LoggingParameter, RegisterDataType, RegisterKind, SerialPortConfig,
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

const FIRST_ADDRESS: u8 = 1;
const LAST_ADDRESS: u8 = 30;

/// Analog input channels every charger exposes as floats
const ANALOG_ADDRESSES: [u16; 4] = [5, 7, 9, 11];

fn charger_device(device_address: u8, port: &SerialPortConfig) -> DeviceConfig {
    let mut device = DeviceConfig::new(
        Uuid::from_u128(0x100 + u128::from(device_address)),
        device_address,
        "Battery Tester",
    )
    .unwrap();
    device.configure_serial_interface(port).unwrap();

    device
        .add_holding_register(HoldingRegister::new(0, 0.0, "pwm", "PWM Value"))
        .unwrap();

    let channels = [
        ("AIN0", "Battery Voltage", ""),
        ("AIN1", "Battery Temperature", "deg. C"),
        ("AIN2", "Charging Current", "A"),
        ("AIN3", "Discharging Current", "A"),
    ];
    for (address, (label, channel, unit)) in ANALOG_ADDRESSES.iter().zip(channels) {
        device
            .add_holding_register(
                HoldingRegister::new(*address, 0.0, label, "")
                    .with_data_type(RegisterDataType::F32)
                    .with_logging_parameters(LoggingParameter::new(channel, unit, 7200, "%.1f")),
            )
            .unwrap();
    }

    device
        .add_holding_register(
            HoldingRegister::new(50, 0.0, "SET_BV", "battery voltage setpoint")
                .with_data_type(RegisterDataType::F32),
        )
        .unwrap();

    for bit in 0..4u16 {
        device
            .add_coil(Coil::new(bit, false, "DOUT", ""))
            .unwrap();
    }

    device
}

fn build_fleet() -> FleetConfig {
    let mut fleet = FleetConfig::new(
        Uuid::from_u128(1),
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    );
    let port = SerialPortConfig::new(Uuid::from_u128(0x2000), "com6");

    for device_address in FIRST_ADDRESS..=LAST_ADDRESS {
        fleet
            .add_device(charger_device(device_address, &port))
            .unwrap();

        let mut group = Group::monitor(format!("Battery Tester {}", device_address));
        for address in ANALOG_ADDRESSES {
            group.add_register_reference(RegisterKind::HoldingRegister, device_address, address);
        }
        fleet.add_monitor_group(group).unwrap();
    }

    fleet.add_serial_port(port).unwrap();

    fleet
}

#[test]
fn test_thirty_device_fleet_has_one_monitor_group_per_device() {
    let fleet = build_fleet();

    assert_eq!(fleet.devices().len(), 30);
    assert_eq!(fleet.monitor_groups().len(), 30);

    for (device, group) in fleet.devices().iter().zip(fleet.monitor_groups()) {
        assert_eq!(group.len(), 4);
        // Every reference in a device's group carries that device's address
        assert!(group
            .references
            .iter()
            .all(|reference| reference.device_address == device.device_address));
    }

    assert_eq!(fleet.reference_count(), 120);
}

#[test]
fn test_every_device_points_at_the_shared_line() {
    let fleet = build_fleet();

    for device in fleet.devices() {
        assert_eq!(device.interface_type, InterfaceType::Rtu);
        assert_eq!(device.interface_descriptor["port_name"], "com6");
    }
}

#[test]
fn test_every_reference_resolves_after_assembly() {
    let fleet = build_fleet();
    assert!(fleet.validate().is_ok());

    for group in fleet.monitor_groups() {
        for reference in &group.references {
            let resolved = fleet.resolve(reference).unwrap();
            // The analog channels are floats spanning two registers
            assert_eq!(resolved.width(), 2);
        }
    }
}

#[test]
fn test_float_setpoint_resolves_with_full_width() {
    let mut fleet = build_fleet();

    let mut control = Group::control("Control Battery Charging Parameters");
    control.add_register_reference(RegisterKind::HoldingRegister, 1, 50);
    fleet.add_control_group(control).unwrap();

    let reference = &fleet.control_groups()[0].references[0];
    assert_eq!(fleet.resolve(reference).unwrap().width(), 2);
}

#[test]
fn test_cross_device_group_resolves_on_every_member() {
    let mut fleet = build_fleet();

    // One template group sweeping the voltage channel of the whole bus
    let mut group = Group::monitor("Monitor All Instruments");
    for device_address in FIRST_ADDRESS..=LAST_ADDRESS {
        group.add_register_reference(RegisterKind::HoldingRegister, device_address, 5);
    }
    fleet.add_monitor_group(group).unwrap();

    assert!(fleet.validate().is_ok());
}

#[test]
fn test_dangling_reference_fails_validation_not_construction() {
    let mut fleet = build_fleet();

    // Unit 31 was never added; authoring the reference itself must succeed
    let mut group = Group::monitor("Battery Tester 31");
    group.add_register_reference(RegisterKind::HoldingRegister, 31, 5);
    fleet.add_monitor_group(group).unwrap();

    assert_eq!(fleet.validate().unwrap_err(), ConfigError::UnknownDevice(31));
}

#[test]
fn test_serialization_is_deterministic_and_seals() {
    let mut fleet = build_fleet();
    let port = SerialPortConfig::new(Uuid::from_u128(0x2000), "com6");

    let first = fleet.to_json().unwrap();
    let second = fleet.to_json().unwrap();
    assert_eq!(first, second);
    assert!(fleet.is_sealed());

    assert_eq!(
        fleet.add_device(charger_device(31, &port)).unwrap_err(),
        ConfigError::FleetSealed
    );
}

#[test]
fn test_identical_inputs_build_identical_documents() {
    let mut first = build_fleet();
    let mut second = build_fleet();
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}
