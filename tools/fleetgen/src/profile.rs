//! Battery charger v1 device profile
//!
//! The register map of the battery charging instrument firmware and the
//! group templates the logger runtime expects. Addresses, labels and
//! descriptions mirror the firmware register documentation; the assembly
//! order is fixed so a given identity sequence always yields the same
//! document.

use chargelog_config::{
    Coil, DeviceConfig, FleetConfig, Group, HoldingRegister, LoggingParameter, RegisterDataType,
    RegisterKind, Result, SerialPortConfig,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEVICE_NAME: &str = "Battery Tester";
pub const FIRST_DEVICE_ADDRESS: u8 = 1;
pub const LAST_DEVICE_ADDRESS: u8 = 30;

/// Calibrated analog input floats, one per channel
const ANALOG_ADDRESSES: [u16; 4] = [5, 7, 9, 11];

/// Channels polled per instrument: the four analog inputs plus the three
/// charge accumulators
const MONITOR_ADDRESSES: [u16; 7] = [5, 7, 9, 11, 17, 23, 29];

/// Charging schedule and setpoint registers
const CONTROL_ADDRESSES: [u16; 5] = [47, 48, 49, 50, 52];

/// Calibration coefficients, charge accumulators and RTC registers
const CALIBRATE_ADDRESSES: [u16; 16] =
    [13, 15, 17, 19, 21, 23, 25, 27, 29, 31, 33, 35, 40, 41, 42, 43];

/// Build one charging instrument's register schema on the shared line
pub fn charger_device(
    device_id: Uuid,
    device_address: u8,
    port: &SerialPortConfig,
) -> Result<DeviceConfig> {
    let mut device = DeviceConfig::new(device_id, device_address, DEVICE_NAME)?;
    device.configure_serial_interface(port)?;

    for register in holding_registers() {
        device.add_holding_register(register)?;
    }
    for coil in coils() {
        device.add_coil(coil)?;
    }

    Ok(device)
}

fn holding_registers() -> Vec<HoldingRegister> {
    let mut registers = vec![HoldingRegister::new(0, 0.0, "pwm", "PWM Value")];

    for channel in 0..4u16 {
        registers.push(HoldingRegister::new(
            1 + channel,
            0.0,
            format!("AIN{channel}_RAW"),
            format!(
                "Holds uncalibrated value of analog input channel {channel}, writing to this \
                 register has no effect. It will be overwritten with new value before accessing \
                 this reigster"
            ),
        ));
    }

    // Calibrated channels: what each analog input is wired to
    let channels = [
        ("Battery Voltage", ""),
        ("Battery Temperature", "deg. C"),
        ("Charging Current", "A"),
        ("Discharging Current", "A"),
    ];
    for (channel, (name, unit)) in channels.iter().enumerate() {
        registers.push(
            HoldingRegister::new(
                ANALOG_ADDRESSES[channel],
                0.0,
                format!("AIN{channel}"),
                format!(
                    "holds calibrated value of analog input channel {channel}, This is read only \
                     register"
                ),
            )
            .with_data_type(RegisterDataType::F32)
            .with_logging_parameters(LoggingParameter::new(*name, *unit, 7200, "%.1f")),
        );
    }

    // Per-channel calibration pairs: scale factor, then offset two words up
    for channel in 0..4u16 {
        let base = 13 + 6 * channel;
        for (offset, suffix, description) in [
            (0, "SF", "Analog Input Scale Factor"),
            (2, "OT", "Analog Input Offset term"),
        ] {
            let label = format!("AIN{channel}_{suffix}");
            registers.push(
                HoldingRegister::new(base + offset, 0.0, label.clone(), description)
                    .with_data_type(RegisterDataType::F32)
                    .with_logging_parameters(LoggingParameter::new(label, "", 1, "%.5f")),
            );
        }
    }

    let charges = [
        (17, "CHARGING_CHARGE", "Charge supplied while charging", "Charge at charging"),
        (23, "DISCHARGING_CHARGE", "Charge taken during discharging", "Charge at discharging"),
        (29, "NET_CHARGE", "Net charge supplied to battery", "NET Charge"),
    ];
    for (address, label, description, channel) in charges {
        registers.push(
            HoldingRegister::new(address, 0.0, label, description)
                .with_data_type(RegisterDataType::F32)
                .with_logging_parameters(LoggingParameter::new(channel, "C", 1, "%.5f")),
        );
    }

    let scalars = [
        (35, "BAT_CON_TIM_HIGH", "Time at which battry is connected"),
        (36, "BAT_CON_TIM_LOW", "Time at which battry is connected"),
        (37, "VERSION_MAJOR", "VERSION MAJOR"),
        (38, "VERSION_MINOR", "VERSION MINOR"),
        (39, "VERSION_PATCH", "VERSION PATCH"),
        (
            40,
            "RTC_LOCK",
            "When 0x5555 value is wrriten to this register, then value that is written at \
             RTC_HOUR, RTC_MINS & RTC_SECS will be written in RTC.",
        ),
        (41, "RTC_HOUR", "Value of hour taken from RTC"),
        (42, "RTC_MIN", "Value of minute taken from RTC"),
        (43, "RTC_SEC", "Value of second taken from RTC"),
        (44, "TRIGGER_HOUR", "RTC hour at which charging trigger came"),
        (45, "TRIGGER_MINS", "RTC minute at which charging trigger came"),
        (46, "TRIGGER_SECS", "RTC second at which charging trigger came"),
        (
            47,
            "CHARGING_TIMEPERIOD_HOUR",
            "timeperiod in which battery is supposed to be charged (hours)",
        ),
        (
            48,
            "CHARGING_TIMEPERIOD_MINS",
            "timeperiod in which battery is supposed to be charged (mins)",
        ),
        (
            49,
            "CHARGING_TIMEPERIOD_SECS",
            "timeperiod in which battery is supposed to be charged (secs)",
        ),
    ];
    for (address, label, description) in scalars {
        registers.push(HoldingRegister::new(address, 0.0, label, description));
    }

    registers.push(
        HoldingRegister::new(
            50,
            0.0,
            "SET_BV",
            "Expected battery voltage at trigger time + timeperiod",
        )
        .with_data_type(RegisterDataType::F32)
        .with_logging_parameters(LoggingParameter::new("Expected Battery Voltage", "V", 1, "%.5f")),
    );
    registers.push(
        HoldingRegister::new(
            52,
            0.0,
            "TARGET_DISCHARGE_CURR",
            "target dicharging current at which to discharge the battery during discharging test",
        )
        .with_data_type(RegisterDataType::F32)
        .with_logging_parameters(LoggingParameter::new("Target Discharge Current", "A", 1, "%.5f")),
    );

    registers
}

fn coils() -> Vec<Coil> {
    let mut coils = Vec::with_capacity(8);
    for bit in 0..4u16 {
        coils.push(Coil::new(
            bit,
            false,
            format!("DOUT{bit}"),
            format!("value of digital output {bit}"),
        ));
    }
    for bit in 0..4u16 {
        coils.push(Coil::new(
            4 + bit,
            false,
            format!("DIN{bit}"),
            format!("value of digital input {bit}"),
        ));
    }
    coils
}

/// Per-instrument monitor group over the analog and charge channels
pub fn monitor_group(device_address: u8) -> Group {
    let mut group = Group::monitor(format!("Battery Charger Instrument {device_address}"));
    for address in MONITOR_ADDRESSES {
        group.add_register_reference(RegisterKind::HoldingRegister, device_address, address);
    }
    group
}

/// Optional template sweeping the analog channels of every instrument at once
pub fn monitor_all_group(first_address: u8, last_address: u8) -> Group {
    let mut group = Group::monitor("Monitor All Instruments");
    for device_address in first_address..=last_address {
        for address in ANALOG_ADDRESSES {
            group.add_register_reference(RegisterKind::HoldingRegister, device_address, address);
        }
    }
    group
}

/// Per-instrument control group over the charging schedule registers
pub fn control_group(device_address: u8) -> Group {
    let mut group = Group::control(format!("Control Battery Charging Parameters {device_address}"));
    for address in CONTROL_ADDRESSES {
        group.add_register_reference(RegisterKind::HoldingRegister, device_address, address);
    }
    group
}

/// Per-instrument control group over the calibration and RTC registers
pub fn calibrate_group(device_address: u8) -> Group {
    let mut group = Group::control(format!(
        "Calibrate Battery Charging Instrument {device_address}"
    ));
    for address in CALIBRATE_ADDRESSES {
        group.add_register_reference(RegisterKind::HoldingRegister, device_address, address);
    }
    group
}

/// Knobs for one generation run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub first_address: u8,
    pub last_address: u8,
    pub port_name: String,
    pub baud_rate: u32,
    pub timeout_ms: u32,
    pub include_monitor_all: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            first_address: FIRST_DEVICE_ADDRESS,
            last_address: LAST_DEVICE_ADDRESS,
            port_name: "com6".to_string(),
            baud_rate: 19200,
            timeout_ms: 1000,
            include_monitor_all: false,
        }
    }
}

/// Assemble and validate the full installation
///
/// Identity comes from the caller: `next_id` is drawn once for the serial
/// port, then once per instrument, so a deterministic source yields a
/// deterministic document. Per instrument the order is device, monitor
/// group; control and calibrate groups for all instruments follow after
/// the last device, then the serial port.
pub fn build_fleet<F>(
    options: &GenerateOptions,
    config_id: Uuid,
    generated_at: DateTime<Utc>,
    mut next_id: F,
) -> Result<FleetConfig>
where
    F: FnMut() -> Uuid,
{
    let port = SerialPortConfig::new(next_id(), options.port_name.as_str())
        .with_baud_rate(options.baud_rate)
        .with_timeout_ms(options.timeout_ms);

    let mut fleet = FleetConfig::new(config_id, generated_at);
    let mut control_groups = Vec::new();
    let mut calibrate_groups = Vec::new();

    for device_address in options.first_address..=options.last_address {
        fleet.add_device(charger_device(next_id(), device_address, &port)?)?;
        fleet.add_monitor_group(monitor_group(device_address))?;
        control_groups.push(control_group(device_address));
        calibrate_groups.push(calibrate_group(device_address));
    }

    if options.include_monitor_all {
        fleet.add_monitor_group(monitor_all_group(
            options.first_address,
            options.last_address,
        ))?;
    }

    for group in control_groups {
        fleet.add_control_group(group)?;
    }
    for group in calibrate_groups {
        fleet.add_control_group(group)?;
    }

    fleet.add_serial_port(port)?;
    fleet.validate()?;
    Ok(fleet)
}
