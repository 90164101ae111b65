//! Fleetgen - Configuration Generator for the Battery Charger Logger
//!
//! Authors the register-map configuration document for a fleet of battery
//! charging instruments on one Modbus-RTU bus: the per-unit register
//! schemas, the monitor/control groups over them and the serial transport.

mod profile;

use anyhow::{bail, Context, Result};
use chargelog_config::{FleetConfig, FleetDocument, Group};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::profile::GenerateOptions;

#[derive(Parser)]
#[command(name = "fleetgen")]
#[command(about = "Fleetgen - Battery Charger Logger Configuration Generator")]
#[command(long_about = "Fleetgen - Battery Charger Logger Configuration Generator

Commands:
  generate    Generate the fleet configuration document
  validate    Validate an existing configuration document
  show        Summarize an existing configuration document

Examples:
  fleetgen generate                              # 30 instruments on com6
  fleetgen generate -o fleet.json --last-address 8
  fleetgen validate battery_charger_v1.json
  fleetgen show battery_charger_v1.json --detailed

Use 'fleetgen <command> --help' for more information on a specific command.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the fleet configuration document
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "battery_charger_v1.json")]
        output: PathBuf,

        /// First bus unit address
        #[arg(long, default_value_t = profile::FIRST_DEVICE_ADDRESS)]
        first_address: u8,

        /// Last bus unit address (inclusive)
        #[arg(long, default_value_t = profile::LAST_DEVICE_ADDRESS)]
        last_address: u8,

        /// Serial port name
        #[arg(long, default_value = "com6")]
        port_name: String,

        /// Serial baud rate
        #[arg(long, default_value_t = 19200)]
        baud_rate: u32,

        /// Reply timeout in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u32,

        /// Include the all-instruments monitor template group
        #[arg(long)]
        monitor_all: bool,

        /// Pretty-print the emitted JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate an existing configuration document
    Validate {
        /// Configuration document to check
        file: PathBuf,
    },

    /// Summarize an existing configuration document
    Show {
        /// Configuration document to summarize
        file: PathBuf,

        /// Show per-device and per-group breakdown
        #[arg(short, long)]
        detailed: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure colored output
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate {
            output,
            first_address,
            last_address,
            port_name,
            baud_rate,
            timeout_ms,
            monitor_all,
            pretty,
        } => {
            let options = GenerateOptions {
                first_address,
                last_address,
                port_name,
                baud_rate,
                timeout_ms,
                include_monitor_all: monitor_all,
            };
            generate_command(&options, &output, pretty)?;
        },
        Commands::Validate { file } => {
            validate_command(&file)?;
        },
        Commands::Show { file, detailed } => {
            show_command(&file, detailed)?;
        },
    }

    Ok(())
}

fn generate_command(options: &GenerateOptions, output: &Path, pretty: bool) -> Result<()> {
    if options.first_address > options.last_address {
        bail!(
            "first address {} exceeds last address {}",
            options.first_address,
            options.last_address
        );
    }

    let instrument_count =
        u16::from(options.last_address) - u16::from(options.first_address) + 1;
    println!(
        "{} {} instruments on {}",
        "Generating fleet configuration:".bright_cyan(),
        instrument_count.to_string().bright_yellow(),
        options.port_name.bright_yellow()
    );

    let mut fleet = profile::build_fleet(options, Uuid::new_v4(), chrono::Utc::now(), Uuid::new_v4)?;

    let json = if pretty {
        fleet.to_json_pretty()?
    } else {
        fleet.to_json()?
    };
    if let Some(parent) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    debug!(path = %output.display(), bytes = json.len(), "writing document");
    fs::write(output, &json).with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Wrote {} ({} devices, {} groups, {} references, {} bytes)",
        "SUCCESS".green(),
        output.display().to_string().bright_white(),
        fleet.devices().len(),
        fleet.monitor_groups().len() + fleet.control_groups().len(),
        fleet.reference_count(),
        json.len()
    );
    Ok(())
}

fn validate_command(file: &Path) -> Result<()> {
    println!(
        "{} {}",
        "Validating configuration document:".bright_cyan(),
        file.display().to_string().bright_yellow()
    );
    println!();

    print!("{} Reading document... ", "-".bright_cyan());
    let text = match fs::read_to_string(file) {
        Ok(text) => {
            println!("{}", "OK".green());
            text
        },
        Err(e) => {
            println!("{}", "FAIL".red());
            eprintln!("   {} {}", "ERROR".red(), e);
            std::process::exit(1);
        },
    };

    print!("{} Parsing document... ", "-".bright_cyan());
    let document = match FleetDocument::from_json_str(&text) {
        Ok(document) => {
            println!("{}", "OK".green());
            document
        },
        Err(e) => {
            println!("{}", "FAIL".red());
            eprintln!("   {} {}", "ERROR".red(), e);
            std::process::exit(1);
        },
    };

    print!("{} Resolving references... ", "-".bright_cyan());
    let fleet = match FleetConfig::from_document(document) {
        Ok(fleet) => {
            println!("{}", "OK".green());
            fleet
        },
        Err(e) => {
            println!("{}", "FAIL".red());
            eprintln!("   {} {}", "ERROR".red(), e);
            std::process::exit(1);
        },
    };

    println!(
        "\n{} {} devices, {} groups, {} references all resolve",
        "SUCCESS".green(),
        fleet.devices().len(),
        fleet.monitor_groups().len() + fleet.control_groups().len(),
        fleet.reference_count()
    );
    Ok(())
}

fn show_command(file: &Path, detailed: bool) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let fleet = FleetConfig::from_document(FleetDocument::from_json_str(&text)?)?;

    let monitor_refs: usize = fleet.monitor_groups().iter().map(Group::len).sum();
    let control_refs: usize = fleet.control_groups().iter().map(Group::len).sum();

    println!();
    println!("{}", "=".repeat(60).bright_blue());
    println!("{:^60}", "Fleet Configuration Summary".bright_yellow());
    println!("{}", "=".repeat(60).bright_blue());
    println!();
    println!("{:16} {}", "Config ID:".bright_cyan(), fleet.config_id());
    println!(
        "{:16} {}",
        "Generated:".bright_cyan(),
        fleet.generated_at().to_rfc3339()
    );
    println!("{:16} {}", "Devices:".bright_cyan(), fleet.devices().len());
    println!(
        "{:16} {} ({} references)",
        "Monitor groups:".bright_cyan(),
        fleet.monitor_groups().len(),
        monitor_refs
    );
    println!(
        "{:16} {} ({} references)",
        "Control groups:".bright_cyan(),
        fleet.control_groups().len(),
        control_refs
    );

    println!();
    println!("{}", "Serial ports:".bright_cyan());
    for port in fleet.serial_ports() {
        println!(
            "  {:8} {} baud, parity {}, {} stop bit(s), timeout {} ms",
            port.port_name.bright_white(),
            port.baud_rate,
            port.parity,
            u8::from(port.stop_bits),
            port.timeout_ms
        );
    }

    if detailed {
        println!();
        println!("{}", "Devices:".bright_cyan());
        for device in fleet.devices() {
            println!(
                "  {:3}  {:16} {} holding, {} input, {} coils, {} discrete, {} logged",
                device.device_address.to_string().bright_white(),
                device.device_name,
                device.holding_registers().count(),
                device.input_registers().count(),
                device.coils().count(),
                device.discrete_inputs().count(),
                device.logged_registers().count()
            );
        }

        println!();
        println!("{}", "Groups:".bright_cyan());
        for group in fleet.monitor_groups() {
            println!(
                "  {:8} {:44} {} members",
                "monitor".green(),
                group.name,
                group.len()
            );
        }
        for group in fleet.control_groups() {
            println!(
                "  {:8} {:44} {} members",
                "control".yellow(),
                group.name,
                group.len()
            );
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
    Ok(())
}
