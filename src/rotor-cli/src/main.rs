// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

mod session;
mod supervisor;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use rotor_app::{init_logging, load_device_config, DeviceConfig};
use rotor_backend::{register_builtin_backends_on, RegistrationContext};
use rotor_core::table::TableAccess;
use rotor_core::DriveError;
use rotor_protocol::FrameCodec;
use rotor_reporting::{ScreenPrinter, TelemetryLog};

use session::{Command, MotionArgs, Session};

const PKG_DESCRIPTION: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " - single-axis turntable control over a serial link"
);

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to the JSON device configuration file
    #[arg(long = "config", value_name = "FILE", required_unless_present = "print_config")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Command to execute: Init, Position Run, Speed Run, Stop, Free Mode, Reset
    #[arg(long = "command", required_unless_present = "print_config")]
    command: Option<String>,
    /// Acceleration in device units
    #[arg(long = "acc")]
    acc: Option<f64>,
    /// Target speed in degrees per second
    #[arg(long = "speed")]
    speed: Option<f64>,
    /// Signed angle increment in degrees
    #[arg(long = "angle", allow_hyphen_values = true)]
    angle: Option<f64>,
    /// Print live telemetry lines during polling phases
    #[arg(
        long = "printScreen",
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    print_screen: bool,
    /// Write one CSV row per telemetry sample to this file
    #[arg(long = "SaveCSVFile", value_name = "FILE")]
    save_csv_file: Option<PathBuf>,
}

async fn run(cli: Cli) -> Result<(), DriveError> {
    let Some(config_path) = cli.config.as_deref() else {
        return Err(DriveError::Config("--config is required".to_string()));
    };
    let cfg = load_device_config(config_path).map_err(|e| DriveError::Config(e.to_string()))?;
    cfg.validate().map_err(DriveError::Config)?;

    init_logging(cfg.log_level.as_deref());

    let Some(command_str) = cli.command.as_deref() else {
        return Err(DriveError::Config("--command is required".to_string()));
    };
    let Some(command) = Command::parse(command_str) else {
        return Err(DriveError::Config("Unknown command".to_string()));
    };

    let mut registry = RegistrationContext::new();
    register_builtin_backends_on(&mut registry);

    let framing = FrameCodec::new(cfg.uart_ascii_start.clone(), cfg.uart_ascii_stop.clone());
    let access = TableAccess::Serial {
        path: cfg.com_port.clone(),
        baud: cfg.baudrate,
    };
    info!(
        "Opening {} turntable on {} @ {} baud",
        cfg.protocol, cfg.com_port, cfg.baudrate
    );
    let table = registry.build_table(&cfg.protocol, access, framing)?;
    let backend_info = table.info();
    info!(
        "Backend ready: {} {} ({})",
        backend_info.manufacturer, backend_info.model, backend_info.protocol
    );

    let csv = TelemetryLog::create(cli.save_csv_file.as_deref()).map_err(DriveError::Config)?;
    let screen = ScreenPrinter::new(cli.print_screen);

    let (cancel_rx, _watcher) = supervisor::spawn_interrupt_watcher();

    let args = MotionArgs {
        acc: cli.acc,
        speed: cli.speed,
        angle: cli.angle,
    };
    Session::new(table, cancel_rx, screen, csv)
        .execute(command, args)
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", DeviceConfig::example_json());
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        // Deliberate termination: the supervisor already tore the session
        // down; nothing is reported on stdout.
        Err(DriveError::Interrupted) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error {}", e);
            ExitCode::FAILURE
        }
    }
}
