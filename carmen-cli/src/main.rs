use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use carmen_lib::Carmen;
use carmen_lib::constants::DEFAULT_BAUD_RATE;
use carmen_lib::transport::SerialTransport;

/// Service tool for Carmen pressure/temperature transmitters.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial port the transmitter is attached to.
    #[arg(short, long, env = "CARMEN_PORT", global = true)]
    port: Option<String>,

    /// Baud rate of the service interface.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE, global = true)]
    baud: u32,

    /// Read timeout in milliseconds.
    #[arg(long, default_value_t = 1000, global = true)]
    timeout_ms: u64,

    /// Render decoded records as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read and print the factory typeplate.
    Typeplate,
    /// Read calibrated pressure and temperature.
    Measure {
        /// Number of readings to take.
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Delay between readings in milliseconds.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Read the device serial number.
    SerialNumber,
    /// Soft-reset the device.
    Reset,
    /// List serial ports on this machine.
    ListPorts,
}

fn connect(cli: &Cli) -> Result<Carmen<SerialTransport>> {
    let port = cli
        .port
        .as_deref()
        .context("no serial port given (use --port or CARMEN_PORT)")?;
    let transport = SerialTransport::open_with_config(
        port,
        cli.baud,
        Duration::from_millis(cli.timeout_ms),
    )?;
    Ok(Carmen::new(transport))
}

fn list_ports() -> Result<()> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        println!("{} ({:?})", port.port_name, port.port_type);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbose.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time(),
        )
        .init();

    match &cli.command {
        Commands::Typeplate => {
            let mut device = connect(&cli)?;
            let typeplate = device.read_typeplate()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&typeplate)?);
            } else {
                println!("{typeplate}");
            }
        }
        Commands::Measure { count, interval_ms } => {
            let mut device = connect(&cli)?;
            for i in 0..*count {
                let measurement = device.read_measurement()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&measurement)?);
                } else {
                    println!("{measurement}");
                }
                if i + 1 < *count {
                    thread::sleep(Duration::from_millis(*interval_ms));
                }
            }
        }
        Commands::SerialNumber => {
            let mut device = connect(&cli)?;
            println!("Serial Number: {}", device.read_serial_number()?);
        }
        Commands::Reset => {
            let mut device = connect(&cli)?;
            device.soft_reset()?;
            println!("Reset issued; typeplate must be re-read.");
        }
        Commands::ListPorts => list_ports()?,
    }

    Ok(())
}
