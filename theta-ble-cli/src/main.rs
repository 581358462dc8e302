//! Command line tool for THETA cameras over Bluetooth LE
//!
//! Finds a camera by its advertised name, connects and runs one command.

mod settings;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use theta_ble::proto::{
    CameraPower, CommandErrorDescription, NetworkType, OptionName, ThetaOptions, ThetaState,
};
use theta_ble::{BtleplugTransport, Result as BleResult, ThetaDevice, Timeout, discovery};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use uuid::Uuid;

use settings::Settings;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "theta-ble")]
#[command(about = "Control THETA 360 cameras over Bluetooth LE")]
struct Cli {
    /// Advertised camera name, e.g. THETAYN10010104
    #[arg(short, long, global = true)]
    device: Option<String>,
    /// Token presented to the camera on connect
    #[arg(short = 't', long, global = true)]
    auth_token: Option<Uuid>,
    /// Config file (defaults to <config dir>/theta-ble/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Connect, read and write timeout in seconds
    #[arg(long, global = true)]
    connect_timeout: Option<u64>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for THETA cameras
    Scan {
        /// Scan duration in seconds
        #[arg(short = 'D', long, default_value = "10")]
        duration: u64,
    },
    /// Print camera identity and firmware
    Info,
    /// Print battery, power and shooting status
    Status,
    /// Take a still picture
    TakePicture,
    /// Read or change camera options
    Options {
        #[command(subcommand)]
        action: OptionsAction,
    },
    /// Read or change the wireless network mode
    NetworkType {
        /// AP, CL, ETHERNET, OFF or LTE; prints the current mode when absent
        value: Option<String>,
    },
    /// List Bluetooth remotes the camera can see
    Peripherals {
        /// Scan duration in seconds
        #[arg(short = 'D', long, default_value = "10")]
        duration: u64,
    },
    /// List WLAN access points the camera can see
    Ssids {
        /// Scan duration in seconds
        #[arg(short = 'D', long, default_value = "10")]
        duration: u64,
    },
    /// Print camera notifications until interrupted
    Watch,
    /// Write the effective device, token and timeouts to the config file
    SaveConfig,
}

#[derive(Subcommand)]
enum OptionsAction {
    /// Read options by name, e.g. captureMode networkType
    Get {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Write options from a JSON object, e.g. '{"cameraPower":"sleep"}'
    Set { json: String },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.device.is_some() {
        settings.device = cli.device.clone();
    }
    if cli.auth_token.is_some() {
        settings.auth_token = cli.auth_token;
    }
    if let Some(secs) = cli.connect_timeout {
        settings.timeout = settings.timeout.with_connect(Duration::from_secs(secs));
    }

    match cli.command {
        Commands::Scan { duration } => {
            let transport = BtleplugTransport::new().await?;
            let timeout = settings.timeout.with_scan(Duration::from_secs(duration));
            scan_cameras(&transport, timeout).await?;
        }
        Commands::SaveConfig => {
            let path = save_config(cli.config, &settings)?;
            println!("Saved {}", path.display());
        }
        command => {
            let transport = BtleplugTransport::new().await?;
            let device = connect(&transport, &settings).await?;
            let result = run(&device, command).await;
            if let Err(e) = device.disconnect().await {
                tracing::warn!(error = %e, "disconnect failed");
            }
            result?;
        }
    }

    Ok(())
}

/// Needs no Bluetooth adapter, so it works on hosts without one.
fn save_config(path: Option<PathBuf>, settings: &Settings) -> CliResult<PathBuf> {
    let path = match path {
        Some(path) => path,
        None => Settings::default_path().ok_or("cannot determine config directory")?,
    };
    settings.save(&path)?;
    Ok(path)
}

async fn scan_cameras(transport: &BtleplugTransport, timeout: Timeout) -> CliResult<()> {
    println!("Scanning for THETA cameras ({} seconds)...", timeout.scan.as_secs());

    let cameras = discovery::discover(transport, None, timeout).await?;

    println!("\nFound {} cameras:", cameras.len());
    for camera in cameras {
        println!("  {} ({})", camera.name(), camera.address());
    }
    Ok(())
}

async fn connect(transport: &BtleplugTransport, settings: &Settings) -> CliResult<ThetaDevice> {
    let name = settings
        .device
        .as_deref()
        .ok_or("no camera given; pass --device or set it in the config file")?;

    println!("Looking for {name}...");
    let device = discovery::find(transport, name, settings.timeout)
        .await?
        .ok_or_else(|| format!("camera {name} not found"))?;

    println!("Connecting to {} ({})...", device.name(), device.address());
    device.connect(settings.auth_token).await?;
    println!("Connected!");
    Ok(device)
}

async fn run(device: &ThetaDevice, command: Commands) -> CliResult<()> {
    match command {
        Commands::Info => print_info(device).await,
        Commands::Status => print_status(device).await,
        Commands::TakePicture => {
            println!("Taking picture...");
            device.shooting_control()?.take_picture_and_wait().await?;
            println!("Done.");
            Ok(())
        }
        Commands::Options { action } => options(device, action).await,
        Commands::NetworkType { value } => network_type(device, value).await,
        Commands::Peripherals { duration } => {
            let remotes = device
                .bluetooth_control()?
                .scan_peripheral_device(Duration::from_secs(duration))
                .await?;
            println!("Found {} remotes:", remotes.len());
            for remote in remotes {
                let marker = if remote.pairing { " [PAIRED]" } else { "" };
                println!("  {} ({}){}", remote.device_name, remote.mac_address, marker);
            }
            Ok(())
        }
        Commands::Ssids { duration } => {
            let ssids = device
                .wlan_control_v2()?
                .scan_ssid(Duration::from_secs(duration))
                .await?;
            println!("Found {} networks:", ssids.len());
            for ssid in ssids {
                println!("  {ssid}");
            }
            Ok(())
        }
        Commands::Watch => watch(device).await,
        Commands::Scan { .. } | Commands::SaveConfig => Ok(()),
    }
}

async fn print_info(device: &ThetaDevice) -> CliResult<()> {
    let info = device.camera_information()?;
    println!("Manufacturer:  {}", info.manufacturer_name().await?);
    println!("Model:         {}", info.model_number().await?);
    println!("Serial number: {}", info.serial_number().await?);
    println!("Firmware:      {}", info.firmware_revision().await?);
    println!("WLAN MAC:      {}", info.wlan_mac_address().await?);
    println!("Bluetooth MAC: {}", info.bluetooth_mac_address().await?);

    if let Ok(control) = device.camera_control_v2() {
        let details = control.get_info().await?;
        println!("{}", serde_json::to_string_pretty(&details)?);
    }
    Ok(())
}

async fn print_status(device: &ThetaDevice) -> CliResult<()> {
    let status = device.camera_status()?;
    println!("Battery:       {}%", status.battery_level().await?);
    println!("Charging:      {:?}", status.battery_status().await?);
    println!("Power:         {:?}", status.camera_power().await?);

    if let Ok(shooting) = device.shooting_control() {
        println!("Capture mode:  {:?}", shooting.capture_mode().await?);
        println!("File format:   {:?}", shooting.file_format().await?);
        println!("Pictures left: {}", shooting.remaining_pictures().await?);
        println!("Space left:    {} bytes", shooting.remaining_space().await?);
    }
    Ok(())
}

async fn options(device: &ThetaDevice, action: OptionsAction) -> CliResult<()> {
    let control = device.camera_control_v2()?;
    match action {
        OptionsAction::Get { names } => {
            let options = control.get_options_by_string(names.as_slice()).await?;
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
        OptionsAction::Set { json } => {
            let options = ThetaOptions::from_json(json.as_bytes())?;
            let names: Vec<_> = options.names().into_iter().map(OptionName::key).collect();
            control.set_options(&options).await?;
            println!("Updated {}", names.join(", "));
        }
    }
    Ok(())
}

async fn network_type(device: &ThetaDevice, value: Option<String>) -> CliResult<()> {
    let wlan = device.wlan_control_v2()?;
    match value {
        None => {
            let current = wlan.network_type().await?;
            println!("{}", current.as_option_str().unwrap_or("unknown"));
        }
        Some(value) => {
            let network_type = NetworkType::from(value.to_uppercase());
            if network_type == NetworkType::Unknown {
                return Err(format!("unknown network type {value}").into());
            }
            wlan.set_network_type(network_type).await?;
            println!("Network type set to {value}");
        }
    }
    Ok(())
}

async fn watch(device: &ThetaDevice) -> CliResult<()> {
    let status = device.camera_status()?;
    status
        .set_battery_level_notify(Some(Box::new(|level: BleResult<u8>| match level {
            Ok(level) => println!("battery: {level}%"),
            Err(e) => tracing::warn!(error = %e, "battery notification"),
        })))
        .await?;
    status
        .set_camera_power_notify(Some(Box::new(|power: BleResult<CameraPower>| match power {
            Ok(power) => println!("power: {power:?}"),
            Err(e) => tracing::warn!(error = %e, "power notification"),
        })))
        .await?;
    status
        .set_command_error_description_notify(Some(Box::new(
            |error: BleResult<CommandErrorDescription>| match error {
                Ok(error) => println!("command error: {error:?}"),
                Err(e) => tracing::warn!(error = %e, "command error notification"),
            },
        )))
        .await?;
    if let Ok(control) = device.camera_control_v2() {
        control
            .set_state_notify(Some(Box::new(|state: BleResult<ThetaState>| match state {
                Ok(state) => match serde_json::to_string(&state) {
                    Ok(json) => println!("state: {json}"),
                    Err(e) => tracing::warn!(error = %e, "state encode"),
                },
                Err(e) => tracing::warn!(error = %e, "state notification"),
            })))
            .await?;
    }

    println!("Watching {}; press Ctrl-C to stop", device.name());
    tokio::signal::ctrl_c().await?;
    Ok(())
}
