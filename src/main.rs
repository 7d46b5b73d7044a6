use clap::Parser;
use dynamic_matter_bridge::bridge::{BridgeHandle, BridgeRuntime, BridgeSettings, MemoryDelegate};
use dynamic_matter_bridge::config::{self, Config};
use dynamic_matter_bridge::device::{Device, DeviceKind, DeviceKindTag, presets};
use dynamic_matter_bridge::error::Result;
use dynamic_matter_bridge::matter::InMemoryModel;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "dynamic-matter-bridge", about = "Dynamic endpoint Matter bridge")]
struct Args {
    /// Device definitions file (JSON array)
    #[arg(long, env = "BRIDGE_DEVICES_FILE")]
    devices: Option<PathBuf>,

    /// Register a set of preset demo devices
    #[arg(long)]
    demo: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    config::load_dotenv();
    init_logger();
    let args = Args::parse();
    info!("Starting Dynamic Matter Bridge");

    let mut config = Config::from_env();
    if let Some(devices) = args.devices {
        config.devices_file = devices;
    }
    info!("Configuration loaded:");
    info!("  Aggregator endpoint: {}", config.aggregator_endpoint);
    info!("  Fixed endpoints: {:?}", config.fixed_endpoints);
    info!("  External write size: {}", config.external_write_size);
    info!("  Devices file: {}", config.devices_file.display());

    if let Err(e) = run(config, args.demo).await {
        error!("Bridge error: {}", e);
        std::process::exit(1);
    }

    info!("Dynamic Matter Bridge stopped");
}

async fn run(config: Config, demo: bool) -> Result<()> {
    let runtime: BridgeRuntime = BridgeRuntime::start(
        Box::new(InMemoryModel::new(config.fixed_endpoints.clone())),
        Arc::new(MemoryDelegate::new()),
        BridgeSettings::from(&config),
    )?;
    let handle = runtime.handle();

    for request in config::load_devices(&config.devices_file)? {
        let name = request.name.clone();
        match handle.add_device_confirmed(request).await {
            Ok(ep) => info!("Registered '{}' on endpoint {}", name, ep),
            Err(e) => warn!("Could not register '{}': {}", name, e),
        }
    }

    if demo {
        register_demo_devices(&handle).await?;
    }

    info!("Bridge is running, press Ctrl+C to exit");
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    runtime.shutdown();
    Ok(())
}

async fn register_demo_devices(handle: &BridgeHandle) -> Result<()> {
    handle.add_device_confirmed(presets::light("Demo Light")).await?;
    handle.add_device_confirmed(presets::door_lock("Demo Lock")).await?;

    // Composed device: a battery-powered parent with two sensor children
    let parent = handle
        .add_device_confirmed(presets::composed_device("Demo Sensor Pack"))
        .await?;
    let temperature = handle
        .add_device_confirmed(presets::composed_temperature_sensor("Demo Temperature").with_parent(parent))
        .await?;
    let humidity = handle
        .add_device_confirmed(presets::composed_humidity_sensor("Demo Humidity").with_parent(parent))
        .await?;

    let battery = Device::new("Demo Battery", "Generic", DeviceKind::from_tag(DeviceKindTag::PowerSource));
    handle.install_power_source(battery, parent)?;
    handle.set_power_source_endpoints(vec![parent, temperature, humidity])?;

    handle.sync().await?;
    info!("Registered demo devices (composed parent on endpoint {})", parent);
    Ok(())
}
