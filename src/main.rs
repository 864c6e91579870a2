//! Command line scanner: discovers nearby devices for the configured
//! duration and logs what the registry sees.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use log::{LevelFilter, info, warn};
use tokio_util::sync::CancellationToken;

use touchlink::config::AppConfig;
use touchlink::core::bluetooth::{BluetoothAdapter, BluetoothScanner, scan_event_channel};
use touchlink::logging::{self, LoggingObserver};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    if logging::init(LevelFilter::Info).is_err() {
        warn!("Logger already initialized");
    }

    let config_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_dir);
    let config = AppConfig::load_config(&config_dir).await?;

    let (events_tx, mut events_rx) = scan_event_channel();
    let scanner = BluetoothScanner::open(config.scan.clone(), events_tx).await?;
    let properties = scanner.adapter_properties().await;
    let adapter = BluetoothAdapter::new(properties, scanner);
    let observer = Rc::new(LoggingObserver);
    adapter.add_observer(&observer);

    let session = adapter.add_discovery_session(None)?;

    let cancel = CancellationToken::new();
    let scan_duration = Duration::from_secs(config.scan.scan_duration_secs);
    let timer = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                _ = tokio::time::sleep(scan_duration) => {
                    info!("Scan duration of {:?} elapsed.", scan_duration);
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping scan.");
                }
            }
            cancel.cancel();
        }
    });

    adapter.run_scan_events(&mut events_rx, cancel).await;
    timer.abort();

    if !session.is_active() {
        warn!("Discovery session was invalidated before the scan finished");
    }
    session.stop()?;

    let devices = adapter.devices();
    info!("Discovered {} devices", devices.len());
    for device in devices {
        info!(
            "  {} {} RSSI: {:?}",
            device.address(),
            device.name().as_deref().unwrap_or("Unknown"),
            device.inquiry_rssi()
        );
    }
    Ok(())
}
