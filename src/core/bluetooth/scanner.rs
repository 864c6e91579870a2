//! Platform scan source backed by the `bluest` crate.
//! Scanning runs on a tokio task; results are marshalled back to the
//! adapter's thread through the scan event channel.

use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use bluest::{Adapter, Device};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use regex::Regex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::scan_config::ScanConfig;
use crate::core::bluetooth::constants::{SCAN_FAILED_INTERNAL_ERROR, UNCATEGORIZED_DEVICE_CLASS};
use crate::core::bluetooth::scan_source::{ScanEvent, ScanEventSender, ScanSource};
use crate::core::bluetooth::types::{AdapterProperties, DeviceInfo};

static MAC_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").expect("MAC pattern is valid")
});

pub struct BluetoothScanner {
    adapter: Adapter,
    runtime: Handle,
    events: ScanEventSender,
    config: ScanConfig,
    cancel_token: CancellationToken,
    scan_task_handle: Option<JoinHandle<()>>,
}

impl BluetoothScanner {
    /// Opens the default system adapter and waits until it is available.
    ///
    /// Must be called from within a tokio runtime; scan tasks are spawned on
    /// that runtime.
    pub async fn open(config: ScanConfig, events: ScanEventSender) -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| anyhow!("No Bluetooth adapter found"))?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");

        Ok(Self {
            adapter,
            runtime: Handle::current(),
            events,
            config,
            cancel_token: CancellationToken::new(),
            scan_task_handle: None,
        })
    }

    /// Properties to build the registry adapter with. The platform API does
    /// not expose the local address or name, so those stay empty.
    pub async fn adapter_properties(&self) -> AdapterProperties {
        let powered = self.adapter.is_available().await.unwrap_or(false);
        AdapterProperties {
            present: true,
            powered,
            ..AdapterProperties::absent()
        }
    }

    fn is_scanning(&self) -> bool {
        self.scan_task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn internal_scan_task(
        adapter: Adapter,
        events: ScanEventSender,
        config: ScanConfig,
        cancel_token: CancellationToken,
    ) {
        if let Err(e) = Self::scan(adapter, &events, &config, &cancel_token).await {
            error!("Bluetooth scan failed: {}", e);
            if events.send(ScanEvent::ScanFailed(SCAN_FAILED_INTERNAL_ERROR)).is_err() {
                debug!("Scan event receiver dropped before failure could be reported");
            }
        }
    }

    async fn scan(
        adapter: Adapter,
        events: &ScanEventSender,
        config: &ScanConfig,
        cancel_token: &CancellationToken,
    ) -> Result<()> {
        // Devices that are already connected never advertise, report them first.
        info!("Checking for connected devices");
        for device in adapter.connected_devices().await? {
            if Self::matches_name(&device, config) {
                Self::forward_device(events, &device, None).await?;
            }
        }

        info!("Starting bluetooth scan");
        let mut scan_stream = adapter.scan(&config.service_uuids).await?;

        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered_device) => {
                            let device = discovered_device.device;
                            let rssi = discovered_device.rssi;
                            debug!("Found device - Device: {:?}, RSSI: {:?}", device, rssi);

                            if !Self::passes_rssi(rssi, config) || !Self::matches_name(&device, config) {
                                continue;
                            }
                            Self::forward_device(events, &device, rssi).await?;
                        }
                        None => {
                            return Err(anyhow!("Bluetooth scan stream has ended"));
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    info!("Bluetooth scan cancelled.");
                    return Ok(());
                }
            }
        }
    }

    async fn forward_device(events: &ScanEventSender, device: &Device, rssi: Option<i16>) -> Result<()> {
        let id = device.id().to_string();
        let address = Self::extract_mac_address(&id).unwrap_or_else(|| id.clone());
        let info = DeviceInfo {
            address,
            name: device.name().ok(),
            bluetooth_class: UNCATEGORIZED_DEVICE_CLASS,
            is_paired: device.is_paired().await.unwrap_or(false),
            is_connected: device.is_connected().await,
            rssi,
        };
        debug!("Forwarding device {:?}", info);

        events
            .send(ScanEvent::DeviceFound(info))
            .map_err(|_| anyhow!("Scan event receiver dropped"))
    }

    /// Devices without an RSSI reading are kept; the platform omits it for
    /// cached results.
    fn passes_rssi(rssi: Option<i16>, config: &ScanConfig) -> bool {
        match (rssi, config.min_rssi) {
            (Some(rssi), Some(min_rssi)) => rssi >= min_rssi,
            _ => true,
        }
    }

    fn matches_name(device: &Device, config: &ScanConfig) -> bool {
        let Some(fragment) = config.name_filter.as_deref() else {
            return true;
        };
        device
            .name()
            .ok()
            .is_some_and(|name| name.contains(fragment))
    }

    fn extract_mac_address(device_id_str: &str) -> Option<String> {
        MAC_ADDRESS
            .find_iter(device_id_str)
            .last()
            .map(|m| m.as_str().to_uppercase())
    }
}

impl ScanSource for BluetoothScanner {
    fn start_scan(&mut self) -> bool {
        if self.is_scanning() {
            warn!("start_scan: scan task already running");
            return true;
        }

        self.cancel_token = CancellationToken::new();
        let handle = self.runtime.spawn(Self::internal_scan_task(
            self.adapter.clone(),
            self.events.clone(),
            self.config.clone(),
            self.cancel_token.clone(),
        ));
        self.scan_task_handle = Some(handle);
        info!("Device scan task started.");
        true
    }

    fn stop_scan(&mut self) -> bool {
        info!("Stopping Bluetooth scan.");
        self.cancel_token.cancel();
        if self.scan_task_handle.take().is_none() {
            info!("No active scan task handle found.");
        }
        true
    }
}

impl Drop for BluetoothScanner {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_last_mac_address_from_platform_id() {
        assert_eq!(
            BluetoothScanner::extract_mac_address("/org/bluez/hci0/dev_aa:bb:cc:dd:ee:ff").as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );
        assert_eq!(
            BluetoothScanner::extract_mac_address("hci0 00-11-22-33-44-55 / 66:77:88:99:aa:bb").as_deref(),
            Some("66:77:88:99:AA:BB")
        );
        assert_eq!(BluetoothScanner::extract_mac_address("7F3A-UUID-LIKE-ID"), None);
    }

    #[test]
    fn rssi_threshold_keeps_unknown_readings() {
        let config = ScanConfig {
            min_rssi: Some(-70),
            ..ScanConfig::default()
        };
        assert!(BluetoothScanner::passes_rssi(Some(-70), &config));
        assert!(!BluetoothScanner::passes_rssi(Some(-71), &config));
        assert!(BluetoothScanner::passes_rssi(None, &config));

        let unfiltered = ScanConfig {
            min_rssi: None,
            ..ScanConfig::default()
        };
        assert!(BluetoothScanner::passes_rssi(Some(-120), &unfiltered));
    }
}
