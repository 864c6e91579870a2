//! Logging setup and an adapter observer that logs registry events.

use std::io::Write;

use chrono::Local;
use log::{LevelFilter, SetLoggerError, info};

use crate::core::bluetooth::{AdapterObserver, BluetoothAdapter, BluetoothDevice};

/// Installs the stderr logger. `RUST_LOG` overrides `level` per module.
///
/// Fails if a logger is already installed; callers may ignore that.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
}

/// Logs every adapter and device change at info level.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl LoggingObserver {
    fn describe(device: &BluetoothDevice) -> String {
        let name = device.name().unwrap_or_else(|| "Unknown".to_string());
        match device.inquiry_rssi() {
            Some(rssi) => format!("{} ({}, RSSI {} dBm)", device.address(), name, rssi),
            None => format!("{} ({})", device.address(), name),
        }
    }
}

impl AdapterObserver for LoggingObserver {
    fn adapter_present_changed(&self, adapter: &BluetoothAdapter, present: bool) {
        info!("Adapter {} present: {}", adapter.address(), present);
    }

    fn adapter_powered_changed(&self, adapter: &BluetoothAdapter, powered: bool) {
        info!("Adapter {} powered: {}", adapter.address(), powered);
    }

    fn adapter_discoverable_changed(&self, adapter: &BluetoothAdapter, discoverable: bool) {
        info!("Adapter {} discoverable: {}", adapter.address(), discoverable);
    }

    fn adapter_discovering_changed(&self, adapter: &BluetoothAdapter, discovering: bool) {
        info!("Adapter {} discovering: {}", adapter.address(), discovering);
    }

    fn device_added(&self, _adapter: &BluetoothAdapter, device: &BluetoothDevice) {
        info!("Found device {}", Self::describe(device));
    }

    fn device_changed(&self, _adapter: &BluetoothAdapter, device: &BluetoothDevice) {
        info!("Device changed {}", Self::describe(device));
    }

    fn device_removed(&self, _adapter: &BluetoothAdapter, device: &BluetoothDevice) {
        info!("Device removed {}", Self::describe(device));
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::core::bluetooth::test::{discover_new_device, init_with_fake_adapter};

    #[test]
    fn second_init_fails_without_panicking() {
        let _ = init(LevelFilter::Debug);
        assert!(init(LevelFilter::Debug).is_err());
    }

    #[test]
    fn logging_observer_handles_every_event() {
        let (adapter, _source) = init_with_fake_adapter();
        let observer = Rc::new(LoggingObserver);
        assert!(adapter.add_observer(&observer));

        let session = adapter.add_discovery_session(None).unwrap();
        discover_new_device(&adapter);
        adapter.on_discoverable_changed(true);
        session.stop().unwrap();
        assert!(adapter.remove_device("A1:B2:C3:DD:DD:DD"));
        adapter.on_powered_changed(false);

        assert!(adapter.remove_observer(&*observer));
    }

    #[test]
    fn describes_device_with_and_without_rssi() {
        let (adapter, _source) = init_with_fake_adapter();
        discover_new_device(&adapter);
        let device = adapter.device("a1:b2:c3:dd:dd:dd").unwrap();
        assert_eq!(
            LoggingObserver::describe(&device),
            "A1:B2:C3:DD:DD:DD (FakeBluetoothDevice)"
        );
    }
}
