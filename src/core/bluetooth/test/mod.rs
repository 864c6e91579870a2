//! Test fixtures for the Bluetooth registry: a fake platform scan source, a
//! counting observer, and helpers that build adapters and discover devices.

mod fake_scan_source;

pub(crate) use fake_scan_source::FakeScanSource;
pub(crate) use test_adapter_observer::TestAdapterObserver;

use crate::core::bluetooth::adapter::BluetoothAdapter;
use crate::core::bluetooth::constants::UNCATEGORIZED_DEVICE_CLASS;
use crate::core::bluetooth::types::{AdapterProperties, DeviceInfo};

/// Adapter backed by a present, powered fake radio.
pub(crate) fn init_with_fake_adapter() -> (BluetoothAdapter, FakeScanSource) {
    let source = FakeScanSource::default();
    let adapter = BluetoothAdapter::new(
        AdapterProperties::powered("A1:B2:C3:D4:E5:F6", "FakeBluetoothAdapter"),
        source.clone(),
    );
    (adapter, source)
}

/// Adapter built as if Bluetooth permission was missing.
pub(crate) fn init_without_permission() -> (BluetoothAdapter, FakeScanSource) {
    let source = FakeScanSource::default();
    let adapter = BluetoothAdapter::new(AdapterProperties::absent(), source.clone());
    (adapter, source)
}

pub(crate) fn fake_device_info() -> DeviceInfo {
    DeviceInfo {
        name: Some("FakeBluetoothDevice".to_string()),
        bluetooth_class: UNCATEGORIZED_DEVICE_CLASS,
        ..DeviceInfo::new("A1:B2:C3:DD:DD:DD")
    }
}

/// Reports the fake device as found, the way a scan result would.
pub(crate) fn discover_new_device(adapter: &BluetoothAdapter) {
    adapter.on_device_found(fake_device_info());
}
