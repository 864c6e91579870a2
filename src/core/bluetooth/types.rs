//! Defines shared data structures for the Bluetooth module.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A remote device as reported by the platform scan source.
///
/// This is the opaque "device handle" the platform hands to the adapter; the
/// adapter turns it into a [`BluetoothDevice`](super::BluetoothDevice) record
/// the first time the address is seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// The address of the device (MAC address on most platforms)
    pub address: String,
    /// The name of the device, if available
    pub name: Option<String>,
    /// Class-of-device bitmask
    pub bluetooth_class: u32,
    /// Whether the device is paired
    pub is_paired: bool,
    /// Whether the device is connected
    pub is_connected: bool,
    /// The signal strength (RSSI) of the last advertisement, if known
    pub rssi: Option<i16>,
}

impl DeviceInfo {
    /// Creates a new DeviceInfo with only an address set
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

/// Static properties of the local radio, as known when the adapter is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterProperties {
    pub address: String,
    pub name: String,
    pub present: bool,
    pub powered: bool,
    pub discoverable: bool,
}

impl AdapterProperties {
    /// Properties of a radio that is present and powered.
    pub fn powered(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            present: true,
            powered: true,
            discoverable: false,
        }
    }

    /// Properties reported when there is no radio, or no permission to use it.
    pub fn absent() -> Self {
        Self {
            address: String::new(),
            name: String::new(),
            present: false,
            powered: false,
            discoverable: false,
        }
    }
}

impl Default for AdapterProperties {
    fn default() -> Self {
        Self::absent()
    }
}

/// Transport a discovery session is interested in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    Classic,
    Le,
    #[default]
    Dual,
}

/// Optional narrowing requested by a discovery session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryFilter {
    pub transport: Transport,
    pub min_rssi: Option<i16>,
    pub service_uuids: Vec<Uuid>,
}
