//! Bluetooth adapter and device registry.
//! This module tracks the local radio's state, the remote devices it has
//! seen, and the discovery sessions keeping it scanning. Changes fan out to
//! registered observers.

mod adapter;
mod constants;
mod device;
mod discovery_session;
mod error;
mod observer;
mod scan_source;
#[cfg(feature = "bluest")]
mod scanner;
mod types;

#[cfg(test)]
pub(crate) mod test;

// Re-export types that should be publicly accessible
pub use adapter::BluetoothAdapter;
pub use constants::*; // Re-export all constants
pub use device::{BluetoothDevice, canonicalize_address};
pub use discovery_session::DiscoverySession;
pub use error::AdapterError;
pub use observer::{AdapterObserver, ObserverList};
pub use scan_source::{ScanEvent, ScanEventReceiver, ScanEventSender, ScanSource, scan_event_channel};
#[cfg(feature = "bluest")]
pub use scanner::BluetoothScanner;
pub use types::{AdapterProperties, DeviceInfo, DiscoveryFilter, Transport};
