//! Core functionality for touchlink
//! This module contains the Bluetooth device registry and the touch selection gestures.

pub mod bluetooth;
pub mod touch_selection;

// Re-export commonly used types
pub use bluetooth::{BluetoothAdapter, BluetoothDevice, DiscoverySession};
pub use touch_selection::{LongPressDragSelector, LongPressDragSelectorClient};
