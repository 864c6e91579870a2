//! touchlink library
//! A Bluetooth device registry with discovery sessions and observer fan-out,
//! and the long-press drag selection gesture for touch input.

// Module declarations
pub mod config;
pub mod core;
pub mod logging;

pub use crate::config::AppConfig;
pub use crate::core::bluetooth::{
    AdapterError, AdapterObserver, BluetoothAdapter, BluetoothDevice, DiscoverySession, ScanEvent, ScanSource,
};
pub use crate::core::touch_selection::{
    LongPressDragSelector, LongPressDragSelectorClient, MotionAction, MotionEvent, TapSlop, TouchTracker,
};
