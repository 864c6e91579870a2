//! Bluetooth device representation and related functionality

use std::cell::{Cell, RefCell};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::bluetooth::types::DeviceInfo;

static ADDRESS_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?i:[0-9A-F]{2}(?::[0-9A-F]{2}){5}|[0-9A-F]{2}(?:-[0-9A-F]{2}){5}|[0-9A-F]{12})$",
    )
    .expect("address pattern is valid")
});

/// Converts an address into the canonical `XX:XX:XX:XX:XX:XX` upper-case form.
///
/// Accepts `:` or `-` separated addresses (one separator kind throughout) and
/// the bare 12-digit form, in any case. Returns `None` for anything else.
pub fn canonicalize_address(address: &str) -> Option<String> {
    if !ADDRESS_FORMAT.is_match(address) {
        return None;
    }

    let digits: Vec<char> = address
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let canonical = digits
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":");
    Some(canonical)
}

/// Key under which a reported address is stored in the adapter's device map.
pub(crate) fn device_key(address: &str) -> String {
    canonicalize_address(address).unwrap_or_else(|| address.to_string())
}

/// A discovered remote device, owned by the adapter.
///
/// The address never changes once the record exists. The remaining state is
/// refreshed in place by platform change events so observers holding the
/// record keep seeing the same identity.
#[derive(Debug)]
pub struct BluetoothDevice {
    address: String,
    name: RefCell<Option<String>>,
    bluetooth_class: Cell<u32>,
    paired: Cell<bool>,
    connected: Cell<bool>,
    rssi: Cell<Option<i16>>,
}

impl BluetoothDevice {
    pub(crate) fn new(address: String, info: &DeviceInfo) -> Self {
        Self {
            address,
            name: RefCell::new(info.name.clone()),
            bluetooth_class: Cell::new(info.bluetooth_class),
            paired: Cell::new(info.is_paired),
            connected: Cell::new(info.is_connected),
            rssi: Cell::new(info.rssi),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn name(&self) -> Option<String> {
        self.name.borrow().clone()
    }

    pub fn bluetooth_class(&self) -> u32 {
        self.bluetooth_class.get()
    }

    pub fn is_paired(&self) -> bool {
        self.paired.get()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// RSSI of the most recent advertisement, if the platform reported one.
    pub fn inquiry_rssi(&self) -> Option<i16> {
        self.rssi.get()
    }

    /// Returns the current state as a [`DeviceInfo`] snapshot.
    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            address: self.address.clone(),
            name: self.name(),
            bluetooth_class: self.bluetooth_class(),
            is_paired: self.is_paired(),
            is_connected: self.is_connected(),
            rssi: self.inquiry_rssi(),
        }
    }

    /// Copies the mutable fields of `info` into this record.
    /// Returns true if anything changed.
    pub(crate) fn apply(&self, info: &DeviceInfo) -> bool {
        let mut changed = false;

        if *self.name.borrow() != info.name {
            *self.name.borrow_mut() = info.name.clone();
            changed = true;
        }
        changed |= self.bluetooth_class.replace(info.bluetooth_class) != info.bluetooth_class;
        changed |= self.paired.replace(info.is_paired) != info.is_paired;
        changed |= self.connected.replace(info.is_connected) != info.is_connected;
        changed |= self.rssi.replace(info.rssi) != info.rssi;

        changed
    }
}
