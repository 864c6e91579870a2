//! Constants used by the Bluetooth registry and the platform scanner.

/// Class-of-device reported for devices that do not advertise one
/// (major class "uncategorized").
pub const UNCATEGORIZED_DEVICE_CLASS: u32 = 0x1F00;

/// Default minimum RSSI (dBm) for a scan result to be forwarded.
pub const MIN_RSSI_THRESHOLD: i16 = -80;

/// Default scan duration in seconds for the command line scanner.
pub const DEFAULT_SCAN_DURATION_SECS: u64 = 10;

/// Error code forwarded with `ScanEvent::ScanFailed` when the platform
/// stream errors out without a more specific code.
pub const SCAN_FAILED_INTERNAL_ERROR: i32 = 3;
