use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::bluetooth::{DEFAULT_SCAN_DURATION_SECS, MIN_RSSI_THRESHOLD};

/// Settings for the platform scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Minimum RSSI (dBm) for a scan result to be reported. `None` reports everything.
    pub min_rssi: Option<i16>,
    /// Only report devices whose name contains this fragment
    pub name_filter: Option<String>,
    /// Service UUIDs to scan for. Empty scans for all devices.
    pub service_uuids: Vec<Uuid>,
    /// How long the command line scanner keeps discovering
    pub scan_duration_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            min_rssi: Some(MIN_RSSI_THRESHOLD),
            name_filter: None,
            service_uuids: Vec::new(),
            scan_duration_secs: DEFAULT_SCAN_DURATION_SECS,
        }
    }
}
