//! Errors surfaced by the adapter's discovery session API.

use thiserror::Error;

/// Failures returned synchronously from session start/stop.
///
/// Asynchronous scan failures never show up here; they only invalidate the
/// sessions that were active at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("Bluetooth adapter not present")]
    NotPresent,

    #[error("Bluetooth adapter is not powered")]
    NotPowered,

    #[error("Platform rejected the scan start request")]
    StartRejected,

    #[error("Platform rejected the scan stop request")]
    StopRejected,

    #[error("Discovery session is not active")]
    SessionInactive,
}
