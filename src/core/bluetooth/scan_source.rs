//! The platform side of discovery: the scan source the adapter drives, and
//! the events it reports back.

use tokio::sync::mpsc;

use crate::core::bluetooth::types::DeviceInfo;

/// Platform collaborator that owns the physical scan.
///
/// Start/stop are fire-and-forget requests; the return value only says
/// whether the platform accepted the request. Results come back later as
/// [`ScanEvent`]s, which the platform must deliver on the adapter's thread
/// (see [`scan_event_channel`]).
pub trait ScanSource {
    fn start_scan(&mut self) -> bool;

    fn stop_scan(&mut self) -> bool;
}

/// Events a scan source reports to the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A remote device was observed. Repeats for the same address are normal.
    DeviceFound(DeviceInfo),
    /// Fresh state for a device that may already be known.
    DeviceChanged(DeviceInfo),
    /// The platform no longer knows the device with this address.
    DeviceLost(String),
    /// The scan backend failed with a platform error code.
    ScanFailed(i32),
    PresentChanged(bool),
    PoweredChanged(bool),
    DiscoverableChanged(bool),
}

pub type ScanEventSender = mpsc::UnboundedSender<ScanEvent>;
pub type ScanEventReceiver = mpsc::UnboundedReceiver<ScanEvent>;

/// Creates the channel a platform scan source uses to marshal its events
/// onto the adapter's thread. The sender side is `Send`; the receiver is
/// drained by the thread that owns the adapter.
pub fn scan_event_channel() -> (ScanEventSender, ScanEventReceiver) {
    mpsc::unbounded_channel()
}
