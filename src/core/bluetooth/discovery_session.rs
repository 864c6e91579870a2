//! A caller's handle on an ongoing discovery request.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::warn;

use crate::core::bluetooth::adapter::{AdapterInner, BluetoothAdapter};
use crate::core::bluetooth::error::AdapterError;
use crate::core::bluetooth::types::DiscoveryFilter;

/// State shared between a session handle and the adapter tracking it.
/// Only the adapter ever clears `active`.
pub(crate) struct SessionState {
    pub(crate) id: u64,
    pub(crate) active: Cell<bool>,
    pub(crate) filter: Option<DiscoveryFilter>,
}

/// Keeps the radio scanning while active.
///
/// Dropping an active session stops it. Stopping or dropping one session
/// never affects the others.
pub struct DiscoverySession {
    pub(crate) state: Rc<SessionState>,
    adapter: Weak<AdapterInner>,
}

impl DiscoverySession {
    pub(crate) fn new(state: Rc<SessionState>, adapter: Weak<AdapterInner>) -> Self {
        Self { state, adapter }
    }

    pub fn id(&self) -> u64 {
        self.state.id
    }

    /// False once stopped, or once the adapter invalidated it after a scan
    /// failure or power loss.
    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    pub fn filter(&self) -> Option<&DiscoveryFilter> {
        self.state.filter.as_ref()
    }

    /// Asks the adapter to end this session. Stopping an inactive session is
    /// a no-op.
    pub fn stop(&self) -> Result<(), AdapterError> {
        if !self.is_active() {
            return Ok(());
        }
        match self.adapter.upgrade() {
            Some(inner) => BluetoothAdapter::from_inner(inner).remove_discovery_session(self),
            None => {
                self.state.active.set(false);
                Ok(())
            }
        }
    }
}

impl Drop for DiscoverySession {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop discovery session {} on drop: {}", self.state.id, e);
        }
    }
}

impl fmt::Debug for DiscoverySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoverySession")
            .field("id", &self.state.id)
            .field("active", &self.is_active())
            .field("filter", &self.state.filter)
            .finish()
    }
}
