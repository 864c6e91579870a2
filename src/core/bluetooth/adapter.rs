//! The local radio: known devices, discovery sessions and observer fan-out.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::device::{BluetoothDevice, device_key};
use crate::core::bluetooth::discovery_session::{DiscoverySession, SessionState};
use crate::core::bluetooth::error::AdapterError;
use crate::core::bluetooth::observer::{AdapterObserver, ObserverList};
use crate::core::bluetooth::scan_source::{ScanEvent, ScanEventReceiver, ScanSource};
use crate::core::bluetooth::types::{AdapterProperties, DeviceInfo, DiscoveryFilter};

pub(crate) struct AdapterInner {
    properties: RefCell<AdapterProperties>,
    /// Sole strong owner of device records, keyed by canonical address
    devices: RefCell<HashMap<String, Rc<BluetoothDevice>>>,
    /// Active sessions; the platform scans while this is non-empty
    sessions: RefCell<Vec<Rc<SessionState>>>,
    observers: ObserverList<dyn AdapterObserver>,
    scan_source: RefCell<Box<dyn ScanSource>>,
    next_session_id: Cell<u64>,
}

impl Drop for AdapterInner {
    fn drop(&mut self) {
        for session in self.sessions.get_mut().drain(..) {
            session.active.set(false);
        }
    }
}

/// Handle on one local Bluetooth radio.
///
/// Cloning is cheap and yields another handle on the same adapter. All
/// methods must be called from the thread that created it; platform events
/// reach it through [`BluetoothAdapter::handle_scan_event`] or the
/// channel helpers below.
#[derive(Clone)]
pub struct BluetoothAdapter {
    inner: Rc<AdapterInner>,
}

impl BluetoothAdapter {
    /// Creates an adapter for a radio with the given properties, driving
    /// discovery through `scan_source`.
    pub fn new(properties: AdapterProperties, scan_source: impl ScanSource + 'static) -> Self {
        info!(
            "Bluetooth adapter created: present={}, powered={}, address={:?}",
            properties.present, properties.powered, properties.address
        );
        Self {
            inner: Rc::new(AdapterInner {
                properties: RefCell::new(properties),
                devices: RefCell::new(HashMap::new()),
                sessions: RefCell::new(Vec::new()),
                observers: ObserverList::new(),
                scan_source: RefCell::new(Box::new(scan_source)),
                next_session_id: Cell::new(1),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<AdapterInner>) -> Self {
        Self { inner }
    }

    /// True if both handles refer to the same adapter.
    pub fn ptr_eq(&self, other: &BluetoothAdapter) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ---------------------------------------------------------------------
    // Properties

    /// Empty when the radio is absent.
    pub fn address(&self) -> String {
        self.inner.properties.borrow().address.clone()
    }

    pub fn name(&self) -> String {
        self.inner.properties.borrow().name.clone()
    }

    pub fn is_present(&self) -> bool {
        self.inner.properties.borrow().present
    }

    /// True if a usable radio was found (and access to it was granted).
    pub fn has_bluetooth_capability(&self) -> bool {
        self.is_present()
    }

    pub fn is_powered(&self) -> bool {
        let properties = self.inner.properties.borrow();
        properties.present && properties.powered
    }

    pub fn is_discoverable(&self) -> bool {
        let properties = self.inner.properties.borrow();
        properties.present && properties.discoverable
    }

    /// True while at least one discovery session is active.
    pub fn is_discovering(&self) -> bool {
        !self.inner.sessions.borrow().is_empty()
    }

    pub fn discovery_session_count(&self) -> usize {
        self.inner.sessions.borrow().len()
    }

    // ---------------------------------------------------------------------
    // Observers

    /// Registers `observer` without taking ownership. The adapter stops
    /// notifying it once it is removed or dropped.
    pub fn add_observer<O: AdapterObserver + 'static>(&self, observer: &Rc<O>) -> bool {
        let weak: Weak<dyn AdapterObserver> = Rc::downgrade(observer) as Weak<dyn AdapterObserver>;
        self.inner.observers.add(weak)
    }

    /// Safe to call from inside any observer callback, including the
    /// observer's own.
    pub fn remove_observer<O: AdapterObserver + ?Sized>(&self, observer: &O) -> bool {
        self.inner.observers.remove(observer)
    }

    pub fn has_observer<O: AdapterObserver + ?Sized>(&self, observer: &O) -> bool {
        self.inner.observers.contains(observer)
    }

    fn notify(&self, event: impl Fn(&dyn AdapterObserver, &BluetoothAdapter)) {
        self.inner.observers.for_each(|observer| event(observer, self));
    }

    // ---------------------------------------------------------------------
    // Devices

    /// Looks up a device by address, in any accepted address format.
    pub fn device(&self, address: &str) -> Option<Rc<BluetoothDevice>> {
        self.inner.devices.borrow().get(&device_key(address)).cloned()
    }

    /// All known devices, ordered by address.
    pub fn devices(&self) -> Vec<Rc<BluetoothDevice>> {
        let mut devices: Vec<_> = self.inner.devices.borrow().values().cloned().collect();
        devices.sort_by(|a, b| a.address().cmp(b.address()));
        devices
    }

    /// Forgets a device and tells observers. Returns false if it was unknown.
    pub fn remove_device(&self, address: &str) -> bool {
        let removed = self.inner.devices.borrow_mut().remove(&device_key(address));
        match removed {
            Some(device) => {
                info!("Device removed: {}", device.address());
                self.notify(|observer, adapter| observer.device_removed(adapter, &device));
                true
            }
            None => {
                debug!("remove_device: unknown device {}", address);
                false
            }
        }
    }

    // ---------------------------------------------------------------------
    // Discovery sessions

    /// Starts a discovery session, starting the platform scan if this is the
    /// first active session.
    pub fn add_discovery_session(
        &self,
        filter: Option<DiscoveryFilter>,
    ) -> Result<DiscoverySession, AdapterError> {
        if !self.is_present() {
            warn!("add_discovery_session: adapter not present");
            return Err(AdapterError::NotPresent);
        }
        if !self.is_powered() {
            warn!("add_discovery_session: adapter not powered");
            return Err(AdapterError::NotPowered);
        }

        let first_session = self.inner.sessions.borrow().is_empty();
        if first_session {
            let accepted = self.inner.scan_source.borrow_mut().start_scan();
            if !accepted {
                warn!("add_discovery_session: platform rejected scan start");
                return Err(AdapterError::StartRejected);
            }
            info!("Platform scan started");
        }

        let id = self.inner.next_session_id.get();
        self.inner.next_session_id.set(id + 1);
        let state = Rc::new(SessionState {
            id,
            active: Cell::new(true),
            filter,
        });
        self.inner.sessions.borrow_mut().push(state.clone());
        debug!(
            "Discovery session {} added, now {} sessions",
            id,
            self.discovery_session_count()
        );

        if first_session {
            self.notify(|observer, adapter| observer.adapter_discovering_changed(adapter, true));
        }

        Ok(DiscoverySession::new(state, Rc::downgrade(&self.inner)))
    }

    /// Ends `session`, stopping the platform scan if it was the last active
    /// one. Local state is updated immediately even when the platform rejects
    /// the stop request.
    pub fn remove_discovery_session(&self, session: &DiscoverySession) -> Result<(), AdapterError> {
        if !session.is_active() {
            warn!("remove_discovery_session: session {} not active", session.id());
            return Err(AdapterError::SessionInactive);
        }

        let now_empty = {
            let mut sessions = self.inner.sessions.borrow_mut();
            let Some(position) = sessions.iter().position(|s| Rc::ptr_eq(s, &session.state)) else {
                warn!("remove_discovery_session: session {} not owned by this adapter", session.id());
                return Err(AdapterError::SessionInactive);
            };
            sessions.remove(position);
            session.state.active.set(false);
            sessions.is_empty()
        };

        if !now_empty {
            debug!(
                "Discovery session {} removed, now {} sessions",
                session.id(),
                self.discovery_session_count()
            );
            return Ok(());
        }

        info!("Last discovery session removed, stopping platform scan");
        let accepted = self.inner.scan_source.borrow_mut().stop_scan();
        self.notify(|observer, adapter| observer.adapter_discovering_changed(adapter, false));

        if accepted {
            Ok(())
        } else {
            error!("remove_discovery_session: platform rejected scan stop");
            Err(AdapterError::StopRejected)
        }
    }

    /// Marks every active session inactive. Returns how many were affected.
    ///
    /// `stop_platform_scan` is false when the platform scan already died on
    /// its own; otherwise it is stopped if any session was active.
    fn mark_discovery_sessions_inactive(&self, stop_platform_scan: bool) -> usize {
        let invalidated: Vec<_> = self.inner.sessions.borrow_mut().drain(..).collect();
        for session in &invalidated {
            session.active.set(false);
        }
        if invalidated.is_empty() {
            return 0;
        }

        if stop_platform_scan && !self.inner.scan_source.borrow_mut().stop_scan() {
            error!("Platform rejected scan stop after invalidating discovery sessions");
        }
        self.notify(|observer, adapter| observer.adapter_discovering_changed(adapter, false));
        invalidated.len()
    }

    // ---------------------------------------------------------------------
    // Platform events

    /// Records a newly observed device and notifies observers. Repeated
    /// reports for a known address are dropped; the existing record is kept.
    pub fn on_device_found(&self, info: DeviceInfo) {
        let key = device_key(&info.address);
        let device = {
            let mut devices = self.inner.devices.borrow_mut();
            if devices.contains_key(&key) {
                debug!("Redundant device found: {}", key);
                return;
            }
            let device = Rc::new(BluetoothDevice::new(key.clone(), &info));
            devices.insert(key, device.clone());
            device
        };

        info!(
            "Device added: {} ({})",
            device.address(),
            device.name().as_deref().unwrap_or("Unknown")
        );
        self.notify(|observer, adapter| observer.device_added(adapter, &device));
    }

    /// Refreshes a known device, notifying observers if anything changed.
    /// Unknown devices are treated as found.
    pub fn on_device_changed(&self, info: DeviceInfo) {
        let Some(device) = self.device(&info.address) else {
            self.on_device_found(info);
            return;
        };
        if device.apply(&info) {
            debug!("Device changed: {}", device.address());
            self.notify(|observer, adapter| observer.device_changed(adapter, &device));
        }
    }

    /// Handles an asynchronous scan backend failure by invalidating every
    /// active session. No per-session callback is made.
    pub fn on_scan_failed(&self, error_code: i32) {
        let invalidated = self.mark_discovery_sessions_inactive(false);
        warn!(
            "Scan failed with code {}, invalidated {} discovery sessions",
            error_code, invalidated
        );
    }

    pub fn on_present_changed(&self, present: bool) {
        if !self.set_property(|p| &mut p.present, present) {
            return;
        }
        info!("Adapter present changed: {}", present);
        self.notify(|observer, adapter| observer.adapter_present_changed(adapter, present));
        if !present {
            self.mark_discovery_sessions_inactive(true);
        }
    }

    pub fn on_powered_changed(&self, powered: bool) {
        if !self.set_property(|p| &mut p.powered, powered) {
            return;
        }
        info!("Adapter powered changed: {}", powered);
        self.notify(|observer, adapter| observer.adapter_powered_changed(adapter, powered));
        if !powered {
            self.mark_discovery_sessions_inactive(true);
        }
    }

    pub fn on_discoverable_changed(&self, discoverable: bool) {
        if !self.set_property(|p| &mut p.discoverable, discoverable) {
            return;
        }
        info!("Adapter discoverable changed: {}", discoverable);
        self.notify(|observer, adapter| {
            observer.adapter_discoverable_changed(adapter, discoverable)
        });
    }

    /// Returns true if the stored value changed.
    fn set_property(&self, field: impl FnOnce(&mut AdapterProperties) -> &mut bool, value: bool) -> bool {
        let mut properties = self.inner.properties.borrow_mut();
        let slot = field(&mut properties);
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// Dispatches one platform event.
    pub fn handle_scan_event(&self, event: ScanEvent) {
        match event {
            ScanEvent::DeviceFound(info) => self.on_device_found(info),
            ScanEvent::DeviceChanged(info) => self.on_device_changed(info),
            ScanEvent::DeviceLost(address) => {
                self.remove_device(&address);
            }
            ScanEvent::ScanFailed(code) => self.on_scan_failed(code),
            ScanEvent::PresentChanged(present) => self.on_present_changed(present),
            ScanEvent::PoweredChanged(powered) => self.on_powered_changed(powered),
            ScanEvent::DiscoverableChanged(discoverable) => {
                self.on_discoverable_changed(discoverable)
            }
        }
    }

    /// Dispatches every event already queued on `events` without waiting.
    /// Returns the number of events handled.
    pub fn drain_scan_events(&self, events: &mut ScanEventReceiver) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_scan_event(event);
            handled += 1;
        }
        handled
    }

    /// Dispatches events as they arrive until the channel closes or `cancel`
    /// fires. The future is not `Send`; run it on the adapter's thread
    /// (a current-thread runtime or a `LocalSet`).
    pub async fn run_scan_events(&self, events: &mut ScanEventReceiver, cancel: CancellationToken) {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => self.handle_scan_event(event),
                        None => {
                            info!("Scan event channel closed.");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("Scan event loop cancelled.");
                    break;
                }
            }
        }
    }
}

impl fmt::Debug for BluetoothAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BluetoothAdapter")
            .field("properties", &*self.inner.properties.borrow())
            .field("devices", &self.inner.devices.borrow().len())
            .field("sessions", &self.inner.sessions.borrow().len())
            .field("observers", &self.inner.observers.len())
            .finish()
    }
}
