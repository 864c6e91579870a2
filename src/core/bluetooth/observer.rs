//! Observer registration and notification fan-out for the adapter.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::core::bluetooth::adapter::BluetoothAdapter;
use crate::core::bluetooth::device::BluetoothDevice;

/// Receives adapter and device change notifications.
///
/// Every method has a no-op default so observers only implement what they
/// care about. Callbacks run synchronously on the adapter's thread and may
/// call back into the adapter, including removing themselves or other
/// observers.
pub trait AdapterObserver {
    fn adapter_present_changed(&self, _adapter: &BluetoothAdapter, _present: bool) {}

    fn adapter_powered_changed(&self, _adapter: &BluetoothAdapter, _powered: bool) {}

    fn adapter_discoverable_changed(&self, _adapter: &BluetoothAdapter, _discoverable: bool) {}

    fn adapter_discovering_changed(&self, _adapter: &BluetoothAdapter, _discovering: bool) {}

    fn device_added(&self, _adapter: &BluetoothAdapter, _device: &BluetoothDevice) {}

    fn device_changed(&self, _adapter: &BluetoothAdapter, _device: &BluetoothDevice) {}

    /// The device is no longer in the adapter's map. It stays readable for the
    /// duration of the callback.
    fn device_removed(&self, _adapter: &BluetoothAdapter, _device: &BluetoothDevice) {}
}

struct ObserverEntry<T: ?Sized> {
    observer: Weak<T>,
    /// Cleared on removal so in-flight dispatch snapshots skip the entry.
    registered: Rc<Cell<bool>>,
}

struct Slots<T: ?Sized> {
    entries: Vec<Option<ObserverEntry<T>>>,
    index: HashMap<*const (), usize>,
    vacant: usize,
    /// Slot count at which `add` next sweeps out dropped observers.
    prune_at: usize,
}

const MIN_PRUNE_AT: usize = 8;

/// Registration-ordered list of non-owning observer references.
///
/// Notification iterates over a snapshot taken when dispatch starts, and
/// checks each entry's registration flag right before calling it. An observer
/// removed mid-dispatch is therefore never called again, and one added
/// mid-dispatch is first called for the next event. Observers dropped without
/// being removed are swept out on dispatch, and by `add` once the list has
/// doubled since the last sweep.
pub struct ObserverList<T: ?Sized> {
    slots: RefCell<Slots<T>>,
}

impl<T: ?Sized> ObserverList<T> {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Slots {
                entries: Vec::new(),
                index: HashMap::new(),
                vacant: 0,
                prune_at: MIN_PRUNE_AT,
            }),
        }
    }

    /// Registers `observer`. Returns false if it is already registered or
    /// already dropped.
    pub fn add(&self, observer: Weak<T>) -> bool {
        if observer.strong_count() == 0 {
            return false;
        }

        let key = Weak::as_ptr(&observer) as *const ();
        let mut slots = self.slots.borrow_mut();
        // A registered entry's weak reference keeps its allocation from being
        // reused, so a matching key is always the same observer.
        if slots.index.contains_key(&key) {
            return false;
        }

        if slots.entries.len() >= slots.prune_at {
            slots.prune_dropped();
            slots.prune_at = MIN_PRUNE_AT.max(slots.entries.len() * 2);
        }

        let slot = slots.entries.len();
        slots.entries.push(Some(ObserverEntry {
            observer,
            registered: Rc::new(Cell::new(true)),
        }));
        slots.index.insert(key, slot);
        true
    }

    /// Unregisters the observer living at `observer`'s address.
    /// Returns false if it was not registered.
    pub fn remove<U: ?Sized>(&self, observer: &U) -> bool {
        let key = observer as *const U as *const ();
        let mut slots = self.slots.borrow_mut();

        match slots.index.get(&key).copied() {
            Some(slot) => {
                slots.vacate(slot);
                slots.compact_if_sparse();
                true
            }
            None => false,
        }
    }

    /// True if the observer at `observer`'s address is registered and alive.
    pub fn contains<U: ?Sized>(&self, observer: &U) -> bool {
        let key = observer as *const U as *const ();
        let slots = self.slots.borrow();
        slots
            .index
            .get(&key)
            .and_then(|&slot| slots.entries[slot].as_ref())
            .is_some_and(|entry| entry.observer.strong_count() > 0)
    }

    /// Number of registered observers that are still alive.
    pub fn len(&self) -> usize {
        self.slots
            .borrow()
            .entries
            .iter()
            .flatten()
            .filter(|entry| entry.observer.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `notify` for each registered observer in registration order.
    pub fn for_each(&self, mut notify: impl FnMut(&T)) {
        let snapshot: Vec<(Weak<T>, Rc<Cell<bool>>)> = {
            let mut slots = self.slots.borrow_mut();
            slots.prune_dropped();
            slots
                .entries
                .iter()
                .flatten()
                .map(|entry| (entry.observer.clone(), entry.registered.clone()))
                .collect()
        };

        for (observer, registered) in snapshot {
            if !registered.get() {
                continue;
            }
            if let Some(observer) = observer.upgrade() {
                notify(&observer);
            }
        }
    }
}

impl<T: ?Sized> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Slots<T> {
    fn vacate(&mut self, slot: usize) {
        if let Some(entry) = self.entries[slot].take() {
            entry.registered.set(false);
            self.index.remove(&(Weak::as_ptr(&entry.observer) as *const ()));
            self.vacant += 1;
        }
    }

    /// Vacates the slots of observers that were dropped without being removed.
    fn prune_dropped(&mut self) {
        let dropped: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                entry
                    .as_ref()
                    .is_some_and(|entry| entry.observer.strong_count() == 0)
            })
            .map(|(slot, _)| slot)
            .collect();
        if dropped.is_empty() {
            return;
        }
        for slot in dropped {
            self.vacate(slot);
        }
        self.compact();
    }

    fn compact_if_sparse(&mut self) {
        if self.vacant < 8 || self.vacant * 2 < self.entries.len() {
            return;
        }
        self.compact();
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        self.index.clear();
        for (slot, entry) in self.entries.iter().enumerate() {
            if let Some(entry) = entry {
                self.index
                    .insert(Weak::as_ptr(&entry.observer) as *const (), slot);
            }
        }
        self.vacant = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Listener {
        fn hear(&self, list: &ObserverList<dyn Listener>, event: u32);
    }

    #[derive(Default)]
    struct Recorder {
        heard: RefCell<Vec<u32>>,
        remove_on_hear: RefCell<Vec<Rc<Recorder>>>,
        add_on_hear: RefCell<Option<Rc<Recorder>>>,
        remove_self: Cell<bool>,
    }

    impl Listener for Recorder {
        fn hear(&self, list: &ObserverList<dyn Listener>, event: u32) {
            self.heard.borrow_mut().push(event);
            for other in self.remove_on_hear.borrow().iter() {
                list.remove(&**other);
            }
            if let Some(newcomer) = self.add_on_hear.borrow_mut().take() {
                register(list, &newcomer);
            }
            if self.remove_self.get() {
                list.remove(self);
            }
        }
    }

    fn register(list: &ObserverList<dyn Listener>, recorder: &Rc<Recorder>) -> bool {
        let weak: Weak<dyn Listener> = Rc::downgrade(recorder) as Weak<dyn Listener>;
        list.add(weak)
    }

    fn dispatch(list: &ObserverList<dyn Listener>, event: u32) {
        list.for_each(|listener| listener.hear(list, event));
    }

    #[test]
    fn notifies_in_registration_order_and_rejects_duplicates() {
        let list: ObserverList<dyn Listener> = ObserverList::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        struct Tagged(u32, Rc<RefCell<Vec<u32>>>);
        impl Listener for Tagged {
            fn hear(&self, _list: &ObserverList<dyn Listener>, _event: u32) {
                self.1.borrow_mut().push(self.0);
            }
        }

        let observers: Vec<Rc<Tagged>> = (0..4).map(|i| Rc::new(Tagged(i, order.clone()))).collect();
        for observer in &observers {
            assert!(list.add(Rc::downgrade(observer) as Weak<dyn Listener>));
        }
        assert!(!list.add(Rc::downgrade(&observers[2]) as Weak<dyn Listener>));

        dispatch(&list, 1);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn removal_of_later_observer_during_dispatch_skips_it() {
        let list: ObserverList<dyn Listener> = ObserverList::new();
        let first = Rc::new(Recorder::default());
        let second = Rc::new(Recorder::default());
        first.remove_on_hear.borrow_mut().push(second.clone());
        register(&list, &first);
        register(&list, &second);

        dispatch(&list, 1);
        dispatch(&list, 2);

        assert_eq!(*first.heard.borrow(), vec![1, 2]);
        assert!(second.heard.borrow().is_empty());
        assert!(!list.contains(&*second));
    }

    #[test]
    fn self_removal_during_dispatch() {
        let list: ObserverList<dyn Listener> = ObserverList::new();
        let quitter = Rc::new(Recorder::default());
        quitter.remove_self.set(true);
        let stayer = Rc::new(Recorder::default());
        register(&list, &quitter);
        register(&list, &stayer);

        dispatch(&list, 1);
        dispatch(&list, 2);

        assert_eq!(*quitter.heard.borrow(), vec![1]);
        assert_eq!(*stayer.heard.borrow(), vec![1, 2]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn dropped_observers_are_skipped() {
        let list: ObserverList<dyn Listener> = ObserverList::new();
        let kept = Rc::new(Recorder::default());
        {
            let dropped = Rc::new(Recorder::default());
            register(&list, &dropped);
        }
        register(&list, &kept);

        dispatch(&list, 7);

        assert_eq!(*kept.heard.borrow(), vec![7]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn observer_added_during_dispatch_hears_only_later_events() {
        let list: ObserverList<dyn Listener> = ObserverList::new();
        let host = Rc::new(Recorder::default());
        let newcomer = Rc::new(Recorder::default());
        *host.add_on_hear.borrow_mut() = Some(newcomer.clone());
        register(&list, &host);

        dispatch(&list, 1);
        assert!(list.contains(&*newcomer));
        assert!(newcomer.heard.borrow().is_empty());

        dispatch(&list, 2);
        assert_eq!(*host.heard.borrow(), vec![1, 2]);
        assert_eq!(*newcomer.heard.borrow(), vec![2]);
    }

    #[test]
    fn dropped_observers_are_swept_from_the_list() {
        let list: ObserverList<dyn Listener> = ObserverList::new();
        for _ in 0..1000 {
            let short_lived = Rc::new(Recorder::default());
            register(&list, &short_lived);
        }
        assert!(list.slots.borrow().entries.len() <= 2 * MIN_PRUNE_AT);
        assert!(list.is_empty());

        let kept = Rc::new(Recorder::default());
        register(&list, &kept);
        dispatch(&list, 4);
        assert_eq!(list.slots.borrow().entries.len(), 1);
        assert_eq!(list.slots.borrow().index.len(), 1);
        assert_eq!(*kept.heard.borrow(), vec![4]);
    }

    #[test]
    fn dropped_observer_cannot_be_registered() {
        let list: ObserverList<dyn Listener> = ObserverList::new();
        let observer = Rc::new(Recorder::default());
        assert!(register(&list, &observer));
        let weak = Rc::downgrade(&observer) as Weak<dyn Listener>;
        drop(observer);

        assert!(!list.add(weak));
        assert_eq!(list.len(), 0);
        dispatch(&list, 1);
        assert!(list.slots.borrow().entries.is_empty());
    }

    #[test]
    fn compaction_preserves_order() {
        let list: ObserverList<dyn Listener> = ObserverList::new();
        let recorders: Vec<Rc<Recorder>> = (0..20).map(|_| Rc::new(Recorder::default())).collect();
        for recorder in &recorders {
            register(&list, recorder);
        }
        for recorder in recorders.iter().step_by(2).chain(recorders.iter().skip(1).step_by(4)) {
            list.remove(&**recorder);
        }

        let remaining: Vec<&Rc<Recorder>> = recorders.iter().skip(3).step_by(4).collect();
        assert_eq!(list.len(), remaining.len());

        dispatch(&list, 3);
        for (i, recorder) in recorders.iter().enumerate() {
            let expected: Vec<u32> = if i % 4 == 3 { vec![3] } else { vec![] };
            assert_eq!(*recorder.heard.borrow(), expected, "observer {i}");
        }
        assert!(list.remove(&**remaining[0]));
        assert!(!list.remove(&**remaining[0]));
    }
}
