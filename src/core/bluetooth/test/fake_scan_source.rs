use std::cell::Cell;
use std::rc::Rc;

use crate::core::bluetooth::scan_source::ScanSource;

#[derive(Debug)]
struct FakeScanState {
    start_calls: Cell<u32>,
    stop_calls: Cell<u32>,
    accept_start: Cell<bool>,
    accept_stop: Cell<bool>,
    scanning: Cell<bool>,
}

/// Scan source that records calls. Clones share state, so a test can keep
/// one clone for assertions after handing another to the adapter.
#[derive(Debug, Clone)]
pub(crate) struct FakeScanSource {
    state: Rc<FakeScanState>,
}

impl Default for FakeScanSource {
    fn default() -> Self {
        Self {
            state: Rc::new(FakeScanState {
                start_calls: Cell::new(0),
                stop_calls: Cell::new(0),
                accept_start: Cell::new(true),
                accept_stop: Cell::new(true),
                scanning: Cell::new(false),
            }),
        }
    }
}

impl FakeScanSource {
    pub(crate) fn start_calls(&self) -> u32 {
        self.state.start_calls.get()
    }

    pub(crate) fn stop_calls(&self) -> u32 {
        self.state.stop_calls.get()
    }

    pub(crate) fn is_scanning(&self) -> bool {
        self.state.scanning.get()
    }

    pub(crate) fn set_accept_start(&self, accept: bool) {
        self.state.accept_start.set(accept);
    }

    pub(crate) fn set_accept_stop(&self, accept: bool) {
        self.state.accept_stop.set(accept);
    }
}

impl ScanSource for FakeScanSource {
    fn start_scan(&mut self) -> bool {
        self.state.start_calls.set(self.state.start_calls.get() + 1);
        let accepted = self.state.accept_start.get();
        if accepted {
            self.state.scanning.set(true);
        }
        accepted
    }

    fn stop_scan(&mut self) -> bool {
        self.state.stop_calls.set(self.state.stop_calls.get() + 1);
        self.state.scanning.set(false);
        self.state.accept_stop.get()
    }
}
