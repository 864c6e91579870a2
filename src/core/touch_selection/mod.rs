//! Touch selection gestures
//! This module turns touch input into selection drags started by a long press.

mod longpress_drag_selector;
mod motion_event;
mod tap_slop;
mod touch_tracker;

pub use longpress_drag_selector::{LongPressDragSelector, LongPressDragSelectorClient, SelectionState};
pub use motion_event::{MotionAction, MotionEvent};
pub use tap_slop::TapSlop;
pub use touch_tracker::{TouchSample, TouchTracker};
