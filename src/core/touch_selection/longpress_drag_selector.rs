//! Long-press drag selection.
//! Lets a touch sequence that started a selection with a long press keep
//! going as a drag of one of the selection bounds, without lifting the
//! finger first.

use std::time::{Duration, Instant};

use log::debug;
use nalgebra::{Point2, Vector2};

use crate::core::touch_selection::motion_event::{MotionAction, MotionEvent};

/// Tolerance when checking that the touch down preceded the long press.
/// The two arrive through separate event streams with their own clocks.
const LONG_PRESS_TIME_EPSILON: Duration = Duration::from_micros(10);

/// Receives drag callbacks and answers geometry queries for the selector.
///
/// A text field usually answers the slop query with a [`TapSlop`] built
/// from its gesture settings:
///
/// ```
/// use std::time::{Duration, Instant};
///
/// use nalgebra::{Point2, Vector2};
/// use touchlink::core::touch_selection::{
///     LongPressDragSelector, LongPressDragSelectorClient, SelectionState, TapSlop, TouchSample,
///     TouchTracker,
/// };
///
/// struct TextField {
///     slop: TapSlop,
///     start: Point2<f32>,
///     end: Point2<f32>,
///     dragged_bound: Option<Point2<f32>>,
/// }
///
/// impl LongPressDragSelectorClient for TextField {
///     fn selection_start(&self) -> Point2<f32> {
///         self.start
///     }
///
///     fn selection_end(&self) -> Point2<f32> {
///         self.end
///     }
///
///     fn is_within_tap_slop(&self, delta: Vector2<f32>) -> bool {
///         self.slop.contains(delta)
///     }
///
///     fn on_drag_begin(&mut self, _: &LongPressDragSelector, position: Point2<f32>) {
///         self.dragged_bound = Some(position);
///     }
///
///     fn on_drag_update(&mut self, _: &LongPressDragSelector, _: Point2<f32>) {}
///
///     fn on_drag_end(&mut self, _: &LongPressDragSelector) {}
///
///     fn on_long_press_drag_active_state_changed(&mut self) {}
/// }
///
/// let mut field = TextField {
///     slop: TapSlop::new(8.0),
///     start: Point2::new(0.0, 100.0),
///     end: Point2::new(40.0, 100.0),
///     dragged_bound: None,
/// };
/// let mut selector = LongPressDragSelector::new();
/// let mut tracker = TouchTracker::new();
/// let down_time = Instant::now();
///
/// let down = tracker.update(&TouchSample::touched(0.0, 50.0), down_time).unwrap();
/// assert!(!selector.will_handle_touch_event(&down, &mut field));
///
/// selector.on_long_press_event(down_time + Duration::from_millis(500), down.position, &mut field);
/// selector.on_selection_activated(&mut field);
/// assert_eq!(selector.state(), SelectionState::DragPending);
///
/// // The first move only anchors the drag; moving up past the slop drags the start bound.
/// for (ms, y) in [(600, 52.0), (650, 10.0)] {
///     let time = down_time + Duration::from_millis(ms);
///     let moved = tracker.update(&TouchSample::touched(0.0, y), time).unwrap();
///     assert!(selector.will_handle_touch_event(&moved, &mut field));
/// }
/// assert_eq!(selector.state(), SelectionState::Dragging);
/// assert_eq!(field.dragged_bound, Some(Point2::new(0.0, 100.0)));
/// ```
///
/// [`TapSlop`]: crate::core::touch_selection::TapSlop
pub trait LongPressDragSelectorClient {
    fn selection_start(&self) -> Point2<f32>;

    fn selection_end(&self) -> Point2<f32>;

    fn is_within_tap_slop(&self, delta: Vector2<f32>) -> bool;

    /// `position` is the selection bound picked for dragging.
    fn on_drag_begin(&mut self, selector: &LongPressDragSelector, position: Point2<f32>);

    fn on_drag_update(&mut self, selector: &LongPressDragSelector, position: Point2<f32>);

    fn on_drag_end(&mut self, selector: &LongPressDragSelector);

    fn on_long_press_drag_active_state_changed(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Inactive,
    /// Touch is down, waiting for the long press.
    LongPressPending,
    /// Long press accepted, waiting for the selection to show up.
    SelectionPending,
    /// Selection is active, waiting for the touch to move past the slop.
    DragPending,
    Dragging,
}

/// State machine turning a long-press touch sequence into a selection drag.
///
/// The client is passed into every call rather than stored, so it can own
/// the selector without a reference cycle.
#[derive(Debug)]
pub struct LongPressDragSelector {
    state: SelectionState,
    touch_down_position: Point2<f32>,
    touch_down_time: Option<Instant>,
    drag_start_anchor: Option<Point2<f32>>,
    drag_selection_offset: Vector2<f32>,
}

impl LongPressDragSelector {
    pub fn new() -> Self {
        Self {
            state: SelectionState::Inactive,
            touch_down_position: Point2::origin(),
            touch_down_time: None,
            drag_start_anchor: None,
            drag_selection_offset: Vector2::zeros(),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// True once a long press has been accepted and until the sequence ends.
    pub fn is_active(&self) -> bool {
        !matches!(
            self.state,
            SelectionState::Inactive | SelectionState::LongPressPending
        )
    }

    /// Feeds a touch event. Returns true if the event was consumed by a
    /// selection drag and should not reach normal touch handling.
    pub fn will_handle_touch_event<C>(&mut self, event: &MotionEvent, client: &mut C) -> bool
    where
        C: LongPressDragSelectorClient + ?Sized,
    {
        match event.action {
            MotionAction::Down => {
                self.touch_down_position = event.position;
                self.touch_down_time = Some(event.time);
                self.drag_start_anchor = None;
                self.set_state(SelectionState::LongPressPending, client);
                return false;
            }
            MotionAction::Up | MotionAction::Cancel => {
                self.set_state(SelectionState::Inactive, client);
                return false;
            }
            MotionAction::Move => {}
            MotionAction::PointerDown | MotionAction::PointerUp => return false,
        }

        let position = event.position;
        match self.state {
            SelectionState::Dragging => {
                client.on_drag_update(self, position + self.drag_selection_offset);
                true
            }
            SelectionState::DragPending => {
                self.handle_pending_drag_move(position, client);
                true
            }
            _ => false,
        }
    }

    fn handle_pending_drag_move<C>(&mut self, position: Point2<f32>, client: &mut C)
    where
        C: LongPressDragSelectorClient + ?Sized,
    {
        // Showing the selection may shift the touch coordinates, so the first
        // move after activation is the reference instead of the down position.
        let Some(anchor) = self.drag_start_anchor else {
            self.drag_start_anchor = Some(position);
            return;
        };

        let delta = position - anchor;
        if client.is_within_tap_slop(delta) {
            return;
        }

        let selection_start = client.selection_start();
        let selection_end = client.selection_end();
        let extent = if extends_selection_start(delta, position, selection_start, selection_end) {
            selection_start
        } else {
            selection_end
        };

        self.drag_selection_offset = extent - position;
        debug!("Long-press drag begins at {:?} (touch at {:?})", extent, position);
        client.on_drag_begin(self, extent);
        self.set_state(SelectionState::Dragging, client);
    }

    /// Correlates a long press from the gesture stream with the current touch
    /// sequence. Ignored unless a touch is down, the down came first and the
    /// press lies within the tap slop of the down position.
    pub fn on_long_press_event<C>(&mut self, time: Instant, position: Point2<f32>, client: &mut C)
    where
        C: LongPressDragSelectorClient + ?Sized,
    {
        if self.state != SelectionState::LongPressPending {
            return;
        }
        let Some(down_time) = self.touch_down_time else {
            return;
        };
        if down_time < time + LONG_PRESS_TIME_EPSILON
            && client.is_within_tap_slop(self.touch_down_position - position)
        {
            self.set_state(SelectionState::SelectionPending, client);
        } else {
            debug!("Ignoring long press at {:?} not matching the touch sequence", position);
        }
    }

    pub fn on_selection_activated<C>(&mut self, client: &mut C)
    where
        C: LongPressDragSelectorClient + ?Sized,
    {
        if self.state == SelectionState::SelectionPending {
            self.set_state(SelectionState::DragPending, client);
        }
    }

    pub fn on_selection_deactivated<C>(&mut self, client: &mut C)
    where
        C: LongPressDragSelectorClient + ?Sized,
    {
        self.set_state(SelectionState::Inactive, client);
    }

    fn set_state<C>(&mut self, state: SelectionState, client: &mut C)
    where
        C: LongPressDragSelectorClient + ?Sized,
    {
        if self.state == state {
            return;
        }

        let was_dragging = self.state == SelectionState::Dragging;
        let was_active = self.is_active();
        debug!("Long-press drag selector: {:?} -> {:?}", self.state, state);
        self.state = state;

        if was_dragging {
            client.on_drag_end(self);
        }
        if was_active != self.is_active() {
            client.on_long_press_drag_active_state_changed();
        }
    }
}

impl Default for LongPressDragSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks the bound to drag from the initial motion.
///
/// Mostly vertical motion extends the start bound when moving up and the end
/// bound when moving down. Otherwise the bound lying most in the direction of
/// travel wins; on a tie the end bound is extended.
fn extends_selection_start(
    delta: Vector2<f32>,
    position: Point2<f32>,
    selection_start: Point2<f32>,
    selection_end: Point2<f32>,
) -> bool {
    if delta.y.abs() > delta.x.abs() {
        return delta.y < 0.0;
    }

    // Mixed-direction text or multiline selections may not get the most
    // suitable bound here.
    let start_direction = unit_or_zero(selection_start - position);
    let end_direction = unit_or_zero(selection_end - position);
    start_direction.dot(&delta) > end_direction.dot(&delta)
}

fn unit_or_zero(v: Vector2<f32>) -> Vector2<f32> {
    v.try_normalize(0.0).unwrap_or_else(Vector2::zeros)
}
