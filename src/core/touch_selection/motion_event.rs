//! Touch input as seen by the selection gestures.

use std::time::Instant;

use nalgebra::Point2;

/// Action carried by a [`MotionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAction {
    /// The first pointer touched down; starts a touch sequence.
    Down,
    Move,
    /// The last pointer lifted; ends the sequence.
    Up,
    /// The sequence was aborted by the input source.
    Cancel,
    /// A secondary pointer touched down.
    PointerDown,
    /// A secondary pointer lifted.
    PointerUp,
}

/// A single touch sample in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    pub action: MotionAction,
    pub position: Point2<f32>,
    pub time: Instant,
}

impl MotionEvent {
    pub fn new(action: MotionAction, position: Point2<f32>, time: Instant) -> Self {
        Self {
            action,
            position,
            time,
        }
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }
}
