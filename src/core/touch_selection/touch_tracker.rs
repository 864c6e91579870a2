//! Polled touchpad handling.
//! Touch surfaces such as controller touchpads report their state on every
//! poll instead of emitting events. This module turns consecutive samples
//! into the motion events the selection gestures consume.

use std::time::Instant;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::core::touch_selection::motion_event::{MotionAction, MotionEvent};

/// Represents the state of the touch surface at one poll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchSample {
    pub touched: bool,
    pub x: f32,
    pub y: f32,
}

impl TouchSample {
    pub fn touched(x: f32, y: f32) -> Self {
        Self { touched: true, x, y }
    }

    pub fn released() -> Self {
        Self {
            touched: false,
            x: 0.0,
            y: 0.0,
        }
    }

    fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}

/// Tracks touch contact across polled samples.
#[derive(Debug, Default)]
pub struct TouchTracker {
    /// Last position while the surface is touched.
    last_position: Option<Point2<f32>>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_touching(&self) -> bool {
        self.last_position.is_some()
    }

    /// Compares `sample` to the previous one and returns the resulting event,
    /// if any. Stationary samples while touching produce nothing.
    pub fn update(&mut self, sample: &TouchSample, time: Instant) -> Option<MotionEvent> {
        match (self.last_position, sample.touched) {
            (None, true) => {
                let position = sample.position();
                self.last_position = Some(position);
                Some(MotionEvent::new(MotionAction::Down, position, time))
            }
            (Some(last), true) => {
                let position = sample.position();
                if position == last {
                    return None;
                }
                self.last_position = Some(position);
                Some(MotionEvent::new(MotionAction::Move, position, time))
            }
            // Released samples carry no usable coordinates; lift where the
            // finger was last seen.
            (Some(last), false) => {
                self.last_position = None;
                Some(MotionEvent::new(MotionAction::Up, last, time))
            }
            (None, false) => None,
        }
    }

    /// Aborts the current contact, e.g. when the input device disconnects.
    pub fn reset(&mut self, time: Instant) -> Option<MotionEvent> {
        self.last_position
            .take()
            .map(|last| MotionEvent::new(MotionAction::Cancel, last, time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(tracker: &mut TouchTracker, samples: &[TouchSample]) -> Vec<Option<(MotionAction, Point2<f32>)>> {
        let now = Instant::now();
        samples
            .iter()
            .map(|sample| {
                tracker
                    .update(sample, now)
                    .map(|event| (event.action, event.position))
            })
            .collect()
    }

    #[test]
    fn derives_down_move_up_from_samples() {
        let mut tracker = TouchTracker::new();
        let events = actions(
            &mut tracker,
            &[
                TouchSample::released(),
                TouchSample::touched(0.5, 0.5),
                TouchSample::touched(0.5, 0.5),
                TouchSample::touched(0.6, 0.4),
                TouchSample::released(),
                TouchSample::released(),
            ],
        );

        assert_eq!(
            events,
            vec![
                None,
                Some((MotionAction::Down, Point2::new(0.5, 0.5))),
                None,
                Some((MotionAction::Move, Point2::new(0.6, 0.4))),
                Some((MotionAction::Up, Point2::new(0.6, 0.4))),
                None,
            ]
        );
        assert!(!tracker.is_touching());
    }

    #[test]
    fn reset_cancels_only_an_ongoing_contact() {
        let mut tracker = TouchTracker::new();
        assert_eq!(tracker.reset(Instant::now()), None);

        tracker.update(&TouchSample::touched(0.2, 0.3), Instant::now());
        assert!(tracker.is_touching());

        let cancel = tracker.reset(Instant::now()).map(|e| (e.action, e.position));
        assert_eq!(cancel, Some((MotionAction::Cancel, Point2::new(0.2, 0.3))));
        assert!(!tracker.is_touching());

        let down = tracker.update(&TouchSample::touched(0.2, 0.3), Instant::now());
        assert_eq!(down.map(|e| e.action), Some(MotionAction::Down));
    }
}
