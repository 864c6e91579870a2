//! Circular tap slop.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::config::gesture_config::GestureConfig;

/// Movement up to `radius` from the reference point still counts as a tap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapSlop {
    pub radius: f32,
}

impl TapSlop {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn contains(&self, delta: Vector2<f32>) -> bool {
        delta.norm_squared() <= self.radius * self.radius
    }
}

impl From<&GestureConfig> for TapSlop {
    fn from(config: &GestureConfig) -> Self {
        Self::new(config.tap_slop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_inside() {
        let slop = TapSlop::new(5.0);
        assert!(slop.contains(Vector2::new(3.0, 4.0)));
        assert!(slop.contains(Vector2::zeros()));
        assert!(!slop.contains(Vector2::new(3.0, 4.1)));
    }

    #[test]
    fn built_from_gesture_config() {
        let config = GestureConfig { tap_slop: 12.0 };
        assert_eq!(TapSlop::from(&config).radius, 12.0);
    }
}
