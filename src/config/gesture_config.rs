use serde::{Deserialize, Serialize};

/// Settings for the touch selection gestures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Distance (in touch coordinates) a touch may travel and still count as a tap
    pub tap_slop: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig { tap_slop: 8.0 }
    }
}
