//! Signal level to input gain response curve

use crate::platform::SignalLevel;

/// Maps a smoothed signal level onto a normalized input gain.
///
/// The position inside the calibrated range goes through an ease-out
/// quadratic, then a fixed additive margin is added and the result clamped
/// to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseMapper {
    margin: f64,
}

impl Default for ResponseMapper {
    fn default() -> Self {
        Self::new(crate::constants::response::DEFAULT_MARGIN)
    }
}

impl ResponseMapper {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    /// Returns `None` when `min == max`, since the scale is undefined
    pub fn map(&self, level: SignalLevel, min: SignalLevel, max: SignalLevel) -> Option<f64> {
        if min == max {
            return None;
        }

        let x = (f64::from(level) - f64::from(min)) / (f64::from(max) - f64::from(min));
        let x = x.clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - x).powi(2);

        Some((eased + self.margin).clamp(0.0, 1.0))
    }
}
