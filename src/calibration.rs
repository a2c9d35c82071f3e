//! Calibration bounds tracking and the calibration mode switch

use crate::platform::SignalLevel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Observed signal range, learned during a calibration session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationBounds {
    pub min_level: Option<SignalLevel>,
    pub max_level: Option<SignalLevel>,
}

impl CalibrationBounds {
    pub fn new(min_level: SignalLevel, max_level: SignalLevel) -> Self {
        Self {
            min_level: Some(min_level),
            max_level: Some(max_level),
        }
    }

    /// Both bounds, when known
    pub fn range(&self) -> Option<(SignalLevel, SignalLevel)> {
        Some((self.min_level?, self.max_level?))
    }
}

/// Widens the calibration bounds while a calibration session is active
#[derive(Debug, Clone, Default)]
pub struct CalibrationTracker {
    bounds: CalibrationBounds,
    active: bool,
}

impl CalibrationTracker {
    /// Start in tracking mode with previously saved bounds
    pub fn with_bounds(bounds: CalibrationBounds) -> Self {
        Self {
            bounds,
            active: false,
        }
    }

    /// Begin a session. Bounds are cleared even if one is already running.
    pub fn enter_calibration(&mut self) {
        self.bounds = CalibrationBounds::default();
        self.active = true;
    }

    /// End the session, freezing the bounds as the operating range
    pub fn exit_calibration(&mut self) -> CalibrationBounds {
        self.active = false;
        self.bounds
    }

    /// Widen the bounds to include `level`; ignored outside a session
    pub fn observe(&mut self, level: SignalLevel) {
        if !self.active {
            return;
        }

        self.bounds.min_level = Some(self.bounds.min_level.map_or(level, |min| min.min(level)));
        self.bounds.max_level = Some(self.bounds.max_level.map_or(level, |max| max.max(level)));
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bounds(&self) -> CalibrationBounds {
        self.bounds
    }
}

/// Point-in-time reading of the calibration switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchState {
    pub active: bool,
    /// Incremented on every `enter`
    pub epoch: u64,
}

const ACTIVE_BIT: u64 = 1;

/// Shared calibration mode flag.
///
/// The active flag and an entry counter are packed into one atomic word so
/// the control loop sees both from a single load. A fresh epoch tells the
/// loop a new session began, even if the flag was toggled off and on again
/// between two ticks.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSwitch {
    word: Arc<AtomicU64>,
}

impl CalibrationSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a new calibration session
    pub fn enter(&self) {
        let _ = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let epoch = (word >> 1).wrapping_add(1);
                Some((epoch << 1) | ACTIVE_BIT)
            });
    }

    /// Request a return to tracking mode
    pub fn leave(&self) {
        self.word.fetch_and(!ACTIVE_BIT, Ordering::AcqRel);
    }

    /// Flip the mode, returning whether calibration is now requested
    pub fn toggle(&self) -> bool {
        if self.snapshot().active {
            self.leave();
            false
        } else {
            self.enter();
            true
        }
    }

    pub fn snapshot(&self) -> SwitchState {
        let word = self.word.load(Ordering::Acquire);
        SwitchState {
            active: word & ACTIVE_BIT != 0,
            epoch: word >> 1,
        }
    }
}
