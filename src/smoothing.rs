//! Signal level smoothing over a fixed sliding window

use crate::platform::SignalLevel;
use std::collections::VecDeque;

/// Averages the most recent signal readings once the window is full.
///
/// A tick whose reading could not be resolved is pushed as `None`; it
/// occupies a slot like any other sample and suppresses output until it
/// is evicted again, so a dropout never drags the average around.
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    capacity: usize,
    window: VecDeque<Option<SignalLevel>>,
}

impl SignalSmoother {
    /// Create an empty smoother holding `capacity` samples
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "smoothing window must have non-zero capacity");

        Self {
            capacity,
            window: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a sample, evicting the oldest one when full.
    /// Returns the floor of the mean once every slot holds a reading.
    pub fn push(&mut self, sample: Option<SignalLevel>) -> Option<SignalLevel> {
        while self.window.len() >= self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample);

        self.average()
    }

    /// Current average, if the window is full of present readings
    pub fn average(&self) -> Option<SignalLevel> {
        if self.window.len() < self.capacity {
            return None;
        }

        let mut sum: i64 = 0;
        for sample in &self.window {
            sum += i64::from((*sample)?);
        }

        // div_euclid with a positive divisor floors, also for negative sums
        Some(sum.div_euclid(self.capacity as i64) as SignalLevel)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_window_yields_nothing() {
        let mut smoother = SignalSmoother::new(5);
        for _ in 0..4 {
            assert_eq!(smoother.push(Some(-60)), None);
        }
        assert_eq!(smoother.len(), 4);
    }

    #[test]
    fn full_window_yields_floor_average() {
        let mut smoother = SignalSmoother::new(5);
        let samples = [-60, -61, -62, -60, -63];
        let mut out = None;
        for s in samples {
            out = smoother.push(Some(s));
        }
        // -306 / 5 = -61.2, floored
        assert_eq!(out, Some(-62));
    }

    #[test]
    fn next_push_evicts_oldest() {
        let mut smoother = SignalSmoother::new(5);
        for s in [-10, -20, -30, -40, -50] {
            smoother.push(Some(s));
        }
        // window becomes [-20, -30, -40, -50, -60]
        assert_eq!(smoother.push(Some(-60)), Some(-40));
        assert_eq!(smoother.len(), 5);
    }

    #[test]
    fn positive_average_floors_toward_zero() {
        let mut smoother = SignalSmoother::new(2);
        smoother.push(Some(3));
        assert_eq!(smoother.push(Some(4)), Some(3));
    }

    #[test]
    fn dropout_suppresses_output_until_evicted() {
        let mut smoother = SignalSmoother::new(3);
        smoother.push(Some(-50));
        smoother.push(None);
        assert_eq!(smoother.push(Some(-50)), None);
        assert_eq!(smoother.push(Some(-50)), None);
        // the None slot falls out here
        assert_eq!(smoother.push(Some(-50)), Some(-50));
    }

    #[test]
    fn identical_samples_average_to_themselves() {
        let mut smoother = SignalSmoother::new(5);
        let mut out = None;
        for _ in 0..5 {
            out = smoother.push(Some(-60));
        }
        assert_eq!(out, Some(-60));
    }

    #[test]
    #[should_panic]
    fn zero_capacity_is_rejected() {
        SignalSmoother::new(0);
    }
}
