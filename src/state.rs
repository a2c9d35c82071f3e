//! Published control loop state

use crate::calibration::CalibrationBounds;
use crate::platform::SignalLevel;
use crate::resolver::{AudioDeviceInfo, SignalSourceInfo};
use tokio::sync::watch;

/// Operating mode of the control loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Tracking,
    Calibrating,
}

/// Last gain written to the input device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub normalized_level: f64,
    pub applied: bool,
}

/// What the dashboard shows. Updated step by step during a tick, so a
/// reader may see a mix of old and new fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub mode: Mode,
    pub device: Option<AudioDeviceInfo>,
    pub accessory: Option<SignalSourceInfo>,
    pub smoothed_level: Option<SignalLevel>,
    pub calibration: CalibrationBounds,
    pub output: Option<ControlOutput>,
    pub last_error: Option<String>,
    pub ticks: u64,
}

impl Snapshot {
    pub fn signal_level(&self) -> Option<SignalLevel> {
        self.accessory.as_ref().map(|a| a.signal_level)
    }
}

/// Producer side of the snapshot channel, owned by the control loop
#[derive(Debug)]
pub struct PublishedState {
    tx: watch::Sender<Snapshot>,
}

impl PublishedState {
    pub fn new(initial: Snapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// New read-only handle for a consumer
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn update<F: FnOnce(&mut Snapshot)>(&self, f: F) {
        self.tx.send_modify(f);
    }

    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }
}
