//! The periodic sampling and gain control loop

use crate::calibration::{CalibrationSwitch, CalibrationTracker};
use crate::error::ApplyError;
use crate::persist::CalibrationStore;
use crate::platform::{Platform, SignalLevel};
use crate::resolver::{self, AudioDeviceInfo};
use crate::response::ResponseMapper;
use crate::smoothing::SignalSmoother;
use crate::state::{ControlOutput, Mode, PublishedState, Snapshot};
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Tunables for one control loop instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    pub interval: Duration,
    pub window: usize,
    pub margin: f64,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(crate::constants::control::TICK_INTERVAL_MS),
            window: crate::constants::signal::DEFAULT_WINDOW,
            margin: crate::constants::response::DEFAULT_MARGIN,
        }
    }
}

/// Owns every piece of control state; the outside world only gets the
/// calibration switch and read-only snapshots.
pub struct ControlLoop {
    platform: Platform,
    settings: LoopSettings,
    smoother: SignalSmoother,
    tracker: CalibrationTracker,
    mapper: ResponseMapper,
    store: CalibrationStore,
    switch: CalibrationSwitch,
    seen_epoch: u64,
    published: PublishedState,
}

impl ControlLoop {
    /// Build a loop in tracking mode, starting from the persisted bounds
    pub fn new(platform: Platform, settings: LoopSettings, store: CalibrationStore) -> Self {
        let bounds = store.load();
        let switch = CalibrationSwitch::new();
        let published = PublishedState::new(Snapshot {
            calibration: bounds,
            ..Snapshot::default()
        });

        Self {
            platform,
            settings,
            smoother: SignalSmoother::new(settings.window),
            tracker: CalibrationTracker::with_bounds(bounds),
            mapper: ResponseMapper::new(settings.margin),
            store,
            seen_epoch: switch.snapshot().epoch,
            switch,
            published,
        }
    }

    /// Handle for requesting calibration mode changes
    pub fn switch(&self) -> CalibrationSwitch {
        self.switch.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.published.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.published.current()
    }

    /// Tick on the configured interval until `shutdown` turns true or its
    /// sender goes away. Each tick runs on the blocking pool and is awaited
    /// before the next one is scheduled, so a slow tick delays the next.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Control loop started: interval {:?}, window {}, margin {:.2}",
            self.settings.interval, self.settings.window, self.settings.margin
        );

        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // Platform queries block, keep them off the runtime workers
                    let ticked = tokio::task::spawn_blocking(move || {
                        self.tick();
                        self
                    })
                    .await;
                    self = match ticked {
                        Ok(control) => control,
                        Err(e) => {
                            error!("Control tick panicked, stopping: {}", e);
                            return;
                        }
                    };
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.finish();
        info!("Control loop stopped");
    }

    /// One resolve, smooth, calibrate-or-map, apply pass
    pub fn tick(&mut self) {
        self.sync_mode();
        self.published.update(|s| s.ticks += 1);

        let device = match resolver::resolve_active_device(self.platform.audio.as_ref()) {
            Ok(device) => device,
            Err(e) => {
                warn!("{}", e);
                let message = e.to_string();
                self.published.update(|s| {
                    s.device = None;
                    s.accessory = None;
                    s.last_error = Some(message);
                });
                return;
            }
        };
        self.published.update(|s| s.device = Some(device.clone()));

        let source = resolver::resolve_signal_source(&device, self.platform.accessories.as_ref());
        let raw = source.as_ref().map(|s| s.signal_level);
        self.published.update(|s| s.accessory = source);

        let smoothed = self.smoother.push(raw);
        debug!("raw signal {:?}, smoothed {:?}", raw, smoothed);
        self.published.update(|s| s.smoothed_level = smoothed);

        let Some(level) = smoothed else {
            return;
        };

        if self.tracker.is_active() {
            self.tracker.observe(level);
            let bounds = self.tracker.bounds();
            self.published.update(|s| s.calibration = bounds);
        } else {
            self.track(&device, level);
        }
    }

    /// Leave calibration if it is running, persisting what was learned
    pub fn finish(&mut self) {
        if self.tracker.is_active() {
            self.switch.leave();
            self.sync_mode();
        }
    }

    fn track(&mut self, device: &AudioDeviceInfo, level: SignalLevel) {
        let Some((min, max)) = self.tracker.bounds().range() else {
            debug!("Uncalibrated, leaving gain alone");
            return;
        };
        let Some(gain) = self.mapper.map(level, min, max) else {
            debug!("Calibration range is empty ({}..{}), leaving gain alone", min, max);
            return;
        };

        match self.apply(device, gain) {
            Ok(()) => {
                let previous = self.published.current().output.map(|o| o.normalized_level);
                if previous != Some(gain) {
                    info!("Input gain set to {:.2} (signal {})", gain, level);
                }
                self.published.update(|s| {
                    s.output = Some(ControlOutput {
                        normalized_level: gain,
                        applied: true,
                    });
                    s.last_error = None;
                });
            }
            Err(e) => {
                warn!("{}", e);
                let message = e.to_string();
                // keep the last level that reached the device
                self.published.update(|s| {
                    if let Some(output) = s.output.as_mut() {
                        output.applied = false;
                    }
                    s.last_error = Some(message);
                });
            }
        }
    }

    fn apply(&self, device: &AudioDeviceInfo, gain: f64) -> Result<(), ApplyError> {
        self.platform
            .audio
            .set_input_gain(&device.device_id, gain)
            .map_err(ApplyError::from)
    }

    /// Bring the tracker in line with the switch. A new epoch always starts
    /// a fresh session before anything is observed this tick.
    fn sync_mode(&mut self) {
        let requested = self.switch.snapshot();

        if requested.epoch != self.seen_epoch {
            self.seen_epoch = requested.epoch;
            self.tracker.enter_calibration();
            info!("Calibration started");
            self.published.update(|s| {
                s.mode = Mode::Calibrating;
                s.calibration = Default::default();
            });
        }

        if !requested.active && self.tracker.is_active() {
            let bounds = self.tracker.exit_calibration();
            info!(
                "Calibration finished: min {:?}, max {:?}",
                bounds.min_level, bounds.max_level
            );
            if let Err(e) = self.store.save(&bounds) {
                warn!("{}", e);
            }
            self.published.update(|s| {
                s.mode = Mode::Tracking;
                s.calibration = bounds;
            });
        }
    }
}
