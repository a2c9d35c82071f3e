//! Scriptable recording backend for tests

use super::{Accessory, AccessorySystem, AudioSystem, DeviceId, Platform, SignalLevel, TransportKind};
use crate::error::PlatformError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct FakeState {
    pub device: Option<DeviceId>,
    pub transport: Option<TransportKind>,
    pub uid: Option<String>,
    pub accessories: Vec<Accessory>,
    /// Readings handed out in order; an empty queue repeats `steady_level`
    pub levels: VecDeque<Result<SignalLevel, ()>>,
    pub steady_level: Option<SignalLevel>,
    pub fail_gain: bool,
    pub gain_writes: Vec<f64>,
    pub scans: usize,
    /// Extra latency for each default device query, in order
    pub query_delays: VecDeque<Duration>,
    /// Latency once `query_delays` runs out
    pub steady_delay: Duration,
    /// When each default device query started
    pub query_times: Vec<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    pub state: Arc<Mutex<FakeState>>,
}

fn failure(what: &'static str) -> PlatformError {
    PlatformError::Unsupported(what)
}

impl FakePlatform {
    /// A connected wireless headset at `address` that is the default input
    pub fn wireless(address: &str) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.device = Some(DeviceId("fake-headset".to_string()));
            state.transport = Some(TransportKind::Bluetooth);
            state.uid = Some(format!("{}:input", address));
            state.accessories = vec![Accessory {
                address: address.to_string(),
                name: Some("Fake Headset".to_string()),
                connected: true,
            }];
        }
        fake
    }

    /// A wired default input with no accessories behind it
    pub fn wired() -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.device = Some(DeviceId("fake-builtin".to_string()));
            state.transport = Some(TransportKind::BuiltIn);
            state.uid = Some("BuiltInMicrophoneDevice".to_string());
        }
        fake
    }

    pub fn with<F: FnOnce(&mut FakeState)>(&self, f: F) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn push_levels(&self, levels: &[SignalLevel]) {
        let mut state = self.state.lock().unwrap();
        state.levels.extend(levels.iter().map(|&l| Ok(l)));
    }

    pub fn gain_writes(&self) -> Vec<f64> {
        self.state.lock().unwrap().gain_writes.clone()
    }

    pub fn scans(&self) -> usize {
        self.state.lock().unwrap().scans
    }

    pub fn query_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().query_times.clone()
    }

    pub fn platform(&self) -> Platform {
        Platform {
            audio: Box::new(self.clone()),
            accessories: Box::new(self.clone()),
        }
    }
}

impl AudioSystem for FakePlatform {
    fn default_input_device(&self) -> Result<DeviceId, PlatformError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.query_times.push(Instant::now());
            let steady = state.steady_delay;
            state.query_delays.pop_front().unwrap_or(steady)
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.state.lock().unwrap().device.clone().ok_or_else(|| failure("default device"))
    }

    fn transport_kind(&self, _device: &DeviceId) -> Result<TransportKind, PlatformError> {
        self.state.lock().unwrap().transport.ok_or_else(|| failure("transport"))
    }

    fn unique_id(&self, _device: &DeviceId) -> Result<String, PlatformError> {
        self.state.lock().unwrap().uid.clone().ok_or_else(|| failure("uid"))
    }

    fn set_input_gain(&self, _device: &DeviceId, level: f64) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_gain {
            return Err(failure("gain"));
        }
        state.gain_writes.push(level);
        Ok(())
    }
}

impl AccessorySystem for FakePlatform {
    fn paired_accessories(&self) -> Result<Vec<Accessory>, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.scans += 1;
        Ok(state.accessories.clone())
    }

    fn signal_level(&self, _accessory: &Accessory) -> Result<SignalLevel, PlatformError> {
        let mut state = self.state.lock().unwrap();
        match state.levels.pop_front() {
            Some(Ok(level)) => Ok(level),
            Some(Err(())) => Err(failure("signal level")),
            None => state.steady_level.ok_or_else(|| failure("signal level")),
        }
    }
}
