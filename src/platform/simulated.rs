//! Simulated wireless headset for running without hardware

use super::{
    Accessory, AccessorySystem, AudioSystem, DeviceId, SignalLevel, TransportKind,
    pulse::INPUT_SUFFIX,
};
use crate::error::PlatformError;
use log::debug;
use rand::Rng;
use std::sync::{Arc, Mutex, PoisonError};

const ADDRESS: &str = "AC:DE:48:00:11:22";
const NAME: &str = "Simulated Headset";
const DEVICE: &str = "sim.headset.input";

/// Signal reading at the desk
const NEAR_LEVEL: SignalLevel = -35;
/// Signal reading at the far end of the room
const FAR_LEVEL: SignalLevel = -85;
/// Readings spent walking in one direction before turning around
const LEG_LENGTH: u32 = 40;
/// Largest random step between readings
const JITTER: SignalLevel = 3;

#[derive(Debug)]
struct Walk {
    level: SignalLevel,
    steps: u32,
    walking_away: bool,
}

/// A headset whose signal drifts between desk and far end of the room.
/// Serves as both audio and accessory backend; clones share one walk.
#[derive(Debug, Clone)]
pub struct SimulatedHeadset {
    walk: Arc<Mutex<Walk>>,
}

impl Default for SimulatedHeadset {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHeadset {
    pub fn new() -> Self {
        Self {
            walk: Arc::new(Mutex::new(Walk {
                level: NEAR_LEVEL,
                steps: 0,
                walking_away: true,
            })),
        }
    }

    fn step(&self) -> SignalLevel {
        let mut walk = self.walk.lock().unwrap_or_else(PoisonError::into_inner);

        walk.steps += 1;
        if walk.steps >= LEG_LENGTH {
            walk.steps = 0;
            walk.walking_away = !walk.walking_away;
        }

        let drift = (NEAR_LEVEL - FAR_LEVEL) / LEG_LENGTH as SignalLevel;
        let drift = if walk.walking_away { -drift } else { drift };
        let jitter = rand::thread_rng().gen_range(-JITTER..=JITTER);

        walk.level = (walk.level + drift + jitter).clamp(FAR_LEVEL, NEAR_LEVEL);
        walk.level
    }
}

impl AudioSystem for SimulatedHeadset {
    fn default_input_device(&self) -> Result<DeviceId, PlatformError> {
        Ok(DeviceId(DEVICE.to_string()))
    }

    fn transport_kind(&self, _device: &DeviceId) -> Result<TransportKind, PlatformError> {
        Ok(TransportKind::Bluetooth)
    }

    fn unique_id(&self, _device: &DeviceId) -> Result<String, PlatformError> {
        Ok(format!("{}{}", ADDRESS, INPUT_SUFFIX))
    }

    fn set_input_gain(&self, device: &DeviceId, level: f64) -> Result<(), PlatformError> {
        debug!("Simulated gain for {}: {:.2}", device, level);
        Ok(())
    }
}

impl AccessorySystem for SimulatedHeadset {
    fn paired_accessories(&self) -> Result<Vec<Accessory>, PlatformError> {
        Ok(vec![Accessory {
            address: ADDRESS.to_string(),
            name: Some(NAME.to_string()),
            connected: true,
        }])
    }

    fn signal_level(&self, _accessory: &Accessory) -> Result<SignalLevel, PlatformError> {
        Ok(self.step())
    }
}
