//! Audio and accessory platform boundary
//!
//! The control loop only talks to the system through the two traits in
//! this module. Every call is blocking and re-queries the system; no
//! handles are held across ticks.

pub mod bluez;
#[cfg(test)]
pub mod fake;
pub mod pulse;
pub mod simulated;

use crate::error::PlatformError;
use log::trace;
use std::process::Command;

/// Accessory signal strength, larger is stronger (dBm-like, e.g. -127..0)
pub type SignalLevel = i32;

/// Opaque identifier for an audio device, only meaningful to its backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(pub String);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an audio device is attached to the computer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Bluetooth,
    BuiltIn,
    Usb,
    Other,
}

/// A paired accessory as reported by the accessory backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessory {
    pub address: String,
    pub name: Option<String>,
    pub connected: bool,
}

/// Query and control the system's audio input devices
pub trait AudioSystem: Send + Sync {
    fn default_input_device(&self) -> Result<DeviceId, PlatformError>;

    fn transport_kind(&self, device: &DeviceId) -> Result<TransportKind, PlatformError>;

    /// Stable identifier; for wireless devices it carries the accessory address
    fn unique_id(&self, device: &DeviceId) -> Result<String, PlatformError>;

    /// Set the input gain, `level` in `[0, 1]`
    fn set_input_gain(&self, device: &DeviceId, level: f64) -> Result<(), PlatformError>;
}

/// Enumerate paired wireless accessories and read their signal strength
pub trait AccessorySystem: Send + Sync {
    fn paired_accessories(&self) -> Result<Vec<Accessory>, PlatformError>;

    fn signal_level(&self, accessory: &Accessory) -> Result<SignalLevel, PlatformError>;
}

/// Boxed pair of backends the control loop runs against
pub struct Platform {
    pub audio: Box<dyn AudioSystem>,
    pub accessories: Box<dyn AccessorySystem>,
}

impl Platform {
    /// Linux backends: PulseAudio/PipeWire for audio, BlueZ for accessories
    pub fn system() -> Self {
        Self {
            audio: Box::new(pulse::PulseAudio::new()),
            accessories: Box::new(bluez::Bluez::new()),
        }
    }

    /// In-process simulated headset
    pub fn simulated() -> Self {
        let headset = simulated::SimulatedHeadset::new();
        Self {
            audio: Box::new(headset.clone()),
            accessories: Box::new(headset),
        }
    }
}

/// Run a helper program and return its stdout
pub(crate) fn run_command(program: &str, args: &[&str]) -> Result<String, PlatformError> {
    trace!("running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| PlatformError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(PlatformError::Status {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    String::from_utf8(output.stdout)
        .map_err(|e| PlatformError::Parse(format!("{} printed invalid UTF-8: {}", program, e)))
}

/// Canonical upper-case, colon separated form of a hardware address.
/// Accepts `:`, `-` and `_` as separators.
pub fn normalize_address(address: &str) -> Option<String> {
    let octets: Vec<&str> = address.split([':', '-', '_']).collect();
    if octets.len() != 6 {
        return None;
    }
    if !octets
        .iter()
        .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
    {
        return None;
    }

    Some(octets.join(":").to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_address_separators_and_case() {
        assert_eq!(
            normalize_address("ac-de-48-00-11-22").as_deref(),
            Some("AC:DE:48:00:11:22")
        );
        assert_eq!(
            normalize_address("AC_DE_48_00_11_22").as_deref(),
            Some("AC:DE:48:00:11:22")
        );
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!(normalize_address("AC:DE:48"), None);
        assert_eq!(normalize_address("AC:DE:48:00:11:ZZ"), None);
        assert_eq!(normalize_address(""), None);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = run_command("rssigain-definitely-not-installed", &[]).unwrap_err();
        assert!(matches!(err, PlatformError::Spawn { .. }));
    }
}
