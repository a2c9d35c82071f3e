//! BlueZ accessories through `bluetoothctl` and `hcitool`
//!
//! `hcitool rssi` issues HCI Read RSSI. On BR/EDR links the controller
//! reports that value relative to its golden receive power range, not in
//! dBm, so a headset anywhere inside the range reads 0 and only strays
//! above or below it at the edges. Calibrating on such a link can end
//! with `min == max`, in which case the loop leaves the gain alone.

use super::{Accessory, AccessorySystem, SignalLevel, normalize_address, run_command};
use crate::error::PlatformError;
use std::collections::HashSet;

const BLUETOOTHCTL: &str = "bluetoothctl";
const HCITOOL: &str = "hcitool";

/// Accessory backend for the local BlueZ adapter
#[derive(Debug, Default, Clone)]
pub struct Bluez;

impl Bluez {
    pub fn new() -> Self {
        Self
    }
}

impl AccessorySystem for Bluez {
    fn paired_accessories(&self) -> Result<Vec<Accessory>, PlatformError> {
        let paired = run_command(BLUETOOTHCTL, &["devices", "Paired"])?;
        let connected = run_command(BLUETOOTHCTL, &["devices", "Connected"])?;

        let connected: HashSet<String> = parse_device_list(&connected)
            .into_iter()
            .map(|(address, _)| address)
            .collect();

        Ok(parse_device_list(&paired)
            .into_iter()
            .map(|(address, name)| Accessory {
                connected: connected.contains(&address),
                address,
                name,
            })
            .collect())
    }

    /// Golden-range relative on BR/EDR, see module docs
    fn signal_level(&self, accessory: &Accessory) -> Result<SignalLevel, PlatformError> {
        let stdout = run_command(HCITOOL, &["rssi", &accessory.address])?;
        parse_rssi(&stdout)
    }
}

/// Parse `Device <address> <name>` lines, skipping anything else
fn parse_device_list(stdout: &str) -> Vec<(String, Option<String>)> {
    stdout
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (address, name) = match rest.split_once(' ') {
                Some((address, name)) => (address, Some(name.trim())),
                None => (rest, None),
            };
            let address = normalize_address(address)?;
            let name = name.filter(|n| !n.is_empty()).map(str::to_string);
            Some((address, name))
        })
        .collect()
}

fn parse_rssi(stdout: &str) -> Result<SignalLevel, PlatformError> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("RSSI return value:"))
        .and_then(|value| value.trim().parse::<SignalLevel>().ok())
        .ok_or_else(|| PlatformError::Parse(format!("no RSSI reading in {:?}", stdout.trim())))
}
