//! Resolution of the active input device and its wireless accessory

use crate::error::ResolveError;
use crate::platform::{
    AccessorySystem, AudioSystem, DeviceId, SignalLevel, TransportKind, normalize_address,
};
use log::{debug, warn};

/// Directional qualifiers a device UID may carry after the accessory address
const DIRECTION_SUFFIXES: [&str; 4] = [":input", ":output", "-input", "-output"];

/// The default input device as seen on one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDeviceInfo {
    pub device_id: DeviceId,
    pub uid: String,
    pub is_wireless_audio: bool,
}

/// The accessory behind the active device as seen on one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSourceInfo {
    pub name: Option<String>,
    pub signal_level: SignalLevel,
}

/// Query the default input device, its transport and its UID.
/// Any failing query fails the whole resolution.
pub fn resolve_active_device(audio: &dyn AudioSystem) -> Result<AudioDeviceInfo, ResolveError> {
    let device_id = audio
        .default_input_device()
        .map_err(ResolveError::DefaultDevice)?;
    let transport = audio
        .transport_kind(&device_id)
        .map_err(ResolveError::Transport)?;
    let uid = audio.unique_id(&device_id).map_err(ResolveError::DeviceUid)?;

    Ok(AudioDeviceInfo {
        device_id,
        uid,
        is_wireless_audio: transport == TransportKind::Bluetooth,
    })
}

/// Find the connected accessory whose address matches the device UID and
/// read its signal level. First match wins.
pub fn resolve_signal_source(
    device: &AudioDeviceInfo,
    accessories: &dyn AccessorySystem,
) -> Option<SignalSourceInfo> {
    if !device.is_wireless_audio {
        return None;
    }

    let paired = match accessories.paired_accessories() {
        Ok(paired) => paired,
        Err(e) => {
            warn!("Listing paired accessories failed: {}", e);
            return None;
        }
    };

    let wanted = accessory_key(strip_direction(&device.uid));
    let accessory = paired
        .into_iter()
        .filter(|a| a.connected)
        .find(|a| accessory_key(&a.address) == wanted)?;

    match accessories.signal_level(&accessory) {
        Ok(signal_level) => Some(SignalSourceInfo {
            name: accessory.name,
            signal_level,
        }),
        Err(e) => {
            debug!("Reading signal level of {} failed: {}", accessory.address, e);
            None
        }
    }
}

/// Drop a trailing direction qualifier such as `:input`
pub fn strip_direction(uid: &str) -> &str {
    DIRECTION_SUFFIXES
        .iter()
        .find_map(|suffix| uid.strip_suffix(suffix))
        .unwrap_or(uid)
}

fn accessory_key(address: &str) -> String {
    normalize_address(address).unwrap_or_else(|| address.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Accessory;
    use crate::platform::fake::FakePlatform;

    #[test]
    fn resolves_wireless_device() {
        let fake = FakePlatform::wireless("AC:DE:48:00:11:22");
        let device = resolve_active_device(&fake).unwrap();
        assert!(device.is_wireless_audio);
        assert_eq!(device.uid, "AC:DE:48:00:11:22:input");
    }

    #[test]
    fn failed_transport_query_is_an_error() {
        let fake = FakePlatform::wireless("AC:DE:48:00:11:22");
        fake.with(|s| s.transport = None);
        assert!(matches!(
            resolve_active_device(&fake),
            Err(ResolveError::Transport(_))
        ));
    }

    #[test]
    fn non_wireless_device_skips_accessory_scan() {
        let fake = FakePlatform::wired();
        fake.with(|s| s.steady_level = Some(-40));
        let device = resolve_active_device(&fake).unwrap();

        assert_eq!(resolve_signal_source(&device, &fake), None);
        assert_eq!(fake.scans(), 0);
    }

    #[test]
    fn matches_connected_accessory_by_address() {
        let fake = FakePlatform::wireless("ac-de-48-00-11-22");
        fake.push_levels(&[-52]);
        let device = AudioDeviceInfo {
            device_id: DeviceId("x".to_string()),
            uid: "AC:DE:48:00:11:22:input".to_string(),
            is_wireless_audio: true,
        };

        let source = resolve_signal_source(&device, &fake).unwrap();
        assert_eq!(source.name.as_deref(), Some("Fake Headset"));
        assert_eq!(source.signal_level, -52);
    }

    #[test]
    fn disconnected_accessory_is_ignored() {
        let fake = FakePlatform::wireless("AC:DE:48:00:11:22");
        fake.with(|s| {
            s.accessories[0].connected = false;
            s.steady_level = Some(-40);
        });
        let device = resolve_active_device(&fake).unwrap();
        assert_eq!(resolve_signal_source(&device, &fake), None);
    }

    #[test]
    fn first_matching_accessory_wins() {
        let fake = FakePlatform::wireless("AC:DE:48:00:11:22");
        fake.with(|s| {
            s.accessories.insert(
                0,
                Accessory {
                    address: "00:00:00:00:00:01".to_string(),
                    name: Some("Other".to_string()),
                    connected: true,
                },
            );
            s.accessories.push(Accessory {
                address: "AC:DE:48:00:11:22".to_string(),
                name: Some("Duplicate".to_string()),
                connected: true,
            });
            s.steady_level = Some(-60);
        });
        let device = resolve_active_device(&fake).unwrap();
        let source = resolve_signal_source(&device, &fake).unwrap();
        assert_eq!(source.name.as_deref(), Some("Fake Headset"));
    }

    #[test]
    fn failed_signal_read_yields_none() {
        let fake = FakePlatform::wireless("AC:DE:48:00:11:22");
        let device = resolve_active_device(&fake).unwrap();
        assert_eq!(resolve_signal_source(&device, &fake), None);
    }

    #[test]
    fn strips_direction_suffixes() {
        assert_eq!(strip_direction("ac-de-48-00-11-22:input"), "ac-de-48-00-11-22");
        assert_eq!(strip_direction("AC:DE:48:00:11:22-output"), "AC:DE:48:00:11:22");
        assert_eq!(strip_direction("BuiltInMicrophoneDevice"), "BuiltInMicrophoneDevice");
    }
}
