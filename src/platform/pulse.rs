//! PulseAudio / PipeWire input devices through `pactl`

use super::{AudioSystem, DeviceId, TransportKind, normalize_address, run_command};
use crate::error::PlatformError;

const PACTL: &str = "pactl";

/// Suffix marking the capture direction of a wireless device UID
pub const INPUT_SUFFIX: &str = ":input";

/// Audio backend driving the default PulseAudio/PipeWire source
#[derive(Debug, Default, Clone)]
pub struct PulseAudio;

impl PulseAudio {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSystem for PulseAudio {
    fn default_input_device(&self) -> Result<DeviceId, PlatformError> {
        let stdout = run_command(PACTL, &["get-default-source"])?;
        parse_default_source(&stdout).map(DeviceId)
    }

    fn transport_kind(&self, device: &DeviceId) -> Result<TransportKind, PlatformError> {
        Ok(classify_source(&device.0))
    }

    fn unique_id(&self, device: &DeviceId) -> Result<String, PlatformError> {
        source_uid(&device.0)
    }

    fn set_input_gain(&self, device: &DeviceId, level: f64) -> Result<(), PlatformError> {
        let volume = volume_arg(level);
        run_command(PACTL, &["set-source-volume", &device.0, &volume]).map(|_| ())
    }
}

fn parse_default_source(stdout: &str) -> Result<String, PlatformError> {
    let name = stdout.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(PlatformError::Parse(format!(
            "default source name {:?}",
            stdout
        )));
    }
    Ok(name.to_string())
}

/// Classify a source from its name prefix
pub fn classify_source(name: &str) -> TransportKind {
    if name.ends_with(".monitor") {
        TransportKind::Other
    } else if name.starts_with("bluez_") {
        TransportKind::Bluetooth
    } else if name.starts_with("alsa_input.usb-") {
        TransportKind::Usb
    } else if name.starts_with("alsa_input.pci-") || name.starts_with("alsa_input.platform-") {
        TransportKind::BuiltIn
    } else {
        TransportKind::Other
    }
}

/// UID for a source. Wireless sources yield `<ADDRESS>:input`, everything
/// else uses the source name as is.
pub fn source_uid(name: &str) -> Result<String, PlatformError> {
    if classify_source(name) != TransportKind::Bluetooth {
        return Ok(name.to_string());
    }

    // bluez_input.AC:DE:48:00:11:22.0 or bluez_source.AC_DE_48_00_11_22.handsfree_head_unit
    let address = name
        .split('.')
        .nth(1)
        .and_then(normalize_address)
        .ok_or_else(|| PlatformError::Parse(format!("no address in source name {}", name)))?;

    Ok(format!("{}{}", address, INPUT_SUFFIX))
}

fn volume_arg(level: f64) -> String {
    let percent = (level.clamp(0.0, 1.0) * 100.0).round() as u32;
    format!("{}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_source_line() {
        assert_eq!(
            parse_default_source("bluez_input.AC:DE:48:00:11:22.0\n").unwrap(),
            "bluez_input.AC:DE:48:00:11:22.0"
        );
        assert!(parse_default_source("\n").is_err());
        assert!(parse_default_source("Connection failure: refused").is_err());
    }

    #[test]
    fn classifies_sources_by_name() {
        assert_eq!(
            classify_source("bluez_input.AC:DE:48:00:11:22.0"),
            TransportKind::Bluetooth
        );
        assert_eq!(
            classify_source("alsa_input.usb-Blue_Microphones_Yeti-00.analog-stereo"),
            TransportKind::Usb
        );
        assert_eq!(
            classify_source("alsa_input.pci-0000_00_1f.3.analog-stereo"),
            TransportKind::BuiltIn
        );
        assert_eq!(
            classify_source("bluez_output.AC_DE_48_00_11_22.1.monitor"),
            TransportKind::Other
        );
    }

    #[test]
    fn wireless_uid_carries_address_and_direction() {
        assert_eq!(
            source_uid("bluez_input.ac:de:48:00:11:22.0").unwrap(),
            "AC:DE:48:00:11:22:input"
        );
        assert_eq!(
            source_uid("bluez_source.AC_DE_48_00_11_22.handsfree_head_unit").unwrap(),
            "AC:DE:48:00:11:22:input"
        );
    }

    #[test]
    fn wired_uid_is_source_name() {
        let name = "alsa_input.pci-0000_00_1f.3.analog-stereo";
        assert_eq!(source_uid(name).unwrap(), name);
    }

    #[test]
    fn wireless_source_without_address_is_an_error() {
        assert!(source_uid("bluez_input.headset").is_err());
    }

    #[test]
    fn volume_is_rounded_percentage() {
        assert_eq!(volume_arg(0.95), "95%");
        assert_eq!(volume_arg(0.204), "20%");
        assert_eq!(volume_arg(1.7), "100%");
    }
}
