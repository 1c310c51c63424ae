//! Output device enumeration.

use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::{Error, Result};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio output device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDevice {
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz, if the device reports one.
    pub default_sample_rate: Option<u32>,
    /// Whether this is the host's default output device.
    pub is_default: bool,
}

/// List the output devices of the default host.
///
/// Devices whose name cannot be read are skipped.
pub fn list_output_devices() -> Result<Vec<OutputDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let outputs = host
        .output_devices()
        .map_err(|e| Error::Host(e.to_string()))?;

    let mut devices = Vec::new();
    for device in outputs {
        let Ok(name) = device_name(&device) else {
            continue;
        };
        if devices.iter().any(|d: &OutputDevice| d.name == name) {
            continue;
        }
        let default_sample_rate = device.default_output_config().ok().map(|c| c.sample_rate());
        devices.push(OutputDevice {
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
            default_sample_rate,
        });
    }
    tracing::debug!(count = devices.len(), "output devices listed");
    Ok(devices)
}
