//! List available audio input devices.

use crate::recording::microphone::suppress_alsa_warnings;
use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

struct DeviceSummary {
    name: String,
    is_default: bool,
    config: Option<(u32, u16)>,
}

/// Lists all audio input devices with the index `audio.device` accepts.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> anyhow::Result<()> {
    let devices = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let summaries: Vec<DeviceSummary> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter_map(|device| {
                let name = device.name().ok()?;
                let config = device
                    .default_input_config()
                    .ok()
                    .map(|c| (c.sample_rate().0, c.channels()));
                Some(DeviceSummary {
                    is_default: default_name.as_deref() == Some(name.as_str()),
                    name,
                    config,
                })
            })
            .collect();
        anyhow::Ok(summaries)
    })?;

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        return Ok(());
    }

    println!("Available audio input devices:");
    println!();
    for (index, device) in devices.iter().enumerate() {
        let default_indicator = if device.is_default { " [DEFAULT]" } else { "" };
        println!("  ID: {index}");
        println!("    Name: {}{}", device.name, default_indicator);
        match device.config {
            Some((sample_rate, channels)) => {
                println!("    Config: {sample_rate}Hz, {channels} channels")
            }
            None => println!("    Config: unavailable"),
        }
        println!();
    }
    println!("Set [audio] device in voxmemo.toml to an ID or a name.");

    Ok(())
}
