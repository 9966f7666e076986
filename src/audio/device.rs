//! Input device enumeration and format negotiation

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::SampleFormat;

use crate::error::AudioError;
use crate::protocol::AudioDeviceInfo;

/// List all input devices on the default host
pub fn list_input_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    if let Ok(input_devices) = host.input_devices() {
        for device in input_devices {
            if let Ok(name) = device.name() {
                let (sample_rates, channels) = get_device_capabilities(&device);
                devices.push(AudioDeviceInfo {
                    is_default: default_name.as_ref() == Some(&name),
                    name,
                    sample_rates,
                    channels,
                });
            }
        }
    }

    devices
}

fn get_device_capabilities(device: &cpal::Device) -> (Vec<u32>, Vec<u16>) {
    let mut rates = Vec::new();
    let mut chans = Vec::new();

    if let Ok(configs) = device.supported_input_configs() {
        for config in configs {
            for rate_val in [16000u32, 24000, 44100, 48000] {
                let rate = cpal::SampleRate(rate_val);
                if rate >= config.min_sample_rate()
                    && rate <= config.max_sample_rate()
                    && !rates.contains(&rate_val)
                {
                    rates.push(rate_val);
                }
            }

            let ch = config.channels();
            if !chans.contains(&ch) {
                chans.push(ch);
            }
        }
    }

    rates.sort();
    chans.sort();
    (rates, chans)
}

/// Resolve an input device by name, or the host default when `name` is `None`
pub fn input_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();

    let Some(name) = name else {
        return host
            .default_input_device()
            .ok_or_else(|| AudioError::DeviceNotFound("No default input device".to_string()));
    };

    let devices = host
        .input_devices()
        .map_err(|e| AudioError::DeviceNotFound(e.to_string()))?;

    for device in devices {
        if device.name().map(|n| n == name).unwrap_or(false) {
            return Ok(device);
        }
    }

    Err(AudioError::DeviceNotFound(name.to_string()))
}

/// Pick a sample format the device can deliver at `sample_rate` with
/// `channels` channels. 16-bit is preferred; f32 is converted in the
/// callback.
pub fn negotiate_format(
    device: &cpal::Device,
    sample_rate: u32,
    channels: u16,
) -> Result<SampleFormat, AudioError> {
    let configs: Vec<_> = device
        .supported_input_configs()
        .map_err(|e| AudioError::CpalError(e.to_string()))?
        .collect();

    let rate = cpal::SampleRate(sample_rate);
    let supports = |format: SampleFormat| {
        configs.iter().any(|c| {
            c.channels() == channels
                && c.sample_format() == format
                && rate >= c.min_sample_rate()
                && rate <= c.max_sample_rate()
        })
    };

    [SampleFormat::I16, SampleFormat::F32]
        .into_iter()
        .find(|format| supports(*format))
        .ok_or_else(|| {
            AudioError::UnsupportedFormat(format!(
                "no {}-channel input at {} Hz",
                channels, sample_rate
            ))
        })
}
