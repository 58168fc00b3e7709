// CpalOutput - level tone through the default output device
//
// cpal streams are not Send, so each cue opens a short-lived stream on its own
// thread, keeps it alive for the tone duration and drops it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::cue::ToneOutput;
use super::envelope::ToneEnvelope;
use crate::error::{log_audio_error, AudioError};

/// Extra time the stream stays open after the last sample
const TAIL: Duration = Duration::from_millis(50);

pub struct CpalOutput {
    device_name: String,
    sample_rate: u32,
}

impl CpalOutput {
    /// Probe the default output device
    pub fn new() -> Result<Self, AudioError> {
        let (device, config) = default_output()?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let sample_rate = config.sample_rate().0;
        log::info!(
            "[CpalOutput] Using output device '{}' at {} Hz",
            device_name,
            sample_rate
        );
        Ok(Self {
            device_name,
            sample_rate,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl ToneOutput for CpalOutput {
    fn play(&self, envelope: &ToneEnvelope) -> Result<(), AudioError> {
        let envelope = *envelope;
        thread::Builder::new()
            .name("level-tone".to_string())
            .spawn(move || {
                if let Err(err) = play_blocking(&envelope) {
                    log_audio_error(&err, "CpalOutput::play");
                }
            })
            .map(|_| ())
            .map_err(|err| AudioError::StreamOpenFailed {
                reason: err.to_string(),
            })
    }
}

fn default_output() -> Result<(cpal::Device, cpal::SupportedStreamConfig), AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable {
            reason: "No default output device found".to_string(),
        })?;

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceUnavailable {
            reason: format!("Failed to get default output config: {:?}", e),
        })?;

    Ok((device, config))
}

fn play_blocking(envelope: &ToneEnvelope) -> Result<(), AudioError> {
    let (device, config) = default_output()?;
    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(AudioError::UnsupportedFormat {
            format: format!("{:?}", config.sample_format()),
        });
    }

    let stream_config: cpal::StreamConfig = config.into();
    let channels_count = stream_config.channels as usize;
    let samples = Arc::new(envelope.render(stream_config.sample_rate.0));
    let position = Arc::new(AtomicUsize::new(0));

    let callback_samples = Arc::clone(&samples);
    let callback_position = Arc::clone(&position);
    let err_fn = |err| log::error!("[CpalOutput] Output stream error: {}", err);

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = callback_position.load(Ordering::Relaxed);
                for frame in data.chunks_mut(channels_count) {
                    let value = callback_samples.get(pos).copied().unwrap_or(0.0);
                    pos += 1;
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }
                callback_position.store(pos, Ordering::Relaxed);
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

    stream.play().map_err(|e| AudioError::StreamOpenFailed {
        reason: format!("{:?}", e),
    })?;

    thread::sleep(Duration::from_millis(envelope.duration_ms as u64) + TAIL);
    drop(stream);
    Ok(())
}
