//! Live capture through cpal's default input device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::processor::AudioProcessor;
use crate::config::SessionConfig;
use crate::error::SessionError;

/// A running capture session.
///
/// Field order matters: the stream is dropped first, which stops the
/// backend and joins any in-flight callback before the buffers, transform
/// plan and file handle owned by the processor are released.
pub struct Session {
    stream: cpal::Stream,
    processor: AudioProcessor,
}

impl Session {
    /// Opens the default input device and starts capturing. Any failure
    /// here is fatal for the session.
    pub fn start(requested: SessionConfig) -> Result<Self, SessionError> {
        requested.validate()?;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(SessionError::NoInputDevice)?;

        let default_config = device
            .default_input_config()
            .map_err(|e| SessionError::DeviceQuery(e.to_string()))?;

        let max_channels = device
            .supported_input_configs()
            .map_err(|e| SessionError::DeviceQuery(e.to_string()))?
            .map(|range| range.channels() as usize)
            .max()
            .unwrap_or(default_config.channels() as usize);

        let config = negotiate_channels(requested, max_channels)?;

        log::info!(
            "Audio input: {} @ {}Hz, {} frames per block",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate,
            config.frames_per_block
        );

        let buffer_size = match default_config.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max }
                if (*min..=*max).contains(&(config.frames_per_block as u32)) =>
            {
                cpal::BufferSize::Fixed(config.frames_per_block as u32)
            }
            _ => {
                log::warn!(
                    "Device cannot guarantee {} frames per callback; blocks will be assembled from whatever it delivers",
                    config.frames_per_block
                );
                cpal::BufferSize::Default
            }
        };

        let stream_config = cpal::StreamConfig {
            channels: config.channels as u16,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size,
        };

        let (processor, mut callback) = AudioProcessor::new(config)?;

        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| callback.process(data),
            |err| log::error!("Audio stream error: {}", err),
            None,
        )?;

        stream.play()?;

        log::info!("Audio processor initialized with {} channels.", config.channels);

        Ok(Self { stream, processor })
    }

    pub fn processor(&self) -> &AudioProcessor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut AudioProcessor {
        &mut self.processor
    }

    /// Stops the stream, then releases everything in order.
    pub fn stop(self) -> Result<(), SessionError> {
        let Session { stream, processor } = self;
        let paused = stream.pause();
        drop(stream);
        drop(processor);
        log::info!("Audio session closed");
        paused.map_err(SessionError::from)
    }
}

/// Adopts the device's channel count when it offers fewer than requested.
pub fn negotiate_channels(
    requested: SessionConfig,
    device_max: usize,
) -> Result<SessionConfig, SessionError> {
    if device_max == 0 {
        return Err(SessionError::DeviceQuery(
            "input device reports no input channels".into(),
        ));
    }
    if device_max < requested.channels {
        log::warn!(
            "Device does not support {} channels. Using {} channels instead.",
            requested.channels,
            device_max
        );
        return Ok(requested.with_channels(device_max));
    }
    Ok(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_requested_channels_when_supported() {
        let requested = SessionConfig::default();
        let config = negotiate_channels(requested, 8).unwrap();
        assert_eq!(config.channels, 2);
    }

    #[test]
    fn adopts_fewer_channels() {
        let requested = SessionConfig::default();
        let config = negotiate_channels(requested, 1).unwrap();
        assert_eq!(config.channels, 1);
        assert_eq!(config.block_len(), requested.frames_per_block);
    }

    #[test]
    fn no_channels_is_fatal() {
        assert!(negotiate_channels(SessionConfig::default(), 0).is_err());
    }
}
