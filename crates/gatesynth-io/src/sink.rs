//! cpal-backed audio sink.
//!
//! [`CpalSink`] opens one mono `f32` output stream per playing chain on the
//! platform's default host (ALSA, CoreAudio, WASAPI). The engine's render
//! callback is called from cpal's audio thread with whatever buffer size the
//! device delivers.

use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use gatesynth_core::{
    AudioSink, RenderCallback, RenderConfig, RenderStream, SinkError, StreamControl, StreamHandle,
};

use crate::devices::device_name;

/// Audio sink playing through a cpal output device.
///
/// With no device name the host's default output device is used; otherwise
/// the first output device whose name contains the given string
/// (case-insensitive).
pub struct CpalSink {
    host: Host,
    device: Option<String>,
}

impl CpalSink {
    /// Sink on the default host, optionally pinned to a named device.
    pub fn new(device: Option<String>) -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), device = ?device, "cpal sink initialized");
        Self { host, device }
    }

    /// The requested device name, if any.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    fn find_output_device(&self) -> Result<cpal::Device, SinkError> {
        let Some(search) = self.device.as_deref() else {
            return self.host.default_output_device().ok_or(SinkError::NoDevice);
        };
        let search_lower = search.to_lowercase();
        let devices = self
            .host
            .output_devices()
            .map_err(|e| SinkError::Stream(e.to_string()))?;

        for device in devices {
            if let Ok(name) = device_name(&device)
                && name.to_lowercase().contains(search_lower.as_str())
            {
                return Ok(device);
            }
        }
        Err(SinkError::DeviceNotFound(format!(
            "no output device matching '{}'",
            search
        )))
    }
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioSink for CpalSink {
    fn name(&self) -> &str {
        "cpal"
    }

    fn open(
        &mut self,
        config: &RenderConfig,
        callback: RenderCallback,
    ) -> Result<StreamHandle, SinkError> {
        let device = self.find_output_device()?;
        let stream = build_stream(&device, config, callback)?;
        tracing::debug!(
            sample_rate = config.sample_rate,
            frames_per_buffer = config.frames_per_buffer,
            "output stream started"
        );
        Ok(StreamHandle::new(CpalStream(stream)))
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &RenderConfig,
    mut callback: RenderCallback,
) -> Result<cpal::Stream, SinkError> {
    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: config.sample_rate,
        buffer_size: cpal::BufferSize::Fixed(config.frames_per_buffer),
    };

    // Once the callback reports completion it is not called again; the
    // stream plays silence until the scheduler closes it.
    let mut complete = false;
    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if complete {
                    data.fill(0.0);
                } else if callback(data) == StreamControl::Complete {
                    complete = true;
                }
            },
            move |err| {
                tracing::warn!(error = %err, "output stream error");
            },
            None,
        )
        .map_err(|e| SinkError::Stream(e.to_string()))?;

    stream.play().map_err(|e| SinkError::Stream(e.to_string()))?;
    Ok(stream)
}

impl std::fmt::Debug for CpalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalSink")
            .field("host", &self.host.id().name())
            .field("device", &self.device)
            .finish()
    }
}

/// Running cpal stream. Dropping it releases the device.
struct CpalStream(cpal::Stream);

impl RenderStream for CpalStream {
    fn stop(&mut self) -> Result<(), SinkError> {
        self.0.pause().map_err(|e| SinkError::Stream(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_name() {
        assert_eq!(CpalSink::new(None).name(), "cpal");
    }

    #[test]
    fn unknown_device_is_an_error() {
        let mut sink = CpalSink::new(Some("no-such-device-gatesynth".into()));
        let callback: RenderCallback = Box::new(|out: &mut [f32]| {
            out.fill(0.0);
            StreamControl::Continue
        });
        // Without an audio host the lookup fails earlier, with a stream error.
        let err = sink.open(&RenderConfig::default(), callback).unwrap_err();
        assert!(matches!(
            err,
            SinkError::DeviceNotFound(_) | SinkError::Stream(_)
        ));
    }

    #[test]
    fn debug_shows_device() {
        let sink = CpalSink::new(Some("usb".into()));
        assert!(format!("{:?}", sink).contains("usb"));
        assert_eq!(sink.device(), Some("usb"));
    }
}
