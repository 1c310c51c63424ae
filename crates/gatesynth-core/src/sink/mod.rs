//! Audio sink contract.
//!
//! The engine renders each playing chain through its own output stream. An
//! [`AudioSink`] opens such a stream from a [`RenderConfig`] and a pull-style
//! [`RenderCallback`]: the sink calls back with a buffer to fill and the
//! callback answers whether the stream should keep running.
//!
//! Streams are owned through a [`StreamHandle`]. Closing the handle (or
//! dropping it) stops the underlying stream. The trait is object-safe so the
//! control scheduler can hold a `Box<dyn AudioSink>` chosen at runtime:
//!
//! - [`OfflineSink`] renders on demand for tests and file output
//! - a cpal-backed sink plays through a hardware device

mod offline;

pub use offline::{OfflineSink, render_ticks};

use crate::config::EngineConfig;

/// Errors raised by audio sinks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// No audio output device is available.
    #[error("no audio output device available")]
    NoDevice,
    /// The requested output device does not exist.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    /// Opening, starting or stopping a stream failed.
    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Stream parameters requested from a sink.
///
/// The engine always renders mono `f32` at its own sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count; always 1.
    pub channels: u16,
    /// Frames per callback.
    pub frames_per_buffer: u32,
}

impl RenderConfig {
    /// Mono stream matching the engine configuration.
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            sample_rate: config.sample_rate.round() as u32,
            channels: 1,
            frames_per_buffer: config.frames_per_buffer,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_engine(&EngineConfig::default())
    }
}

/// Answer from a render callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamControl {
    /// Keep calling back.
    Continue,
    /// The stream has nothing more to render.
    Complete,
}

/// Pull callback filling one buffer of mono samples.
///
/// Runs on the sink's render thread; it must not block indefinitely.
pub type RenderCallback = Box<dyn FnMut(&mut [f32]) -> StreamControl + Send>;

/// Backend-specific stream object held by a [`StreamHandle`].
pub trait RenderStream: Send {
    /// Stops rendering. Calling it on a stopped stream succeeds.
    fn stop(&mut self) -> Result<(), SinkError>;
}

/// Opens render streams.
pub trait AudioSink: Send {
    /// Human-readable sink name.
    fn name(&self) -> &str;

    /// Opens and starts a stream that pulls samples from `callback`.
    fn open(
        &mut self,
        config: &RenderConfig,
        callback: RenderCallback,
    ) -> Result<StreamHandle, SinkError>;
}

/// Owned, type-erased stream.
///
/// The stream runs while the handle exists; [`close()`](Self::close) stops it
/// and reports failure, dropping stops it and ignores failure.
pub struct StreamHandle {
    inner: Option<Box<dyn RenderStream>>,
}

impl StreamHandle {
    /// Wraps a backend stream.
    pub fn new<S: RenderStream + 'static>(stream: S) -> Self {
        Self {
            inner: Some(Box::new(stream)),
        }
    }

    /// Returns `true` until the stream has been stopped.
    pub fn is_running(&self) -> bool {
        self.inner.is_some()
    }

    /// Stops the stream. A stopped handle stays stopped.
    pub fn stop(&mut self) -> Result<(), SinkError> {
        match self.inner.take() {
            Some(mut stream) => stream.stop(),
            None => Ok(()),
        }
    }

    /// Stops the stream and releases the handle.
    pub fn close(mut self) -> Result<(), SinkError> {
        self.stop()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "stream stop on drop failed");
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
