//! Audio I/O for the gatesynth engine.
//!
//! This crate provides:
//!
//! - **Device playback**: [`CpalSink`], the cpal implementation of
//!   [`AudioSink`](gatesynth_core::AudioSink), opening one mono output
//!   stream per playing chain
//! - **Device enumeration**: [`list_output_devices`]
//! - **WAV file I/O**: [`write_wav`] and [`read_wav`] for offline renders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gatesynth_core::{ControlScheduler, EngineConfig, InputVector, Patch};
//! use gatesynth_io::CpalSink;
//!
//! let patch = Patch::new("empty", EngineConfig::default(), InputVector::new());
//! let sink = CpalSink::new(None);
//! let mut scheduler = ControlScheduler::new(patch, Box::new(sink));
//! scheduler.tick()?;
//! ```

mod devices;
mod sink;
mod wav;

pub use devices::{OutputDevice, list_output_devices};
pub use sink::CpalSink;
pub use wav::{read_wav, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Device enumeration or host error.
    #[error("Audio host error: {0}")]
    Host(String),

    /// The WAV file is not in the format the engine renders.
    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
