//! Process-wide engine constants.
//!
//! The sample rate, output attenuation, render block size and control rate are
//! fixed once a [`Patch`](crate::Patch) is built. They are not negotiated with
//! the audio device.

use std::time::Duration;

/// Audio sample rate in Hz.
pub const SAMPLE_RATE: f64 = 19200.0;

/// Output attenuation applied to every rendered sample.
pub const VOLUME: f64 = 0.5;

/// Frames requested per render callback.
pub const FRAMES_PER_BUFFER: u32 = 1024;

/// Control-loop ticks per second.
pub const CONTROL_RATE: f64 = 128.0;

/// Number of external input slots.
pub const INPUT_SLOTS: usize = 8;

/// Engine timing and output configuration.
///
/// ## Fields
///
/// - `sample_rate`: Audio sample rate in Hz (default: 19200)
/// - `volume`: Output attenuation factor (default: 0.5)
/// - `frames_per_buffer`: Render block size in frames (default: 1024)
/// - `control_rate`: Control-loop ticks per second (default: 128)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f64,
    /// Output attenuation factor.
    pub volume: f64,
    /// Render block size in frames.
    pub frames_per_buffer: u32,
    /// Control-loop ticks per second.
    pub control_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            volume: VOLUME,
            frames_per_buffer: FRAMES_PER_BUFFER,
            control_rate: CONTROL_RATE,
        }
    }
}

impl EngineConfig {
    /// Elapsed time added to a playing chain per control tick, in samples.
    ///
    /// At the defaults this is `19200 / 128 = 150` samples.
    #[inline]
    pub fn control_step(&self) -> f64 {
        self.sample_rate / self.control_rate
    }

    /// Whole number of frames rendered per control tick in offline rendering.
    #[inline]
    pub fn frames_per_tick(&self) -> usize {
        self.control_step().round().max(1.0) as usize
    }

    /// Wall-clock period of the control loop.
    pub fn control_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.control_rate)
    }

    /// Converts seconds to a sample count at this sample rate.
    #[inline]
    pub fn seconds_to_samples(&self, seconds: f64) -> f64 {
        seconds * self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 19200.0);
        assert_eq!(config.volume, 0.5);
        assert_eq!(config.frames_per_buffer, 1024);
        assert_eq!(config.control_rate, 128.0);
    }

    #[test]
    fn control_step_is_150_samples() {
        let config = EngineConfig::default();
        assert_eq!(config.control_step(), 150.0);
        assert_eq!(config.frames_per_tick(), 150);
    }

    #[test]
    fn control_period_is_one_128th_second() {
        let period = EngineConfig::default().control_period();
        assert!((period.as_secs_f64() - 1.0 / 128.0).abs() < 1e-9);
    }
}
