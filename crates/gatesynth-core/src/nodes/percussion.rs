//! Noise-based sources: white noise, kick drum and hi-hat.
//!
//! Lengths are sample counts at the engine sample rate. Each node owns its
//! own [`NoiseRng`]; reset reseeds it so a replayed chain produces the same
//! samples as its first play.

use super::{NoiseRng, Transfer, angle};
use crate::config::SAMPLE_RATE;
use crate::param::{ParamContext, Parameter};

/// Uniform white noise in `[translate - amplitude, translate + amplitude)`.
///
/// Re-sampled every step; no memory beyond the generator state.
#[derive(Debug, Clone)]
pub struct Noise {
    /// Half-width of the noise range.
    pub amplitude: f64,
    /// Center of the noise range.
    pub translate: f64,
    rng: NoiseRng,
}

impl Noise {
    /// Unit-amplitude noise centered on zero.
    pub fn new() -> Self {
        Self {
            amplitude: 1.0,
            translate: 0.0,
            rng: NoiseRng::new(NoiseRng::DEFAULT_SEED),
        }
    }

    /// Sets the half-width of the noise range.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Sets the center of the noise range.
    pub fn with_translate(mut self, translate: f64) -> Self {
        self.translate = translate;
        self
    }

    /// Sets the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = NoiseRng::new(seed);
        self
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::new()
    }
}

impl Transfer for Noise {
    #[inline]
    fn transfer(&mut self, _input: f64, _age: u64, _ctx: &ParamContext<'_>) -> f64 {
        self.translate + self.amplitude * (2.0 * self.rng.next_f64() - 1.0)
    }

    fn reset(&mut self) {
        self.rng.reseed();
    }
}

/// Two-phase kick drum.
///
/// For ages in `(0, length)` it outputs a noise burst
/// `translate + U[0,1) * amplitude`; for ages in `[length, length + sustain)`
/// a sine at `frequency`; afterwards silence. Age 0 is silent.
#[derive(Debug, Clone)]
pub struct KickDrum {
    /// Sustain frequency in Hz.
    pub frequency: Parameter,
    /// Noise-burst length in samples.
    pub length: f64,
    /// Peak amplitude of both phases.
    pub amplitude: f64,
    /// Offset applied to the noise burst.
    pub translate: f64,
    /// Sine-sustain length in samples.
    pub sustain: f64,
    rng: NoiseRng,
}

impl KickDrum {
    /// 75 Hz kick with a 5 ms burst and 30 ms sustain at the engine sample rate.
    pub fn new() -> Self {
        Self {
            frequency: Parameter::constant(75.0),
            length: 0.005 * SAMPLE_RATE,
            amplitude: 2.0,
            translate: 0.0,
            sustain: 0.03 * SAMPLE_RATE,
            rng: NoiseRng::new(NoiseRng::DEFAULT_SEED ^ 0x4B49_434B),
        }
    }

    /// Sets the sustain frequency.
    pub fn with_frequency(mut self, frequency: Parameter) -> Self {
        self.frequency = frequency;
        self
    }

    /// Sets the burst and sustain lengths in samples.
    pub fn with_lengths(mut self, length: f64, sustain: f64) -> Self {
        self.length = length;
        self.sustain = sustain;
        self
    }

    /// Sets the peak amplitude.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Sets the burst offset.
    pub fn with_translate(mut self, translate: f64) -> Self {
        self.translate = translate;
        self
    }

    /// Sets the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = NoiseRng::new(seed);
        self
    }
}

impl Default for KickDrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Transfer for KickDrum {
    fn transfer(&mut self, _input: f64, age: u64, ctx: &ParamContext<'_>) -> f64 {
        let x = age as f64;
        if 0.0 < x && x < self.length {
            self.translate + self.rng.next_f64() * self.amplitude
        } else if self.length <= x && x < self.length + self.sustain {
            let freq = self.frequency.resolve(ctx);
            self.amplitude * libm::sin(angle(age, ctx.sample_rate, freq))
        } else {
            0.0
        }
    }

    fn reset(&mut self) {
        self.rng.reseed();
    }
}

/// Filtered-noise hi-hat burst.
///
/// For ages below `length` it outputs `translate + U[pass_filter, 1) * amplitude`,
/// then silence. Raising `pass_filter` removes the quiet end of the noise.
#[derive(Debug, Clone)]
pub struct HiHat {
    /// Lower bound of the uniform noise range.
    pub pass_filter: f64,
    /// Burst length in samples.
    pub length: f64,
    /// Peak amplitude.
    pub amplitude: f64,
    /// DC offset during the burst.
    pub translate: f64,
    rng: NoiseRng,
}

impl HiHat {
    /// 20 ms unfiltered hi-hat at the engine sample rate.
    pub fn new() -> Self {
        Self {
            pass_filter: 0.0,
            length: 0.02 * SAMPLE_RATE,
            amplitude: 1.0,
            translate: 0.0,
            rng: NoiseRng::new(NoiseRng::DEFAULT_SEED ^ 0x4841_5448),
        }
    }

    /// Sets the lower bound of the noise range.
    pub fn with_pass_filter(mut self, pass_filter: f64) -> Self {
        self.pass_filter = pass_filter;
        self
    }

    /// Sets the burst length in samples.
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Sets the peak amplitude.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Sets the DC offset.
    pub fn with_translate(mut self, translate: f64) -> Self {
        self.translate = translate;
        self
    }

    /// Sets the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = NoiseRng::new(seed);
        self
    }
}

impl Default for HiHat {
    fn default() -> Self {
        Self::new()
    }
}

impl Transfer for HiHat {
    fn transfer(&mut self, _input: f64, age: u64, _ctx: &ParamContext<'_>) -> f64 {
        if (age as f64) < self.length {
            self.translate + self.rng.uniform(self.pass_filter, 1.0) * self.amplitude
        } else {
            0.0
        }
    }

    fn reset(&mut self) {
        self.rng.reseed();
    }
}
