//! Periodic source nodes.
//!
//! All oscillators evaluate a closed-form waveform at
//! `age / sample_rate * frequency` cycles. Frequency is a [`Parameter`], so
//! another chain's output or an external input can modulate it.

use core::f64::consts::PI;

use super::{Transfer, angle};
use crate::param::{ParamContext, Parameter};

/// Sine oscillator: `translate + amplitude * sin(2π t f)`.
#[derive(Debug, Clone)]
pub struct Sine {
    /// Frequency in Hz.
    pub frequency: Parameter,
    /// Peak amplitude.
    pub amplitude: f64,
    /// DC offset.
    pub translate: f64,
}

impl Sine {
    /// Unit-amplitude sine at `frequency`.
    pub fn new(frequency: Parameter) -> Self {
        Self {
            frequency,
            amplitude: 1.0,
            translate: 0.0,
        }
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
}

impl Transfer for Sine {
    #[inline]
    fn transfer(&mut self, _input: f64, age: u64, ctx: &ParamContext<'_>) -> f64 {
        let freq = self.frequency.resolve(ctx);
        self.translate + self.amplitude * libm::sin(angle(age, ctx.sample_rate, freq))
    }
}

/// Square oscillator: the sign of the matching sine, scaled by `amplitude`.
///
/// Zero crossings take the sign of the zero, so age 0 outputs `+amplitude`.
#[derive(Debug, Clone)]
pub struct Square {
    /// Frequency in Hz.
    pub frequency: Parameter,
    /// Peak amplitude.
    pub amplitude: f64,
}

impl Square {
    /// Unit-amplitude square at `frequency`.
    pub fn new(frequency: Parameter) -> Self {
        Self {
            frequency,
            amplitude: 1.0,
        }
    }

    /// Sets the peak amplitude.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }
}

impl Transfer for Square {
    #[inline]
    fn transfer(&mut self, _input: f64, age: u64, ctx: &ParamContext<'_>) -> f64 {
        let freq = self.frequency.resolve(ctx);
        self.amplitude * libm::copysign(1.0, libm::sin(angle(age, ctx.sample_rate, freq)))
    }
}

/// Triangle oscillator: `translate + amplitude * (2/π) * asin(sin(2π t f))`.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Frequency in Hz.
    pub frequency: Parameter,
    /// Peak amplitude.
    pub amplitude: f64,
    /// DC offset.
    pub translate: f64,
}

impl Triangle {
    /// Unit-amplitude triangle at `frequency`.
    pub fn new(frequency: Parameter) -> Self {
        Self {
            frequency,
            amplitude: 1.0,
            translate: 0.0,
        }
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
}

impl Transfer for Triangle {
    #[inline]
    fn transfer(&mut self, _input: f64, age: u64, ctx: &ParamContext<'_>) -> f64 {
        let freq = self.frequency.resolve(ctx);
        let s = libm::sin(angle(age, ctx.sample_rate, freq));
        self.translate + self.amplitude * (2.0 / PI) * libm::asin(s)
    }
}

/// Sawtooth built from the arccotangent: `amplitude * -(2/π) * atan(cot(π t / P))`
/// where `P = sample_rate / frequency` is the period in samples.
///
/// The cotangent is undefined at every multiple of the period, and the
/// whole expression is undefined for a zero frequency. Those points output 0.
#[derive(Debug, Clone)]
pub struct Sawtooth {
    /// Frequency in Hz.
    pub frequency: Parameter,
    /// Peak amplitude.
    pub amplitude: f64,
}

impl Sawtooth {
    /// Unit-amplitude sawtooth at `frequency`.
    pub fn new(frequency: Parameter) -> Self {
        Self {
            frequency,
            amplitude: 1.0,
        }
    }

    /// Sets the peak amplitude.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }
}

impl Transfer for Sawtooth {
    #[inline]
    fn transfer(&mut self, _input: f64, age: u64, ctx: &ParamContext<'_>) -> f64 {
        let freq = self.frequency.resolve(ctx);
        if freq == 0.0 {
            return 0.0;
        }
        let period = ctx.sample_rate / freq;
        let tan = libm::tan(age as f64 * PI / period);
        if tan == 0.0 || !tan.is_finite() {
            return 0.0;
        }
        let value = self.amplitude * (-2.0 / PI * libm::atan(1.0 / tan));
        if value.is_finite() { value } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputVector;

    const SR: f64 = 19200.0;

    fn run<T: Transfer>(node: &mut T, age: u64) -> f64 {
        let inputs = InputVector::new();
        let ctx = ParamContext::new(&[], &[], &inputs, SR);
        node.transfer(0.0, age, &ctx)
    }

    #[test]
    fn sine_starts_at_translate() {
        let mut sine = Sine::new(Parameter::constant(440.0)).with_translate(0.1);
        assert_eq!(run(&mut sine, 0), 0.1);
    }

    #[test]
    fn sine_quarter_period_peaks() {
        // 480 Hz at 19200 Hz has a 40-sample period.
        let mut sine = Sine::new(Parameter::constant(480.0)).with_amplitude(2.0);
        assert!((run(&mut sine, 10) - 2.0).abs() < 1e-12);
        assert!((run(&mut sine, 30) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn sine_follows_input_frequency() {
        let inputs = InputVector::new();
        inputs.set(2, 480.0);
        let ctx = ParamContext::new(&[], &[], &inputs, SR);
        let mut sine = Sine::new(Parameter::input(2));
        assert!((sine.transfer(0.0, 10, &ctx) - 1.0).abs() < 1e-12);
        inputs.set(2, 0.0);
        assert_eq!(sine.transfer(0.0, 10, &ctx), 0.0);
    }

    #[test]
    fn square_is_bipolar() {
        let mut square = Square::new(Parameter::constant(480.0));
        assert_eq!(run(&mut square, 0), 1.0);
        assert_eq!(run(&mut square, 5), 1.0);
        assert_eq!(run(&mut square, 25), -1.0);
    }

    #[test]
    fn triangle_is_linear_between_peaks() {
        let mut tri = Triangle::new(Parameter::constant(480.0));
        assert!(run(&mut tri, 0).abs() < 1e-12);
        assert!((run(&mut tri, 5) - 0.5).abs() < 1e-9);
        assert!((run(&mut tri, 10) - 1.0).abs() < 1e-6);
        assert!((run(&mut tri, 30) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn sawtooth_singularity_outputs_zero() {
        let mut saw = Sawtooth::new(Parameter::constant(480.0));
        assert_eq!(run(&mut saw, 0), 0.0);
    }

    #[test]
    fn sawtooth_zero_frequency_outputs_zero() {
        let mut saw = Sawtooth::new(Parameter::constant(0.0));
        for age in 0..100 {
            assert_eq!(run(&mut saw, age), 0.0);
        }
    }

    #[test]
    fn sawtooth_ramps_within_period() {
        // 40-sample period: value rises from near -1 to near +1.
        let mut saw = Sawtooth::new(Parameter::constant(480.0));
        let values: Vec<f64> = (1..40).map(|age| run(&mut saw, age)).collect();
        assert!(values.windows(2).all(|w| w[1] > w[0]));
        assert!((values[19]).abs() < 1e-9, "midpoint should cross zero");
        assert!(values.iter().all(|v| v.abs() <= 1.0 && v.is_finite()));
    }
}
