//! Clock pulse generator.

use super::Transfer;
use crate::param::ParamContext;
use crate::tempo::BEAT_4TH;

/// Square clock driven purely by age.
///
/// Each period is `beat_length + gap_length` samples long. The output is
/// `amplitude` while `age % period <= beat_length` and `translate` otherwise,
/// so the pulse covers `beat_length + 1` samples of each period.
#[derive(Debug, Clone)]
pub struct Beat {
    /// Level outside the pulse.
    pub translate: f64,
    /// Level during the pulse.
    pub amplitude: f64,
    /// Pulse length in samples.
    pub beat_length: f64,
    /// Silence between pulses in samples.
    pub gap_length: f64,
}

impl Beat {
    /// Clock with the given pulse and gap lengths, pulsing between 0 and 1.
    pub fn new(beat_length: f64, gap_length: f64) -> Self {
        Self {
            translate: 0.0,
            amplitude: 1.0,
            beat_length,
            gap_length,
        }
    }

    /// Sets the pulse level.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Sets the level between pulses.
    pub fn with_translate(mut self, translate: f64) -> Self {
        self.translate = translate;
        self
    }

    /// Full cycle length in samples.
    #[inline]
    pub fn period_length(&self) -> f64 {
        self.beat_length + self.gap_length
    }
}

impl Default for Beat {
    fn default() -> Self {
        Self::new(BEAT_4TH, BEAT_4TH)
    }
}

impl Transfer for Beat {
    #[inline]
    fn transfer(&mut self, _input: f64, age: u64, _ctx: &ParamContext<'_>) -> f64 {
        let period = self.period_length();
        if period <= 0.0 {
            return self.translate;
        }
        if (age as f64) % period <= self.beat_length {
            self.amplitude
        } else {
            self.translate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputVector;

    fn run(beat: &mut Beat, age: u64) -> f64 {
        let inputs = InputVector::new();
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        beat.transfer(0.0, age, &ctx)
    }

    #[test]
    fn quarter_clock_pattern() {
        let mut beat = Beat::new(4800.0, 4800.0)
            .with_amplitude(0.8)
            .with_translate(-0.2);
        for cycle in 0..3u64 {
            let base = cycle * 9600;
            assert_eq!(run(&mut beat, base), 0.8);
            assert_eq!(run(&mut beat, base + 4800), 0.8);
            assert_eq!(run(&mut beat, base + 4801), -0.2);
            assert_eq!(run(&mut beat, base + 9599), -0.2);
        }
    }

    #[test]
    fn default_is_quarter_notes() {
        let beat = Beat::default();
        assert_eq!(beat.period_length(), 9600.0);
    }

    #[test]
    fn zero_period_holds_translate() {
        let mut beat = Beat::new(0.0, 0.0).with_translate(0.3);
        assert_eq!(run(&mut beat, 0), 0.3);
        assert_eq!(run(&mut beat, 17), 0.3);
    }
}
