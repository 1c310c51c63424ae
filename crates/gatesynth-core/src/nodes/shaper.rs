//! Upstream-driven nodes and chain endpoints.

use super::Transfer;
use crate::chain::ChainId;
use crate::param::{ParamContext, Parameter};
use crate::tempo::BEAT_HALF;

/// Default gate threshold for [`ChainStart`].
pub const DEFAULT_GATE: f64 = 0.01;

/// Head of a playable chain.
///
/// The control scheduler compares `start_param` against `gate` every tick:
/// at or above the threshold the owning chain plays, below it the chain
/// stops. As a signal the node outputs its own age.
#[derive(Debug, Clone)]
pub struct ChainStart {
    /// Control value compared against the gate.
    pub start_param: Parameter,
    /// Gate threshold.
    pub gate: f64,
    pub(crate) chain: Option<ChainId>,
}

impl ChainStart {
    /// Start node gated on `start_param` with the default threshold.
    pub fn new(start_param: Parameter) -> Self {
        Self {
            start_param,
            gate: DEFAULT_GATE,
            chain: None,
        }
    }

    /// Sets the gate threshold.
    pub fn with_gate(mut self, gate: f64) -> Self {
        self.gate = gate;
        self
    }

    /// The chain this node starts, once one has been built on it.
    pub fn chain(&self) -> Option<ChainId> {
        self.chain
    }

    /// Returns `true` if the gate is open for the given control level.
    #[inline]
    pub fn is_open(&self, level: f64) -> bool {
        level >= self.gate
    }
}

impl Transfer for ChainStart {
    #[inline]
    fn transfer(&mut self, _input: f64, age: u64, _ctx: &ParamContext<'_>) -> f64 {
        age as f64
    }
}

/// Gain stage: `offset + input * param * multiplier`.
///
/// With a chain-referencing `param` this is how one chain modulates
/// another's level.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Gain parameter.
    pub param: Parameter,
    /// Added after scaling.
    pub offset: f64,
    /// Fixed extra gain.
    pub multiplier: f64,
}

impl Filter {
    /// Filter scaling its input by `param`.
    pub fn new(param: Parameter) -> Self {
        Self {
            param,
            offset: 0.0,
            multiplier: 1.0,
        }
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the fixed multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

impl Transfer for Filter {
    #[inline]
    fn transfer(&mut self, input: f64, _age: u64, ctx: &ParamContext<'_>) -> f64 {
        self.offset + input * self.param.resolve(ctx) * self.multiplier
    }
}

/// Linear envelope: `input * max(duration - age, 0) / duration`.
///
/// Ramps from full level at age 0 to silence at `duration` samples. A
/// non-positive duration is silent.
#[derive(Debug, Clone)]
pub struct LinearDecay {
    /// Ramp length in samples.
    pub duration: f64,
}

impl LinearDecay {
    /// Envelope ramping to zero over `duration` samples.
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }

    /// Gain applied at `age`.
    #[inline]
    pub fn factor(&self, age: u64) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.duration - age as f64).max(0.0) / self.duration
    }
}

impl Default for LinearDecay {
    fn default() -> Self {
        Self::new(BEAT_HALF)
    }
}

impl Transfer for LinearDecay {
    #[inline]
    fn transfer(&mut self, input: f64, age: u64, _ctx: &ParamContext<'_>) -> f64 {
        self.factor(age) * input
    }
}

/// Output tap of a chain.
///
/// Forwards its upstream mean. If `release` is set, stopping the chain
/// splices that chain in behind this node before the hard stop.
#[derive(Debug, Clone, Default)]
pub struct Termination {
    /// Release chain spliced in when the owning chain stops.
    pub release: Option<ChainId>,
}

impl Termination {
    /// Termination owning a release chain.
    pub fn with_release(release: ChainId) -> Self {
        Self {
            release: Some(release),
        }
    }
}

impl Transfer for Termination {
    #[inline]
    fn transfer(&mut self, input: f64, _age: u64, _ctx: &ParamContext<'_>) -> f64 {
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputVector;

    #[test]
    fn decay_factor_ramps_linearly() {
        let decay = LinearDecay::new(9600.0);
        assert_eq!(decay.factor(0), 1.0);
        assert_eq!(decay.factor(4800), 0.5);
        assert_eq!(decay.factor(9600), 0.0);
        assert_eq!(decay.factor(20000), 0.0);
    }

    #[test]
    fn decay_scales_input() {
        let inputs = InputVector::new();
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        let mut decay = LinearDecay::new(100.0);
        assert_eq!(decay.transfer(0.8, 25, &ctx), 0.6);
        assert_eq!(decay.transfer(0.8, 100, &ctx), 0.0);
    }

    #[test]
    fn zero_duration_decay_is_silent() {
        assert_eq!(LinearDecay::new(0.0).factor(0), 0.0);
        assert_eq!(LinearDecay::new(-5.0).factor(3), 0.0);
    }

    #[test]
    fn filter_scales_and_offsets() {
        let inputs = InputVector::new();
        inputs.set(1, 0.5);
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        let mut filter = Filter::new(Parameter::input(1))
            .with_offset(0.1)
            .with_multiplier(2.0);
        assert!((filter.transfer(0.4, 0, &ctx) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn chain_start_outputs_age_and_gates() {
        let inputs = InputVector::new();
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        let mut start = ChainStart::new(Parameter::input(1));
        assert_eq!(start.transfer(0.0, 12, &ctx), 12.0);
        assert!(start.is_open(0.01));
        assert!(!start.is_open(0.009));
        let strict = ChainStart::new(Parameter::input(1)).with_gate(0.5);
        assert!(!strict.is_open(0.4));
    }

    #[test]
    fn termination_forwards_input() {
        let inputs = InputVector::new();
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        let mut term = Termination::default();
        assert_eq!(term.transfer(-0.3, 9, &ctx), -0.3);
    }
}
