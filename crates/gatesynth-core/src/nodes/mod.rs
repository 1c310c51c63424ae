//! Node variants and their transfer functions.
//!
//! Every node in the [`SignalGraph`](crate::SignalGraph) carries one
//! [`NodeKind`]. The kind owns the node-specific parameters and state and
//! computes the node's output from its driving input:
//!
//! - **Sources** ([`NodeKind::is_source`]) are driven by their own age, the
//!   number of steps since the last reset.
//! - **Shapers** are driven by the arithmetic mean of their upstream values.
//!   The linear-decay envelope additionally reads its age.
//!
//! Transfer functions depend only on `(input, age)`, the node's own fields and
//! parameter resolution. Random sources keep their generator state in the
//! node and reseed on reset, so a replay after reset is sample-identical.

mod beat;
mod oscillator;
mod percussion;
mod shaper;

pub use beat::Beat;
pub use oscillator::{Sawtooth, Sine, Square, Triangle};
pub use percussion::{HiHat, KickDrum, Noise};
pub use shaper::{ChainStart, DEFAULT_GATE, Filter, LinearDecay, Termination};

use crate::chain::ChainId;
use crate::param::{ParamContext, Parameter};

/// Transfer function of a single node variant.
pub trait Transfer {
    /// Computes the node output.
    ///
    /// `input` is the upstream mean (always `0.0` for sources and during
    /// reset); `age` is the number of steps since the last reset.
    fn transfer(&mut self, input: f64, age: u64, ctx: &ParamContext<'_>) -> f64;

    /// Restores internal state (random generators) to its initial value.
    fn reset(&mut self) {}
}

/// The closed set of node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Gate-watching source at the head of a playable chain.
    ChainStart(ChainStart),
    /// Sine oscillator.
    Sine(Sine),
    /// Square oscillator.
    Square(Square),
    /// Triangle oscillator.
    Triangle(Triangle),
    /// Cotangent sawtooth oscillator.
    Sawtooth(Sawtooth),
    /// Uniform white noise.
    Noise(Noise),
    /// Noise burst followed by a sine sustain.
    KickDrum(KickDrum),
    /// Band-limited noise burst.
    HiHat(HiHat),
    /// Clock pulse generator.
    Beat(Beat),
    /// Scales the upstream mean by a parameter and adds an offset.
    Filter(Filter),
    /// Linear ramp-to-zero envelope.
    LinearDecay(LinearDecay),
    /// Forwards the upstream mean unchanged.
    Passthrough,
    /// Output tap of a chain, optionally owning a release chain.
    Termination(Termination),
}

impl NodeKind {
    /// A termination node without a release chain.
    pub fn termination() -> Self {
        NodeKind::Termination(Termination::default())
    }

    /// A termination node that splices `release` in when its chain stops.
    pub fn termination_with_release(release: ChainId) -> Self {
        NodeKind::Termination(Termination::with_release(release))
    }

    /// Returns `true` for variants driven by their own age rather than by
    /// upstream values.
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            NodeKind::ChainStart(_)
                | NodeKind::Sine(_)
                | NodeKind::Square(_)
                | NodeKind::Triangle(_)
                | NodeKind::Sawtooth(_)
                | NodeKind::Noise(_)
                | NodeKind::KickDrum(_)
                | NodeKind::HiHat(_)
                | NodeKind::Beat(_)
        )
    }

    /// Short lowercase name of the variant.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::ChainStart(_) => "chain_start",
            NodeKind::Sine(_) => "sine",
            NodeKind::Square(_) => "square",
            NodeKind::Triangle(_) => "triangle",
            NodeKind::Sawtooth(_) => "sawtooth",
            NodeKind::Noise(_) => "noise",
            NodeKind::KickDrum(_) => "kick_drum",
            NodeKind::HiHat(_) => "hi_hat",
            NodeKind::Beat(_) => "beat",
            NodeKind::Filter(_) => "filter",
            NodeKind::LinearDecay(_) => "linear_decay",
            NodeKind::Passthrough => "passthrough",
            NodeKind::Termination(_) => "termination",
        }
    }

    /// Release chain owned by a termination node.
    pub fn release_chain(&self) -> Option<ChainId> {
        match self {
            NodeKind::Termination(term) => term.release,
            _ => None,
        }
    }

    /// Chains this node reads through its parameters.
    pub fn referenced_chains(&self) -> Vec<ChainId> {
        self.parameters().iter().filter_map(Parameter::chain).collect()
    }

    /// Every parameter the node resolves.
    pub fn parameters(&self) -> Vec<Parameter> {
        match self {
            NodeKind::ChainStart(n) => vec![n.start_param],
            NodeKind::Sine(n) => vec![n.frequency],
            NodeKind::Square(n) => vec![n.frequency],
            NodeKind::Triangle(n) => vec![n.frequency],
            NodeKind::Sawtooth(n) => vec![n.frequency],
            NodeKind::KickDrum(n) => vec![n.frequency],
            NodeKind::Filter(n) => vec![n.param],
            _ => Vec::new(),
        }
    }

    fn as_transfer(&mut self) -> Option<&mut dyn Transfer> {
        match self {
            NodeKind::ChainStart(n) => Some(n),
            NodeKind::Sine(n) => Some(n),
            NodeKind::Square(n) => Some(n),
            NodeKind::Triangle(n) => Some(n),
            NodeKind::Sawtooth(n) => Some(n),
            NodeKind::Noise(n) => Some(n),
            NodeKind::KickDrum(n) => Some(n),
            NodeKind::HiHat(n) => Some(n),
            NodeKind::Beat(n) => Some(n),
            NodeKind::Filter(n) => Some(n),
            NodeKind::LinearDecay(n) => Some(n),
            NodeKind::Termination(n) => Some(n),
            NodeKind::Passthrough => None,
        }
    }
}

impl Transfer for NodeKind {
    #[inline]
    fn transfer(&mut self, input: f64, age: u64, ctx: &ParamContext<'_>) -> f64 {
        match self.as_transfer() {
            Some(node) => node.transfer(input, age, ctx),
            None => input,
        }
    }

    fn reset(&mut self) {
        if let Some(node) = self.as_transfer() {
            node.reset();
        }
    }
}

/// Phase argument shared by the periodic oscillators: `TAU * t * f`.
#[inline]
pub(crate) fn angle(age: u64, sample_rate: f64, frequency: f64) -> f64 {
    core::f64::consts::TAU * (age as f64 / sample_rate) * frequency
}

/// Xorshift64* generator for the noise-based sources.
///
/// Each random node owns one, seeded at construction and reseeded on reset.
#[derive(Debug, Clone)]
pub(crate) struct NoiseRng {
    seed: u64,
    state: u64,
}

impl NoiseRng {
    pub(crate) const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

    pub(crate) fn new(seed: u64) -> Self {
        // Xorshift has a fixed point at zero.
        let seed = if seed == 0 { Self::DEFAULT_SEED } else { seed };
        Self { seed, state: seed }
    }

    pub(crate) fn reseed(&mut self) {
        self.state = self.seed;
    }

    /// Uniform value in `[0.0, 1.0)`.
    #[inline]
    pub(crate) fn next_f64(&mut self) -> f64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        let bits = self.state.wrapping_mul(0x2545_F491_4F6C_DD1D);
        (bits >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform value in `[low, high)`.
    #[inline]
    pub(crate) fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputVector;

    #[test]
    fn source_classification() {
        assert!(NodeKind::Sine(Sine::new(Parameter::constant(440.0))).is_source());
        assert!(NodeKind::Beat(Beat::default()).is_source());
        assert!(NodeKind::ChainStart(ChainStart::new(Parameter::input(1))).is_source());
        assert!(!NodeKind::Passthrough.is_source());
        assert!(!NodeKind::termination().is_source());
        assert!(!NodeKind::LinearDecay(LinearDecay::new(100.0)).is_source());
        assert!(!NodeKind::Filter(Filter::new(Parameter::constant(1.0))).is_source());
    }

    #[test]
    fn passthrough_forwards_input() {
        let inputs = InputVector::new();
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        let mut kind = NodeKind::Passthrough;
        assert_eq!(kind.transfer(0.42, 7, &ctx), 0.42);
    }

    #[test]
    fn release_chain_only_on_termination() {
        let kind = NodeKind::termination_with_release(ChainId(3));
        assert_eq!(kind.release_chain(), Some(ChainId(3)));
        assert_eq!(NodeKind::Passthrough.release_chain(), None);
    }

    #[test]
    fn referenced_chains_come_from_parameters() {
        let kind = NodeKind::Filter(Filter::new(Parameter::from_chain(ChainId(2))));
        assert_eq!(kind.referenced_chains(), vec![ChainId(2)]);
        let kind = NodeKind::Sine(Sine::new(Parameter::input(4)));
        assert!(kind.referenced_chains().is_empty());
    }

    #[test]
    fn rng_stays_in_unit_interval_and_reseeds() {
        let mut rng = NoiseRng::new(42);
        let first: Vec<f64> = (0..1000).map(|_| rng.next_f64()).collect();
        assert!(first.iter().all(|v| (0.0..1.0).contains(v)));
        rng.reseed();
        let second: Vec<f64> = (0..1000).map(|_| rng.next_f64()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn rng_zero_seed_is_replaced() {
        let mut rng = NoiseRng::new(0);
        assert_ne!(rng.next_f64(), rng.next_f64());
    }
}
