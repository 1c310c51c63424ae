//! Parameter indirection.
//!
//! A [`Parameter`] is any control value a node reads while computing its
//! output: a frequency, a filter gain, a gate level. It resolves in O(1) and
//! without side effects to one of three sources:
//!
//! - a constant,
//! - the current output of another chain (its termination node's value),
//! - one of the eight external input slots.
//!
//! Resolution never fails. A chain reference that names no chain and an input
//! slot outside `1..=8` both resolve to `0.0`.

use crate::chain::ChainId;
use crate::graph::NodeId;
use crate::input::InputVector;

/// A scalar control value with one of three sources.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Parameter {
    /// Fixed value.
    Constant(f64),
    /// Current output of the referenced chain.
    Chain(ChainId),
    /// External input slot, 1-based.
    Input(usize),
}

impl Parameter {
    /// Creates a constant parameter.
    pub const fn constant(value: f64) -> Self {
        Parameter::Constant(value)
    }

    /// Creates a parameter that follows another chain's output.
    pub const fn from_chain(chain: ChainId) -> Self {
        Parameter::Chain(chain)
    }

    /// Creates a parameter that reads an external input slot (`1..=8`).
    pub const fn input(slot: usize) -> Self {
        Parameter::Input(slot)
    }

    /// Resolves the parameter against the current graph state.
    #[inline]
    pub fn resolve(&self, ctx: &ParamContext<'_>) -> f64 {
        match *self {
            Parameter::Constant(value) => value,
            Parameter::Chain(chain) => ctx.chain_value(chain),
            Parameter::Input(slot) => ctx.inputs.get(slot),
        }
    }

    /// Returns the referenced chain, if this parameter follows one.
    pub fn chain(&self) -> Option<ChainId> {
        match *self {
            Parameter::Chain(chain) => Some(chain),
            _ => None,
        }
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Parameter::Constant(0.0)
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Constant(value)
    }
}

/// Read-only view used to resolve parameters during a node step.
///
/// Built by the graph for each step from its value table, the current chain
/// taps (each chain's active termination node) and the input vector.
pub struct ParamContext<'a> {
    pub(crate) values: &'a [f64],
    pub(crate) taps: &'a [NodeId],
    pub(crate) inputs: &'a InputVector,
    /// Sample rate in Hz, used by time-based transfer functions.
    pub sample_rate: f64,
}

impl<'a> ParamContext<'a> {
    pub(crate) fn new(
        values: &'a [f64],
        taps: &'a [NodeId],
        inputs: &'a InputVector,
        sample_rate: f64,
    ) -> Self {
        Self {
            values,
            taps,
            inputs,
            sample_rate,
        }
    }

    /// Current output of a chain, or `0.0` if the chain is unknown.
    #[inline]
    pub fn chain_value(&self, chain: ChainId) -> f64 {
        self.taps
            .get(chain.index())
            .and_then(|tap| self.values.get(tap.index()))
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_resolves_to_itself() {
        let inputs = InputVector::new();
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        assert_eq!(Parameter::constant(440.0).resolve(&ctx), 440.0);
        assert_eq!(Parameter::from(2.5).resolve(&ctx), 2.5);
    }

    #[test]
    fn input_reads_one_based_slot() {
        let inputs = InputVector::new();
        inputs.set(7, 0.9);
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        assert_eq!(Parameter::input(7).resolve(&ctx), 0.9);
        assert_eq!(Parameter::input(6).resolve(&ctx), 0.0);
    }

    #[test]
    fn out_of_range_input_resolves_to_zero() {
        let inputs = InputVector::new();
        inputs.store_all(&[1.0; 8]);
        let ctx = ParamContext::new(&[], &[], &inputs, 19200.0);
        assert_eq!(Parameter::input(0).resolve(&ctx), 0.0);
        assert_eq!(Parameter::input(9).resolve(&ctx), 0.0);
    }

    #[test]
    fn chain_reads_tap_value() {
        let inputs = InputVector::new();
        let values = [0.1, 0.2, 0.3];
        let taps = [NodeId(2), NodeId(0)];
        let ctx = ParamContext::new(&values, &taps, &inputs, 19200.0);
        assert_eq!(Parameter::from_chain(ChainId(0)).resolve(&ctx), 0.3);
        assert_eq!(Parameter::from_chain(ChainId(1)).resolve(&ctx), 0.1);
    }

    #[test]
    fn unknown_chain_resolves_to_zero() {
        let inputs = InputVector::new();
        let values = [0.5];
        let taps = [NodeId(0)];
        let ctx = ParamContext::new(&values, &taps, &inputs, 19200.0);
        assert_eq!(Parameter::from_chain(ChainId(4)).resolve(&ctx), 0.0);
    }
}
