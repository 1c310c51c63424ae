//! Node, parameter and duration definitions.
//!
//! A node definition carries an `id`, its upstream `inputs` and a `kind` tag
//! selecting the kind-specific fields:
//!
//! ```toml
//! [[chains.nodes]]
//! id = "low"
//! kind = "sine"
//! frequency = 49.99
//!
//! [[chains.nodes]]
//! id = "gain"
//! kind = "filter"
//! param = { chain = "lfo" }
//! inputs = ["low"]
//! ```

use std::collections::HashMap;

use gatesynth_core::nodes::{
    Beat, Filter, HiHat, KickDrum, LinearDecay, Noise, Sawtooth, Sine, Square, Triangle,
};
use gatesynth_core::{BEAT_4TH, BEAT_HALF, ChainId, InputVector, NodeKind, NoteValue, Parameter};
use serde::Deserialize;

use crate::error::ConfigError;

/// A parameter value: a number, `{ input = N }` or `{ chain = "name" }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum ParamDef {
    /// Fixed value.
    Constant(f64),
    /// External input slot, 1-based.
    Input {
        /// Slot number in `1..=8`.
        input: usize,
    },
    /// Live output of another chain.
    Chain {
        /// Name of the referenced chain.
        chain: String,
    },
}

/// A duration: a sample count or a note name such as `"eighth"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DurationDef {
    /// Length in samples.
    Samples(f64),
    /// Named note value, scaled by the engine sample rate.
    Note(String),
}

impl DurationDef {
    /// Length in samples at `sample_rate`.
    pub fn samples(&self, sample_rate: f64) -> Result<f64, ConfigError> {
        match self {
            DurationDef::Samples(n) => Ok(*n),
            DurationDef::Note(name) => NoteValue::from_name(name)
                .map(|note| note.samples(sample_rate))
                .ok_or_else(|| ConfigError::UnknownNoteValue(name.clone())),
        }
    }
}

/// One node of a chain.
///
/// Unknown keys are rejected by [`NodeKindDef`], which receives every key
/// other than `id` and `inputs`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDef {
    /// Identifier, unique within the chain.
    pub id: String,
    /// Upstream node ids within the same chain.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Kind and kind-specific fields.
    #[serde(flatten)]
    pub kind: NodeKindDef,
}

fn one() -> f64 {
    1.0
}

fn two() -> f64 {
    2.0
}

fn a440() -> ParamDef {
    ParamDef::Constant(440.0)
}

fn kick_frequency() -> ParamDef {
    ParamDef::Constant(75.0)
}

fn quarter() -> DurationDef {
    DurationDef::Samples(BEAT_4TH)
}

fn half() -> DurationDef {
    DurationDef::Samples(BEAT_HALF)
}

/// Node kinds as written in patch files.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum NodeKindDef {
    /// Sine oscillator.
    Sine {
        /// Frequency in Hz (default 440).
        #[serde(default = "a440")]
        frequency: ParamDef,
        /// Peak amplitude (default 1).
        #[serde(default = "one")]
        amplitude: f64,
        /// DC offset (default 0).
        #[serde(default)]
        translate: f64,
    },
    /// Square oscillator.
    Square {
        /// Frequency in Hz (default 440).
        #[serde(default = "a440")]
        frequency: ParamDef,
        /// Peak amplitude (default 1).
        #[serde(default = "one")]
        amplitude: f64,
    },
    /// Triangle oscillator.
    Triangle {
        /// Frequency in Hz (default 440).
        #[serde(default = "a440")]
        frequency: ParamDef,
        /// Peak amplitude (default 1).
        #[serde(default = "one")]
        amplitude: f64,
        /// DC offset (default 0).
        #[serde(default)]
        translate: f64,
    },
    /// Sawtooth oscillator.
    Sawtooth {
        /// Frequency in Hz (default 440).
        #[serde(default = "a440")]
        frequency: ParamDef,
        /// Peak amplitude (default 1).
        #[serde(default = "one")]
        amplitude: f64,
    },
    /// Uniform white noise.
    Noise {
        /// Half-width of the noise band (default 1).
        #[serde(default = "one")]
        amplitude: f64,
        /// Centre of the noise band (default 0).
        #[serde(default)]
        translate: f64,
        /// Generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Noise burst followed by a sine body.
    KickDrum {
        /// Body frequency in Hz (default 75).
        #[serde(default = "kick_frequency")]
        frequency: ParamDef,
        /// Noise burst length (default 0.005 s).
        #[serde(default)]
        length: Option<DurationDef>,
        /// Sine body length (default 0.03 s).
        #[serde(default)]
        sustain: Option<DurationDef>,
        /// Peak amplitude (default 2).
        #[serde(default = "two")]
        amplitude: f64,
        /// Offset of the noise burst (default 0).
        #[serde(default)]
        translate: f64,
        /// Generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Short noise burst.
    HiHat {
        /// Lower bound of the noise magnitude (default 0).
        #[serde(default)]
        pass_filter: f64,
        /// Burst length (default 0.02 s).
        #[serde(default)]
        length: Option<DurationDef>,
        /// Peak amplitude (default 1).
        #[serde(default = "one")]
        amplitude: f64,
        /// DC offset (default 0).
        #[serde(default)]
        translate: f64,
        /// Generator seed.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Pulse clock.
    Beat {
        /// Pulse length (default quarter).
        #[serde(default = "quarter")]
        beat_length: DurationDef,
        /// Gap between pulses (default quarter).
        #[serde(default = "quarter")]
        gap_length: DurationDef,
        /// Pulse level (default 1).
        #[serde(default = "one")]
        amplitude: f64,
        /// Level between pulses (default 0).
        #[serde(default)]
        translate: f64,
    },
    /// Gain stage.
    Filter {
        /// Gain parameter.
        param: ParamDef,
        /// Added after scaling (default 0).
        #[serde(default)]
        offset: f64,
        /// Fixed extra gain (default 1).
        #[serde(default = "one")]
        multiplier: f64,
    },
    /// Linear fade to zero.
    LinearDecay {
        /// Fade length (default half).
        #[serde(default = "half")]
        duration: DurationDef,
    },
    /// Forwards the upstream mean unchanged.
    Passthrough,
    /// Chain output, optionally owning a release chain.
    Termination {
        /// Chain spliced in when the owning chain stops.
        #[serde(default)]
        release: Option<String>,
    },
}

impl NodeKindDef {
    /// Returns `true` for termination nodes.
    pub fn is_termination(&self) -> bool {
        matches!(self, NodeKindDef::Termination { .. })
    }

    /// Kind tag as written in patch files.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKindDef::Sine { .. } => "sine",
            NodeKindDef::Square { .. } => "square",
            NodeKindDef::Triangle { .. } => "triangle",
            NodeKindDef::Sawtooth { .. } => "sawtooth",
            NodeKindDef::Noise { .. } => "noise",
            NodeKindDef::KickDrum { .. } => "kick_drum",
            NodeKindDef::HiHat { .. } => "hi_hat",
            NodeKindDef::Beat { .. } => "beat",
            NodeKindDef::Filter { .. } => "filter",
            NodeKindDef::LinearDecay { .. } => "linear_decay",
            NodeKindDef::Passthrough => "passthrough",
            NodeKindDef::Termination { .. } => "termination",
        }
    }
}

/// Name resolution for one chain being built.
pub(crate) struct Scope<'a> {
    pub(crate) chain: &'a str,
    pub(crate) chains: &'a HashMap<&'a str, ChainId>,
    pub(crate) sample_rate: f64,
}

impl Scope<'_> {
    pub(crate) fn chain_id(&self, name: &str) -> Result<ChainId, ConfigError> {
        self.chains
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownChain {
                chain: self.chain.to_string(),
                reference: name.to_string(),
            })
    }

    pub(crate) fn param(&self, def: &ParamDef) -> Result<Parameter, ConfigError> {
        match def {
            ParamDef::Constant(v) => Ok(Parameter::constant(*v)),
            ParamDef::Input { input } if InputVector::is_valid_slot(*input) => {
                Ok(Parameter::input(*input))
            }
            ParamDef::Input { input } => Err(ConfigError::InvalidInputSlot {
                chain: self.chain.to_string(),
                slot: *input,
            }),
            ParamDef::Chain { chain } => self.chain_id(chain).map(Parameter::from_chain),
        }
    }

    fn samples(&self, def: &DurationDef) -> Result<f64, ConfigError> {
        def.samples(self.sample_rate)
    }

    fn seconds(&self, seconds: f64) -> f64 {
        seconds * self.sample_rate
    }

    /// Converts a node definition into an engine node.
    pub(crate) fn node(&self, def: &NodeKindDef) -> Result<NodeKind, ConfigError> {
        Ok(match def {
            NodeKindDef::Sine {
                frequency,
                amplitude,
                translate,
            } => NodeKind::Sine(
                Sine::new(self.param(frequency)?)
                    .with_amplitude(*amplitude)
                    .with_translate(*translate),
            ),
            NodeKindDef::Square {
                frequency,
                amplitude,
            } => NodeKind::Square(Square::new(self.param(frequency)?).with_amplitude(*amplitude)),
            NodeKindDef::Triangle {
                frequency,
                amplitude,
                translate,
            } => NodeKind::Triangle(
                Triangle::new(self.param(frequency)?)
                    .with_amplitude(*amplitude)
                    .with_translate(*translate),
            ),
            NodeKindDef::Sawtooth {
                frequency,
                amplitude,
            } => NodeKind::Sawtooth(
                Sawtooth::new(self.param(frequency)?).with_amplitude(*amplitude),
            ),
            NodeKindDef::Noise {
                amplitude,
                translate,
                seed,
            } => {
                let mut noise = Noise::new()
                    .with_amplitude(*amplitude)
                    .with_translate(*translate);
                if let Some(seed) = seed {
                    noise = noise.with_seed(*seed);
                }
                NodeKind::Noise(noise)
            }
            NodeKindDef::KickDrum {
                frequency,
                length,
                sustain,
                amplitude,
                translate,
                seed,
            } => {
                let length = match length {
                    Some(d) => self.samples(d)?,
                    None => self.seconds(0.005),
                };
                let sustain = match sustain {
                    Some(d) => self.samples(d)?,
                    None => self.seconds(0.03),
                };
                let mut kick = KickDrum::new()
                    .with_frequency(self.param(frequency)?)
                    .with_lengths(length, sustain)
                    .with_amplitude(*amplitude)
                    .with_translate(*translate);
                if let Some(seed) = seed {
                    kick = kick.with_seed(*seed);
                }
                NodeKind::KickDrum(kick)
            }
            NodeKindDef::HiHat {
                pass_filter,
                length,
                amplitude,
                translate,
                seed,
            } => {
                let length = match length {
                    Some(d) => self.samples(d)?,
                    None => self.seconds(0.02),
                };
                let mut hat = HiHat::new()
                    .with_pass_filter(*pass_filter)
                    .with_length(length)
                    .with_amplitude(*amplitude)
                    .with_translate(*translate);
                if let Some(seed) = seed {
                    hat = hat.with_seed(*seed);
                }
                NodeKind::HiHat(hat)
            }
            NodeKindDef::Beat {
                beat_length,
                gap_length,
                amplitude,
                translate,
            } => NodeKind::Beat(
                Beat::new(self.samples(beat_length)?, self.samples(gap_length)?)
                    .with_amplitude(*amplitude)
                    .with_translate(*translate),
            ),
            NodeKindDef::Filter {
                param,
                offset,
                multiplier,
            } => NodeKind::Filter(
                Filter::new(self.param(param)?)
                    .with_offset(*offset)
                    .with_multiplier(*multiplier),
            ),
            NodeKindDef::LinearDecay { duration } => {
                NodeKind::LinearDecay(LinearDecay::new(self.samples(duration)?))
            }
            NodeKindDef::Passthrough => NodeKind::Passthrough,
            NodeKindDef::Termination { release: None } => NodeKind::termination(),
            NodeKindDef::Termination {
                release: Some(release),
            } => NodeKind::termination_with_release(self.chain_id(release)?),
        })
    }
}
