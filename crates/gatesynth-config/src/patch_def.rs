//! Patch definitions and the patch builder.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use gatesynth_core::nodes::{ChainStart, DEFAULT_GATE};
use gatesynth_core::{
    CONTROL_RATE, ChainId, EngineConfig, FRAMES_PER_BUFFER, InputVector, NodeId, NodeKind, Patch,
    SAMPLE_RATE, VOLUME,
};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::node_def::{DurationDef, NodeDef, ParamDef, Scope};

/// Id of the implicit start node of a gated chain.
pub const START_NODE: &str = "start";

/// A complete patch: engine settings plus every chain.
///
/// Chains are built in file order, but parameters and release references
/// may name any chain, including later ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchDef {
    /// Patch name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Engine timing overrides.
    #[serde(default)]
    pub engine: EngineSection,
    /// Chains in build order.
    #[serde(default)]
    pub chains: Vec<ChainDef>,
}

/// `[engine]` table; every field defaults to the engine constant.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Output attenuation.
    pub volume: f64,
    /// Frames per render callback.
    pub frames_per_buffer: u32,
    /// Control ticks per second.
    pub control_rate: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            volume: VOLUME,
            frames_per_buffer: FRAMES_PER_BUFFER,
            control_rate: CONTROL_RATE,
        }
    }
}

impl From<EngineSection> for EngineConfig {
    fn from(section: EngineSection) -> Self {
        EngineConfig {
            sample_rate: section.sample_rate,
            volume: section.volume,
            frames_per_buffer: section.frames_per_buffer,
            control_rate: section.control_rate,
        }
    }
}

/// One playable chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainDef {
    /// Chain name, unique within the patch.
    pub name: String,
    /// Bounded duration; unbounded when absent.
    #[serde(default)]
    pub duration: Option<DurationDef>,
    /// Gate controlling the chain; gated chains start at an implicit
    /// `start` node.
    #[serde(default)]
    pub gate: Option<GateDef>,
    /// Nodes of the chain.
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
}

fn default_threshold() -> f64 {
    DEFAULT_GATE
}

/// Gate of a chain: plays while `param >= threshold`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateDef {
    /// Control value compared against the threshold.
    pub param: ParamDef,
    /// Threshold (default 0.01).
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl PatchDef {
    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let patch = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), name = %patch.name, "patch loaded");
        Ok(patch)
    }

    /// Load a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Engine configuration for this patch.
    pub fn engine_config(&self) -> EngineConfig {
        self.engine.into()
    }

    /// Looks up a chain definition by name.
    pub fn chain(&self, name: &str) -> Option<&ChainDef> {
        self.chains.iter().find(|c| c.name == name)
    }

    /// Input slots that gate at least one chain, sorted.
    pub fn gate_slots(&self) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .chains
            .iter()
            .filter_map(|c| match c.gate.as_ref()?.param {
                ParamDef::Input { input } => Some(input),
                _ => None,
            })
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// Checks names and references without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for chain in &self.chains {
            if !names.insert(chain.name.as_str()) {
                return Err(ConfigError::DuplicateChain(chain.name.clone()));
            }
        }
        for chain in &self.chains {
            chain.validate()?;
        }
        Ok(())
    }

    /// Builds the engine patch, reading gates and input parameters from
    /// `inputs`.
    ///
    /// Chain ids follow definition order, so a parameter or release can
    /// refer to a chain defined further down.
    pub fn build(&self, inputs: InputVector) -> Result<Patch, ConfigError> {
        self.validate()?;
        let config = self.engine_config();
        let chain_ids: HashMap<&str, ChainId> = self
            .chains
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), ChainId::new(i as u32)))
            .collect();

        let mut patch = Patch::new(self.name.clone(), config, inputs);
        for chain in &self.chains {
            let scope = Scope {
                chain: &chain.name,
                chains: &chain_ids,
                sample_rate: config.sample_rate,
            };
            chain.build_into(&mut patch, &scope)?;
        }
        tracing::info!(
            patch = %self.name,
            chains = patch.chains().len(),
            nodes = patch.graph().node_count(),
            "patch built"
        );
        Ok(patch)
    }
}

impl ChainDef {
    /// Ids visible to `inputs` lists in this chain.
    fn node_ids(&self) -> Result<HashSet<&str>, ConfigError> {
        let mut ids = HashSet::new();
        if self.gate.is_some() {
            ids.insert(START_NODE);
        }
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(ConfigError::DuplicateNode {
                    chain: self.name.clone(),
                    node: node.id.clone(),
                });
            }
        }
        Ok(ids)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.is_empty() {
            return Err(ConfigError::EmptyChain(self.name.clone()));
        }
        let ids = self.node_ids()?;
        for input in self.nodes.iter().flat_map(|n| &n.inputs) {
            if !ids.contains(input.as_str()) {
                return Err(ConfigError::UnknownNode {
                    chain: self.name.clone(),
                    node: input.clone(),
                });
            }
        }
        let count = self.nodes.iter().filter(|n| n.kind.is_termination()).count();
        if count != 1 {
            return Err(ConfigError::Termination {
                chain: self.name.clone(),
                count,
            });
        }
        if self.gate.is_none() {
            let count = self.nodes.iter().filter(|n| n.inputs.is_empty()).count();
            if count != 1 {
                return Err(ConfigError::ChainRoot {
                    chain: self.name.clone(),
                    count,
                });
            }
        }
        Ok(())
    }

    fn build_into(&self, patch: &mut Patch, scope: &Scope<'_>) -> Result<ChainId, ConfigError> {
        let mut ids: HashMap<&str, NodeId> = HashMap::new();

        let start = match &self.gate {
            Some(gate) => {
                let param = scope.param(&gate.param)?;
                let start = ChainStart::new(param).with_gate(gate.threshold);
                let id = patch.add_node(NodeKind::ChainStart(start));
                ids.insert(START_NODE, id);
                Some(id)
            }
            None => None,
        };

        let mut termination = None;
        let mut node_ids = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let id = patch.add_node(scope.node(&node.kind)?);
            ids.insert(node.id.as_str(), id);
            node_ids.push(id);
            if node.kind.is_termination() {
                termination = Some(id);
            }
        }

        for (node, &to) in self.nodes.iter().zip(&node_ids) {
            if node.inputs.is_empty() {
                // Unwired nodes of a gated chain hang off its start node.
                if let Some(start) = start {
                    patch
                        .connect(start, to)
                        .map_err(|e| ConfigError::graph(&self.name, e))?;
                }
                continue;
            }
            for input in &node.inputs {
                let from = ids.get(input.as_str()).copied().ok_or_else(|| {
                    ConfigError::UnknownNode {
                        chain: self.name.clone(),
                        node: input.clone(),
                    }
                })?;
                patch
                    .connect(from, to)
                    .map_err(|e| ConfigError::graph(&self.name, e))?;
            }
        }

        // An ungated chain starts at its only node without inputs.
        let root = self
            .nodes
            .iter()
            .zip(&node_ids)
            .find(|(node, _)| node.inputs.is_empty())
            .map(|(_, &id)| id);
        let (Some(source), Some(termination)) = (start.or(root), termination) else {
            return Err(ConfigError::EmptyChain(self.name.clone()));
        };
        let duration = self
            .duration
            .as_ref()
            .map(|d| d.samples(scope.sample_rate))
            .transpose()?;

        let id = patch
            .add_chain(self.name.clone(), source, termination, duration)
            .map_err(|e| ConfigError::graph(&self.name, e))?;
        tracing::debug!(chain = %id, name = %self.name, nodes = ids.len(), "chain built");
        Ok(id)
    }
}
