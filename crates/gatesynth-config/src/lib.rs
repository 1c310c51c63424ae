//! Patch definitions for the gatesynth engine.
//!
//! Patches are described in TOML and built into a runnable
//! [`Patch`](gatesynth_core::Patch).
//!
//! # Features
//!
//! - **Patch files**: chains, nodes, wiring and gates in TOML
//! - **Parameters**: constants, external input slots and other chains' outputs
//! - **Durations**: sample counts or note names (`"quarter"`, `"eighth"`)
//! - **Factory Patches**: built-in patches, including the button instrument
//!
//! # Example
//!
//! ```rust
//! use gatesynth_config::PatchDef;
//! use gatesynth_core::InputVector;
//!
//! let def = PatchDef::from_toml(r#"
//! name = "tone"
//!
//! [[chains]]
//! name = "a"
//! gate = { param = { input = 1 } }
//!
//! [[chains.nodes]]
//! id = "osc"
//! kind = "sine"
//! frequency = 440
//!
//! [[chains.nodes]]
//! id = "out"
//! kind = "termination"
//! inputs = ["osc"]
//! "#).unwrap();
//!
//! let patch = def.build(InputVector::new()).unwrap();
//! assert_eq!(patch.chains().len(), 1);
//! ```

mod error;
mod node_def;
mod patch_def;

/// Factory patches bundled with the library.
pub mod factory_patches;

pub use error::ConfigError;
pub use factory_patches::{
    FACTORY_PATCH_NAMES, factory_patches, find_patch, get_factory_patch, is_factory_patch,
};
pub use node_def::{DurationDef, NodeDef, NodeKindDef, ParamDef};
pub use patch_def::{ChainDef, EngineSection, GateDef, PatchDef, START_NODE};
