//! Factory patches bundled with gatesynth.
//!
//! These are embedded at compile time and always available. `buttons` is the
//! five-button instrument the engine was first built for; the others are
//! small demonstrations of chain parameters and release tails.

use std::path::Path;

use crate::error::ConfigError;
use crate::patch_def::PatchDef;

/// Array of factory patch names for external access.
pub static FACTORY_PATCH_NAMES: &[&str] = &["buttons", "metronome", "diamond"];

static FACTORY_PATCHES_TOML: &[(&str, &str)] = &[
    ("buttons", BUTTONS_PATCH),
    ("metronome", METRONOME_PATCH),
    ("diamond", DIAMOND_PATCH),
];

/// Buttons 3 to 7: hi-hat, kick drum, two pads, and a drone with an
/// eighth-note release tail.
const BUTTONS_PATCH: &str = r#"
name = "buttons"
description = "Five-button instrument: hi-hat, kick, two pads and a drone"

[[chains]]
name = "forth_decay"
duration = "quarter"

[[chains.nodes]]
id = "decay"
kind = "linear_decay"
duration = "quarter"

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["decay"]

[[chains]]
name = "eighth_decay"
duration = "eighth"

[[chains.nodes]]
id = "decay"
kind = "linear_decay"
duration = "eighth"

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["decay"]

[[chains]]
name = "button_7"
gate = { param = { input = 7 } }

[[chains.nodes]]
id = "low"
kind = "sine"
frequency = 49.99

[[chains.nodes]]
id = "mid"
kind = "sine"
frequency = 97.99

[[chains.nodes]]
id = "saw"
kind = "sawtooth"
frequency = 146.83

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["low", "mid", "saw"]
release = "eighth_decay"

[[chains]]
name = "button_6"
gate = { param = { input = 6 } }

[[chains.nodes]]
id = "tone"
kind = "sine"
frequency = 123.47

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["tone"]

[[chains]]
name = "button_5"
gate = { param = { input = 5 } }

[[chains.nodes]]
id = "sine"
kind = "sine"
frequency = 73.4
translate = 0.1

[[chains.nodes]]
id = "tri"
kind = "triangle"
frequency = 73.4
translate = 0.1

[[chains.nodes]]
id = "sub"
kind = "triangle"
frequency = 36.7

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["sine", "tri", "sub"]

[[chains]]
name = "kick_drum"
gate = { param = { input = 4 } }

[[chains.nodes]]
id = "kick"
kind = "kick_drum"

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["kick"]

[[chains]]
name = "hi_hat"
gate = { param = { input = 3 } }

[[chains.nodes]]
id = "hat"
kind = "hi_hat"
pass_filter = 0.3

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["hat"]
"#;

/// A pulse clock chain gating an 880 Hz tone through a chain parameter.
const METRONOME_PATCH: &str = r#"
name = "metronome"
description = "Quarter-note clicks while input 1 is held"

[[chains]]
name = "clock"
gate = { param = { input = 1 } }

[[chains.nodes]]
id = "pulse"
kind = "beat"
beat_length = "thirty_second"
gap_length = 4200

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["pulse"]

[[chains]]
name = "click"
gate = { param = { input = 1 } }

[[chains.nodes]]
id = "tone"
kind = "sine"
frequency = 880

[[chains.nodes]]
id = "gain"
kind = "filter"
param = { chain = "clock" }
inputs = ["tone"]

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["gain"]
"#;

/// Split and merge around a tone, held for at least a half note, then a
/// quarter-note fade.
const DIAMOND_PATCH: &str = r#"
name = "diamond"
description = "Split/merge tone with a minimum length and a fade-out"

[[chains]]
name = "fade"
duration = "quarter"

[[chains.nodes]]
id = "decay"
kind = "linear_decay"
duration = "quarter"

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["decay"]

[[chains]]
name = "tone"
duration = "half"
gate = { param = { input = 2 } }

[[chains.nodes]]
id = "osc"
kind = "sine"
frequency = 220

[[chains.nodes]]
id = "soft"
kind = "filter"
param = 0.3
inputs = ["osc"]

[[chains.nodes]]
id = "loud"
kind = "filter"
param = 0.7
inputs = ["osc"]

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["soft", "loud"]
release = "fade"
"#;

/// Returns every factory patch.
pub fn factory_patches() -> Vec<PatchDef> {
    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(name, toml)| match PatchDef::from_toml(toml) {
            Ok(patch) => Some(patch),
            Err(e) => {
                tracing::warn!(patch = name, error = %e, "factory patch failed to parse");
                None
            }
        })
        .collect()
}

/// Looks up a factory patch by name (case-insensitive).
pub fn get_factory_patch(name: &str) -> Option<PatchDef> {
    let name_lower = name.to_lowercase();
    FACTORY_PATCHES_TOML
        .iter()
        .find(|(patch_name, _)| *patch_name == name_lower)
        .and_then(|(_, toml)| PatchDef::from_toml(toml).ok())
}

/// Returns `true` if `name` is a factory patch.
pub fn is_factory_patch(name: &str) -> bool {
    get_factory_patch(name).is_some()
}

/// Resolves a factory patch name or a path to a TOML patch file.
///
/// Factory names win over files of the same name in the working directory.
pub fn find_patch(name_or_path: &str) -> Result<PatchDef, ConfigError> {
    if let Some(patch) = get_factory_patch(name_or_path) {
        return Ok(patch);
    }
    let path = Path::new(name_or_path);
    if path.is_file() {
        return PatchDef::load(path);
    }
    Err(ConfigError::PatchNotFound(name_or_path.to_string()))
}
