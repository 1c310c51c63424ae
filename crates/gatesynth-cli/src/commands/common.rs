//! Shared CLI helpers used across multiple commands.

use gatesynth_config::{ConfigError, PatchDef, find_patch};
use gatesynth_core::{INPUT_SLOTS, InputVector};

/// An input slot held high over `[start, end)` seconds of a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateWindow {
    /// Input slot, 1-based.
    pub slot: usize,
    /// Window start in seconds.
    pub start: f64,
    /// Window end in seconds.
    pub end: f64,
}

impl GateWindow {
    /// Returns `true` if `t` seconds falls inside the window.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

fn parse_slot(s: &str) -> Result<usize, String> {
    let slot: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid input slot: '{}'", s))?;
    if !InputVector::is_valid_slot(slot) {
        return Err(format!("Input slot {} out of range (1..={})", slot, INPUT_SLOTS));
    }
    Ok(slot)
}

fn parse_number(s: &str) -> Result<f64, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{}'", s))
}

/// Parse a `SLOT=VALUE` string for clap's `value_parser`.
pub fn parse_hold(s: &str) -> Result<(usize, f64), String> {
    let Some((slot, value)) = s.split_once('=') else {
        return Err(format!("Invalid hold format: '{}' (expected SLOT=VALUE)", s));
    };
    Ok((parse_slot(slot)?, parse_number(value)?))
}

/// Parse a `SLOT@START-END` string (seconds) for clap's `value_parser`.
pub fn parse_gate(s: &str) -> Result<GateWindow, String> {
    let format_err = || format!("Invalid gate format: '{}' (expected SLOT@START-END)", s);
    let (slot, window) = s.split_once('@').ok_or_else(format_err)?;
    let (start, end) = window.split_once('-').ok_or_else(format_err)?;
    let window = GateWindow {
        slot: parse_slot(slot)?,
        start: parse_number(start)?,
        end: parse_number(end)?,
    };
    if window.end <= window.start {
        return Err(format!("Gate window '{}' ends before it starts", s));
    }
    Ok(window)
}

/// Load a patch by factory name or path.
pub fn load_patch(name: &str) -> anyhow::Result<PatchDef> {
    match find_patch(name) {
        Ok(patch) => Ok(patch),
        Err(ConfigError::PatchNotFound(_)) => anyhow::bail!(
            "Patch '{}' not found. Use 'gatesynth patches' to see factory patches.",
            name
        ),
        Err(e) => Err(e.into()),
    }
}
