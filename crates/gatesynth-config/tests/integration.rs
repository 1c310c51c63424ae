//! Integration tests for gatesynth-config.
//!
//! These tests load patches from disk, build them and drive them through
//! the offline sink end to end.

use gatesynth_config::{ConfigError, PatchDef, find_patch, get_factory_patch};
use gatesynth_core::{ControlScheduler, InputVector, OfflineSink, render_ticks};
use tempfile::TempDir;

const LFO_PATCH: &str = r#"
name = "wobble"
description = "Square tone whose level follows a slow triangle"

[engine]
volume = 1.0

[[chains]]
name = "tone"
gate = { param = { input = 1 }, threshold = 0.5 }

[[chains.nodes]]
id = "osc"
kind = "square"
frequency = 300

[[chains.nodes]]
id = "level"
kind = "filter"
param = { chain = "lfo" }
inputs = ["osc"]

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["level"]

[[chains]]
name = "lfo"
gate = { param = { input = 1 }, threshold = 0.5 }

[[chains.nodes]]
id = "tri"
kind = "triangle"
frequency = 2
amplitude = 0.5
translate = 0.5

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["tri"]
"#;

/// Load a patch from a file and check its definition survives.
#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wobble.toml");
    std::fs::write(&path, LFO_PATCH).unwrap();

    let def = PatchDef::load(&path).unwrap();
    assert_eq!(def.name, "wobble");
    assert_eq!(def.engine_config().volume, 1.0);
    assert_eq!(def.chains.len(), 2);
    assert_eq!(def.chain("tone").unwrap().gate.as_ref().unwrap().threshold, 0.5);

    let found = find_patch(path.to_str().unwrap()).unwrap();
    assert_eq!(found.name, "wobble");
}

/// A missing file is a read error, not a parse error.
#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = PatchDef::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

/// Malformed TOML surfaces the parser error.
#[test]
fn test_parse_error() {
    let err = PatchDef::from_toml("name = ").unwrap_err();
    assert!(matches!(err, ConfigError::TomlParse(_)));

    let err = PatchDef::from_toml("name = \"x\"\n[[chains]]\nname = \"a\"\n[[chains.nodes]]\nid = \"n\"\nkind = \"theremin\"\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::TomlParse(_)));
}

/// The gate threshold comes from the file: 0.3 stays closed, 0.6 opens.
#[test]
fn test_threshold_and_chain_modulation() {
    let inputs = InputVector::new();
    let patch = PatchDef::from_toml(LFO_PATCH)
        .unwrap()
        .build(inputs.clone())
        .unwrap();
    let sink = OfflineSink::new();
    let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));

    inputs.set(1, 0.3);
    assert!(scheduler.tick().unwrap().is_empty());

    inputs.set(1, 0.6);
    let report = scheduler.tick().unwrap();
    assert_eq!(report.started.len(), 2);

    // One second of sound: the lfo chain adds its own 0..1 triangle to the
    // mix, and the tone's level follows it, so the sum stays within 2.
    let samples = render_ticks(&mut scheduler, &sink, 128, |_| {}).unwrap();
    assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 2.0 + 1e-6));
    assert!(samples.iter().any(|&s| s > 1.0));
}

fn release_patch(fade_nodes: &str) -> String {
    format!(
        r#"
name = "tail"

[[chains]]
name = "tone"
gate = {{ param = {{ input = 1 }} }}

[[chains.nodes]]
id = "osc"
kind = "square"
frequency = 200

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["osc"]
release = "fade"

[[chains]]
name = "fade"
duration = "eighth"
{fade_nodes}"#
    )
}

const FADE_IN_ORDER: &str = r#"
[[chains.nodes]]
id = "decay"
kind = "linear_decay"
duration = "eighth"

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["decay"]
"#;

const FADE_REVERSED: &str = r#"
[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["decay"]

[[chains.nodes]]
id = "decay"
kind = "linear_decay"
duration = "eighth"
"#;

fn render_gated(toml_str: &str, ticks: usize, gate_ticks: usize) -> Vec<f32> {
    let inputs = InputVector::new();
    let patch = PatchDef::from_toml(toml_str)
        .unwrap()
        .build(inputs.clone())
        .unwrap();
    let sink = OfflineSink::new();
    let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));
    let samples = render_ticks(&mut scheduler, &sink, ticks, |tick| {
        inputs.set(1, if tick < gate_ticks { 1.0 } else { 0.0 });
    })
    .unwrap();
    scheduler.shutdown();
    samples
}

/// Listing a release chain's nodes in another order changes nothing audible.
#[test]
fn test_release_node_order_is_irrelevant() {
    let ordered = render_gated(&release_patch(FADE_IN_ORDER), 24, 2);
    let reversed = render_gated(&release_patch(FADE_REVERSED), 24, 2);
    assert_eq!(ordered, reversed);

    // The 2400-sample fade starts once the gate closes at tick 2.
    let peak = |range: std::ops::Range<usize>| {
        ordered[range].iter().fold(0.0f32, |m, s| m.max(s.abs()))
    };
    assert!((peak(0..300) - 0.5).abs() < 1e-6);
    assert!(peak(2100..2400) < 0.25);
    assert!(peak(2100..2400) > 0.0);
}

/// Misspelled keys are rejected instead of falling back to defaults.
#[test]
fn test_unknown_keys_are_rejected() {
    let typo = LFO_PATCH.replace("frequency = 300", "frequncy = 300");
    let err = PatchDef::from_toml(&typo).unwrap_err();
    assert!(matches!(err, ConfigError::TomlParse(_)));

    let typo = LFO_PATCH.replace("threshold = 0.5", "treshold = 0.5");
    assert!(PatchDef::from_toml(&typo).is_err());
}

/// Every factory patch renders a few ticks with all its gates held.
#[test]
fn test_factory_patches_render() {
    for name in gatesynth_config::FACTORY_PATCH_NAMES {
        let def = get_factory_patch(name).unwrap();
        let inputs = InputVector::new();
        let patch = def.build(inputs.clone()).unwrap();
        let sink = OfflineSink::new();
        let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));

        for slot in def.gate_slots() {
            inputs.set(slot, 1.0);
        }
        let samples = render_ticks(&mut scheduler, &sink, 8, |_| {}).unwrap();
        assert!(samples.iter().all(|s| s.is_finite()), "{name}");
        assert!(samples.iter().any(|&s| s != 0.0), "{name} is silent");

        scheduler.shutdown();
        assert_eq!(sink.open_streams(), 0, "{name}");
    }
}
