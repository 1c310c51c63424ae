//! Integration tests for gatesynth-cli.
//!
//! Tests run the built binary and check listings, patch inspection and
//! offline rendering end to end.

use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `gatesynth` binary built by cargo.
fn gatesynth_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gatesynth"))
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[test]
fn cli_help_lists_subcommands() {
    let output = gatesynth_bin()
        .arg("--help")
        .output()
        .expect("failed to run gatesynth --help");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["play", "render", "info", "patches", "devices"] {
        assert!(stdout.contains(command), "help should mention '{command}'");
    }
}

#[test]
fn cli_patches_lists_factory_patches() {
    let output = gatesynth_bin()
        .arg("patches")
        .output()
        .expect("failed to run gatesynth patches");
    assert!(output.status.success(), "gatesynth patches failed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Factory Patches"));
    for name in gatesynth_config::FACTORY_PATCH_NAMES {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

#[test]
fn cli_info_shows_chains_and_gates() {
    let output = gatesynth_bin()
        .args(["info", "buttons"])
        .output()
        .expect("failed to run gatesynth info");
    assert!(output.status.success(), "gatesynth info failed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Patch: buttons"));
    assert!(stdout.contains("Chains (7)"));
    assert!(stdout.contains("kick_drum"));
    assert!(stdout.contains("releases into 'eighth_decay'"));
    assert!(stdout.contains("Gated inputs: 3, 4, 5, 6, 7"));
}

#[test]
fn cli_info_reads_patch_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drone.toml");
    std::fs::write(
        &path,
        r#"
name = "drone"

[[chains]]
name = "hum"
gate = { param = { input = 1 } }

[[chains.nodes]]
id = "osc"
kind = "sine"
frequency = 110

[[chains.nodes]]
id = "out"
kind = "termination"
inputs = ["osc"]
"#,
    )
    .unwrap();

    let output = gatesynth_bin()
        .arg("info")
        .arg(&path)
        .output()
        .expect("failed to run gatesynth info");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Patch: drone"));
    assert!(stdout.contains("osc (sine) <- start"));
}

#[test]
fn cli_info_unknown_patch_fails() {
    let output = gatesynth_bin()
        .args(["info", "no-such-patch"])
        .output()
        .expect("failed to run gatesynth info");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gatesynth patches"));
}

#[test]
fn cli_info_rejects_broken_patch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        "name = \"broken\"\n[[chains]]\nname = \"a\"\n[[chains.nodes]]\nid = \"osc\"\nkind = \"sine\"\n",
    )
    .unwrap();

    let output = gatesynth_bin()
        .arg("info")
        .arg(&path)
        .output()
        .expect("failed to run gatesynth info");
    assert!(!output.status.success(), "a chain without termination must fail");
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn cli_render_writes_wav() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kick.wav");

    let output = gatesynth_bin()
        .args(["render", "buttons", "--seconds", "1", "--gate", "4@0-0.5", "-o"])
        .arg(&path)
        .output()
        .expect("failed to run gatesynth render");
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (samples, rate) = gatesynth_io::read_wav(&path).unwrap();
    assert_eq!(rate, 19200);
    // 128 control ticks of 150 samples each.
    assert_eq!(samples.len(), 19200);
    assert!(samples.iter().all(|s| s.is_finite()));
    assert!(samples.iter().any(|&s| s != 0.0), "kick should be audible");
}

#[test]
fn cli_render_without_gates_is_silent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quiet.wav");

    let output = gatesynth_bin()
        .args(["render", "diamond", "--seconds", "0.5", "-o"])
        .arg(&path)
        .output()
        .expect("failed to run gatesynth render");
    assert!(output.status.success());

    let (samples, _) = gatesynth_io::read_wav(&path).unwrap();
    assert_eq!(samples.len(), 64 * 150);
    assert!(samples.iter().all(|&s| s == 0.0));
}

#[test]
fn cli_render_rejects_bad_gate() {
    let output = gatesynth_bin()
        .args(["render", "buttons", "--gate", "9@0-1", "-o", "unused.wav"])
        .output()
        .expect("failed to run gatesynth render");
    assert!(!output.status.success());
}
