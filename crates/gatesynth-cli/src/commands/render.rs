//! Offline render command.

use super::common::{GateWindow, load_patch, parse_gate, parse_hold};
use clap::Args;
use gatesynth_core::{ControlScheduler, InputVector, OfflineSink, render_ticks};
use gatesynth_io::write_wav;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Factory patch name or path to a patch file
    #[arg(value_name = "PATCH")]
    patch: String,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Length of the render in seconds
    #[arg(short, long, default_value = "4.0")]
    seconds: f64,

    /// Hold an input high over a window in seconds (e.g. "7@0.5-1.5")
    #[arg(long, value_parser = parse_gate, number_of_values = 1)]
    gate: Vec<GateWindow>,

    /// Hold an input at a value for the whole render (e.g. "3=1.0")
    #[arg(long, value_parser = parse_hold, number_of_values = 1)]
    hold: Vec<(usize, f64)>,
}

/// Input level of `slot` at `t` seconds: 1 inside any gate window for the
/// slot, else its held value, else 0.
fn level_at(slot: usize, t: f64, gates: &[GateWindow], holds: &[(usize, f64)]) -> f64 {
    if gates.iter().any(|g| g.slot == slot && g.contains(t)) {
        return 1.0;
    }
    holds
        .iter()
        .rev()
        .find(|(s, _)| *s == slot)
        .map_or(0.0, |&(_, v)| v)
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.seconds.is_nan() || args.seconds <= 0.0 {
        anyhow::bail!("--seconds must be positive");
    }

    let def = load_patch(&args.patch)?;
    let inputs = InputVector::new();
    let patch = def.build(inputs.clone())?;
    let config = *patch.config();

    let ticks = (args.seconds * config.control_rate).ceil() as usize;
    let mut slots: Vec<usize> = args
        .gate
        .iter()
        .map(|g| g.slot)
        .chain(args.hold.iter().map(|&(s, _)| s))
        .collect();
    slots.sort_unstable();
    slots.dedup();

    println!(
        "Rendering '{}' for {:.2}s ({} control ticks)...",
        def.name, args.seconds, ticks
    );

    let sink = OfflineSink::new();
    let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));

    let pb = ProgressBar::new(ticks as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let samples = render_ticks(&mut scheduler, &sink, ticks, |tick| {
        let t = tick as f64 / config.control_rate;
        for &slot in &slots {
            inputs.set(slot, level_at(slot, t, &args.gate, &args.hold));
        }
        pb.set_position(tick as u64 + 1);
    })?;
    scheduler.shutdown();
    pb.finish_with_message("done");

    write_wav(&args.output, &samples, config.sample_rate as u32)?;

    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    println!("Wrote {}", args.output.display());
    println!(
        "  {} samples at {} Hz, peak {:.3}",
        samples.len(),
        config.sample_rate,
        peak
    );
    Ok(())
}
