//! Real-time patch playback command.

use super::common::{load_patch, parse_hold};
use crate::input::spawn_stdin_reader;
use clap::Args;
use gatesynth_core::{ControlScheduler, InputVector};
use gatesynth_io::CpalSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Args)]
pub struct PlayArgs {
    /// Factory patch name or path to a patch file
    #[arg(value_name = "PATCH")]
    patch: String,

    /// Output device (partial name match)
    #[arg(short, long)]
    device: Option<String>,

    /// Hold an input at a value for the whole session (e.g. "7=1.0")
    #[arg(long, value_parser = parse_hold, number_of_values = 1)]
    hold: Vec<(usize, f64)>,

    /// Do not read "SLOT VALUE" lines from stdin
    #[arg(long)]
    no_stdin: bool,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let def = load_patch(&args.patch)?;
    let inputs = InputVector::new();
    for &(slot, value) in &args.hold {
        inputs.set(slot, value);
    }
    let patch = def.build(inputs.clone())?;
    let config = *patch.config();

    println!("Playing patch '{}' ({} chains)", def.name, patch.chains().len());
    println!(
        "  Output: {}",
        args.device.as_deref().unwrap_or("default device")
    );
    println!(
        "  Sample rate: {} Hz, control rate: {} Hz",
        config.sample_rate, config.control_rate
    );
    let slots = def.gate_slots();
    if !slots.is_empty() {
        let slots: Vec<String> = slots.iter().map(usize::to_string).collect();
        println!("  Gates on input slots: {}", slots.join(", "));
    }
    if !args.no_stdin {
        println!("\nType 'SLOT VALUE' lines (e.g. '7 1') to drive inputs.");
    }
    println!("Press Ctrl+C to stop...\n");

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    // The reader thread is left to end at EOF or process exit.
    if !args.no_stdin {
        drop(spawn_stdin_reader(inputs, Arc::clone(&running)));
    }

    let sink = CpalSink::new(args.device);
    let mut scheduler = ControlScheduler::new(patch, Box::new(sink));
    scheduler.run(&running);

    println!("Stopped.");
    Ok(())
}
