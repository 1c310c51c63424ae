//! Audio output device listing command.

use gatesynth_io::list_output_devices;

pub fn run() -> anyhow::Result<()> {
    let devices = list_output_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    println!("Output Devices");
    println!("==============\n");

    for (idx, device) in devices.iter().enumerate() {
        let rate = device
            .default_sample_rate
            .map_or_else(|| "unknown rate".to_string(), |r| format!("{} Hz", r));
        let marker = if device.is_default { " (default)" } else { "" };
        println!("  [{}] {} ({}){}", idx, device.name, rate, marker);
    }

    println!("\nPass a name (or part of one) to 'gatesynth play --device'.");
    Ok(())
}
