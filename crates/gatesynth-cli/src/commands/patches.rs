//! Factory patch listing command.

use gatesynth_config::factory_patches;

pub fn run() -> anyhow::Result<()> {
    println!("Factory Patches");
    println!("===============\n");

    for patch in factory_patches() {
        let slots: Vec<String> = patch.gate_slots().iter().map(usize::to_string).collect();
        println!("  {:<12} {}", patch.name, patch.description.as_deref().unwrap_or(""));
        println!(
            "  {:<12} {} chains, gates on input {}",
            "",
            patch.chains.len(),
            if slots.is_empty() {
                "-".to_string()
            } else {
                slots.join(", ")
            }
        );
    }

    println!("\nUse 'gatesynth info <PATCH>' for details.");
    Ok(())
}
