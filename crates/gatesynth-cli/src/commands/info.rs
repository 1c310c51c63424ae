//! Patch inspection command.

use super::common::load_patch;
use clap::Args;
use gatesynth_config::{DurationDef, NodeKindDef, ParamDef, START_NODE};
use gatesynth_core::InputVector;

#[derive(Args)]
pub struct InfoArgs {
    /// Factory patch name or path to a patch file
    #[arg(value_name = "PATCH")]
    patch: String,
}

fn describe_param(param: &ParamDef) -> String {
    match param {
        ParamDef::Constant(v) => format!("{}", v),
        ParamDef::Input { input } => format!("input {}", input),
        ParamDef::Chain { chain } => format!("chain '{}'", chain),
    }
}

fn describe_duration(duration: &DurationDef) -> String {
    match duration {
        DurationDef::Samples(n) => format!("{} samples", n),
        DurationDef::Note(name) => name.clone(),
    }
}

fn format_samples(samples: f64, sample_rate: f64) -> String {
    if samples < 0.0 {
        "unbounded".to_string()
    } else {
        format!("{} samples ({:.3}s)", samples, samples / sample_rate)
    }
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let def = load_patch(&args.patch)?;
    // Building catches every reference and graph error up front.
    let patch = def.build(InputVector::new())?;
    let config = patch.config();

    println!("Patch: {}", def.name);
    if let Some(description) = &def.description {
        println!("  {}", description);
    }
    println!();
    println!("Engine:");
    println!("  Sample rate:   {} Hz", config.sample_rate);
    println!("  Control rate:  {} Hz", config.control_rate);
    println!("  Buffer size:   {} frames", config.frames_per_buffer);
    println!("  Volume:        {}", config.volume);
    println!();
    println!("Chains ({}):", def.chains.len());

    for chain_def in &def.chains {
        let Some(chain) = patch
            .chain_by_name(&chain_def.name)
            .and_then(|id| patch.chain(id))
        else {
            continue;
        };

        println!();
        println!("  {}", chain_def.name);
        match &chain_def.gate {
            Some(gate) => println!(
                "    Gate:      {} >= {}",
                describe_param(&gate.param),
                gate.threshold
            ),
            None => println!("    Gate:      none (release or parameter source)"),
        }
        println!(
            "    Duration:  {}",
            format_samples(chain.base_duration(), config.sample_rate)
        );

        let mut nodes: Vec<String> = Vec::with_capacity(chain_def.nodes.len());
        for node in &chain_def.nodes {
            let mut line = format!("{} ({})", node.id, node.kind.name());
            if let NodeKindDef::Termination {
                release: Some(release),
            } = &node.kind
            {
                line.push_str(&format!(", releases into '{}'", release));
            }
            if let NodeKindDef::LinearDecay { duration } = &node.kind {
                line.push_str(&format!(", {}", describe_duration(duration)));
            }
            if let NodeKindDef::Filter { param, .. } = &node.kind {
                line.push_str(&format!(", gain {}", describe_param(param)));
            }
            if !node.inputs.is_empty() {
                line.push_str(&format!(" <- {}", node.inputs.join(", ")));
            } else if chain_def.gate.is_some() {
                line.push_str(&format!(" <- {}", START_NODE));
            }
            nodes.push(line);
        }
        println!("    Nodes:");
        for line in nodes {
            println!("      {}", line);
        }
    }

    let slots = def.gate_slots();
    println!();
    if slots.is_empty() {
        println!("No gated inputs.");
    } else {
        let slots: Vec<String> = slots.iter().map(usize::to_string).collect();
        println!("Gated inputs: {}", slots.join(", "));
    }

    Ok(())
}
