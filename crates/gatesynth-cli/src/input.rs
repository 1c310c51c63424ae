//! Input acquisition from stdin.
//!
//! Each line is `SLOT VALUE` (for example `7 1.0`), written into the shared
//! input vector as soon as it is read. This stands in for a hardware button
//! reader: anything that can print lines, such as a GPIO poller piped into
//! `gatesynth play`, can drive the gates.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use gatesynth_core::InputVector;

/// Parses one `SLOT VALUE` line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<(usize, f64)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    let (Some(slot), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected 'SLOT VALUE', got '{}'", line));
    };
    let slot: usize = slot
        .parse()
        .map_err(|_| format!("invalid slot '{}'", slot))?;
    let value: f64 = value
        .parse()
        .map_err(|_| format!("invalid value '{}'", value))?;
    if !InputVector::is_valid_slot(slot) {
        return Err(format!("slot {} out of range", slot));
    }
    Ok(Some((slot, value)))
}

/// Applies every line of `reader` to `inputs` until EOF or until `running`
/// is cleared. Malformed lines are logged and skipped.
pub fn pump<R: BufRead>(reader: R, inputs: &InputVector, running: &AtomicBool) {
    for line in reader.lines() {
        if !running.load(Ordering::Acquire) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "input read failed");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some((slot, value))) => {
                inputs.set(slot, value);
                tracing::debug!(slot, value, "input");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring input line"),
        }
    }
}

/// Reads stdin on a background thread.
///
/// The thread ends at EOF; inputs keep their last values.
pub fn spawn_stdin_reader(inputs: InputVector, running: Arc<AtomicBool>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        pump(stdin.lock(), &inputs, &running);
        tracing::debug!("stdin closed");
    })
}
