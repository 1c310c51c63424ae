//! Integration tests for gatesynth-io: offline renders written to WAV.

use gatesynth_core::nodes::{ChainStart, Square};
use gatesynth_core::{
    ControlScheduler, EngineConfig, InputVector, NodeKind, OfflineSink, Parameter, Patch,
    render_ticks,
};
use gatesynth_io::{read_wav, write_wav};
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Offline render to file
// ---------------------------------------------------------------------------

fn square_patch(inputs: &InputVector) -> Patch {
    let mut patch = Patch::new("square", EngineConfig::default(), inputs.clone());
    let start = patch.add_node(NodeKind::ChainStart(ChainStart::new(Parameter::input(2))));
    let square = patch.add_node(NodeKind::Square(Square::new(Parameter::constant(200.0))));
    let term = patch.add_node(NodeKind::termination());
    patch.connect(start, square).unwrap();
    patch.connect(square, term).unwrap();
    patch.add_chain("square", start, term, None).unwrap();
    patch
}

#[test]
fn gated_render_round_trips_through_wav() {
    let inputs = InputVector::new();
    let sink = OfflineSink::new();
    let mut scheduler = ControlScheduler::new(square_patch(&inputs), Box::new(sink.clone()));

    // Gate open for ticks 2..6.
    let samples = render_ticks(&mut scheduler, &sink, 10, |tick| {
        inputs.set(2, if (2..6).contains(&tick) { 1.0 } else { 0.0 });
    })
    .unwrap();
    assert_eq!(samples.len(), 1500);

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, 19200).unwrap();
    let (loaded, sample_rate) = read_wav(file.path()).unwrap();
    assert_eq!(sample_rate, 19200);
    assert_eq!(loaded, samples);

    assert!(loaded[..300].iter().all(|&s| s == 0.0));
    assert!(loaded[300..900].iter().all(|&s| (s.abs() - 0.5).abs() < 1e-6));
    assert!(loaded[900..].iter().all(|&s| s == 0.0));
}

#[test]
fn empty_render_writes_valid_file() {
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &[], 19200).unwrap();
    let (loaded, _) = read_wav(file.path()).unwrap();
    assert!(loaded.is_empty());
}
