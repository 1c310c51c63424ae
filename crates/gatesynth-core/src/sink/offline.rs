//! Deterministic in-process sink.
//!
//! [`OfflineSink`] never touches an audio device. Streams it opens are only
//! rendered when the owner calls [`pull()`](OfflineSink::pull), which mixes
//! every open stream into one buffer. Tests use it to drive the whole
//! play/release/stop lifecycle sample-accurately; the CLI uses it to render
//! patches to WAV.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    AudioSink, RenderCallback, RenderConfig, RenderStream, SinkError, StreamControl, StreamHandle,
};
use crate::error::EngineError;
use crate::scheduler::ControlScheduler;

struct OfflineStream {
    id: u64,
    callback: RenderCallback,
    complete: bool,
}

#[derive(Default)]
struct OfflineState {
    streams: Vec<OfflineStream>,
    next_id: u64,
    opened_total: usize,
    closed_total: usize,
    fail_next_open: Option<String>,
    fail_next_close: Option<String>,
    scratch: Vec<f32>,
}

/// Sink that renders on demand.
///
/// Cloning is cheap; every clone shares the same set of streams, so a test
/// can hand one clone to the scheduler and pull from another.
#[derive(Clone, Default)]
pub struct OfflineSink {
    state: Arc<Mutex<OfflineState>>,
}

impl OfflineSink {
    /// Creates a sink with no open streams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `frames` samples, summing every open stream.
    pub fn pull(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.pull_into(&mut out);
        out
    }

    /// Renders into `out`, summing every open stream.
    ///
    /// Streams whose callback reported [`StreamControl::Complete`] are
    /// skipped until they are closed.
    pub fn pull_into(&self, out: &mut [f32]) {
        out.fill(0.0);
        let mut state = self.state.lock();
        let OfflineState {
            streams, scratch, ..
        } = &mut *state;
        scratch.resize(out.len(), 0.0);
        for stream in streams.iter_mut().filter(|s| !s.complete) {
            scratch.fill(0.0);
            if (stream.callback)(scratch.as_mut_slice()) == StreamControl::Complete {
                stream.complete = true;
            }
            for (o, s) in out.iter_mut().zip(scratch.iter()) {
                *o += *s;
            }
        }
    }

    /// Number of streams currently open.
    pub fn open_streams(&self) -> usize {
        self.state.lock().streams.len()
    }

    /// Streams opened since creation.
    pub fn opened_total(&self) -> usize {
        self.state.lock().opened_total
    }

    /// Streams closed since creation.
    pub fn closed_total(&self) -> usize {
        self.state.lock().closed_total
    }

    /// Makes the next [`open()`](AudioSink::open) fail with `reason`.
    pub fn fail_next_open(&self, reason: impl Into<String>) {
        self.state.lock().fail_next_open = Some(reason.into());
    }

    /// Makes the next stream stop report failure with `reason`. The stream
    /// is still removed.
    pub fn fail_next_close(&self, reason: impl Into<String>) {
        self.state.lock().fail_next_close = Some(reason.into());
    }
}

impl std::fmt::Debug for OfflineSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineSink")
            .field("open_streams", &self.open_streams())
            .finish_non_exhaustive()
    }
}

impl AudioSink for OfflineSink {
    fn name(&self) -> &str {
        "offline"
    }

    fn open(
        &mut self,
        _config: &RenderConfig,
        callback: RenderCallback,
    ) -> Result<StreamHandle, SinkError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next_open.take() {
            return Err(SinkError::Stream(reason));
        }
        let id = state.next_id;
        state.next_id += 1;
        state.opened_total += 1;
        state.streams.push(OfflineStream {
            id,
            callback,
            complete: false,
        });
        Ok(StreamHandle::new(OfflineStreamRef {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

struct OfflineStreamRef {
    id: u64,
    state: Arc<Mutex<OfflineState>>,
}

impl RenderStream for OfflineStreamRef {
    fn stop(&mut self) -> Result<(), SinkError> {
        let (removed, failure) = {
            let mut state = self.state.lock();
            let idx = state.streams.iter().position(|s| s.id == self.id);
            let removed = idx.map(|i| state.streams.remove(i));
            if removed.is_some() {
                state.closed_total += 1;
            }
            (removed, state.fail_next_close.take())
        };
        // The callback may own patch references; drop it outside the sink lock.
        drop(removed);
        match failure {
            Some(reason) => Err(SinkError::Stream(reason)),
            None => Ok(()),
        }
    }
}

/// Drives `scheduler` for `ticks` control ticks, pulling one tick's worth of
/// frames from `sink` after each.
///
/// `before_tick` runs before every tick with the tick index, which is where
/// tests and offline renders change inputs.
pub fn render_ticks(
    scheduler: &mut ControlScheduler,
    sink: &OfflineSink,
    ticks: usize,
    mut before_tick: impl FnMut(usize),
) -> Result<Vec<f32>, EngineError> {
    let frames = scheduler.patch().lock().config().frames_per_tick();
    let mut samples = vec![0.0; ticks * frames];
    for (tick, chunk) in samples.chunks_mut(frames).enumerate() {
        before_tick(tick);
        scheduler.tick()?;
        sink.pull_into(chunk);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f32) -> RenderCallback {
        Box::new(move |out: &mut [f32]| {
            out.fill(value);
            StreamControl::Continue
        })
    }

    #[test]
    fn pull_mixes_open_streams() {
        let mut sink = OfflineSink::new();
        let a = sink.open(&RenderConfig::default(), constant(0.25)).unwrap();
        let _b = sink.open(&RenderConfig::default(), constant(0.5)).unwrap();
        assert_eq!(sink.pull(4), vec![0.75; 4]);
        a.close().unwrap();
        assert_eq!(sink.pull(2), vec![0.5; 2]);
        assert_eq!(sink.opened_total(), 2);
        assert_eq!(sink.closed_total(), 1);
    }

    #[test]
    fn completed_stream_is_skipped() {
        let mut sink = OfflineSink::new();
        let mut calls = 0;
        let _h = sink
            .open(
                &RenderConfig::default(),
                Box::new(move |out: &mut [f32]| {
                    calls += 1;
                    out.fill(1.0);
                    if calls >= 2 { StreamControl::Complete } else { StreamControl::Continue }
                }),
            )
            .unwrap();
        assert_eq!(sink.pull(1), vec![1.0]);
        assert_eq!(sink.pull(1), vec![1.0]);
        assert_eq!(sink.pull(1), vec![0.0]);
        assert_eq!(sink.open_streams(), 1);
    }

    #[test]
    fn injected_open_failure() {
        let mut sink = OfflineSink::new();
        sink.fail_next_open("device busy");
        let err = sink.open(&RenderConfig::default(), constant(0.0)).unwrap_err();
        assert_eq!(err, SinkError::Stream("device busy".into()));
        assert!(sink.open(&RenderConfig::default(), constant(0.0)).is_ok());
    }

    #[test]
    fn injected_close_failure() {
        let mut sink = OfflineSink::new();
        let a = sink.open(&RenderConfig::default(), constant(1.0)).unwrap();
        let b = sink.open(&RenderConfig::default(), constant(1.0)).unwrap();
        sink.fail_next_close("device lost");
        assert_eq!(a.close(), Err(SinkError::Stream("device lost".into())));
        assert_eq!(sink.open_streams(), 1);
        assert!(b.close().is_ok());
        assert_eq!(sink.closed_total(), 2);
    }

    #[test]
    fn dropping_handle_closes_stream() {
        let mut sink = OfflineSink::new();
        drop(sink.open(&RenderConfig::default(), constant(1.0)).unwrap());
        assert_eq!(sink.open_streams(), 0);
        assert_eq!(sink.closed_total(), 1);
    }
}
