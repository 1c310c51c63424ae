//! Control-rate scheduler.
//!
//! [`ControlScheduler`] owns the shared [`Patch`] and an [`AudioSink`]. Each
//! [`tick()`](ControlScheduler::tick) runs [`Patch::control_tick`] under the
//! patch lock, then performs the resulting stream work with the lock
//! released:
//!
//! ```text
//!   lock patch ── control_tick ──► ControlPlan ── unlock
//!                                      │
//!          ┌───────────────────────────┼──────────────────────┐
//!          ▼                           ▼                      ▼
//!   Open: sink.open(render_callback)   Release: report   Close: handle.close()
//!          │
//!   lock patch ── attach_stream ── unlock
//! ```
//!
//! The render callback only ever locks the patch with a bounded wait, so a
//! slow control tick costs at most one silent buffer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::chain::ChainId;
use crate::error::EngineError;
use crate::patch::{Patch, Transition};
use crate::sink::{AudioSink, RenderCallback, RenderConfig, StreamControl, StreamHandle};

/// Default bound on how long a render callback waits for the patch lock.
pub const DEFAULT_LOCK_BUDGET: Duration = Duration::from_millis(2);

/// What one control tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Chains that started and now have a stream.
    pub started: Vec<ChainId>,
    /// `(chain, release)` pairs spliced this tick.
    pub released: Vec<(ChainId, ChainId)>,
    /// Chains that hard-stopped.
    pub stopped: Vec<ChainId>,
}

impl TickReport {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.released.is_empty() && self.stopped.is_empty()
    }
}

/// Fixed-interval loop ticking gates and chain timers.
pub struct ControlScheduler {
    patch: Arc<Mutex<Patch>>,
    sink: Box<dyn AudioSink>,
    render_config: RenderConfig,
    lock_budget: Duration,
}

impl ControlScheduler {
    /// Takes ownership of a patch and the sink its chains play through.
    pub fn new(patch: Patch, sink: Box<dyn AudioSink>) -> Self {
        Self::from_shared(Arc::new(Mutex::new(patch)), sink)
    }

    /// Uses a patch that is already shared.
    pub fn from_shared(patch: Arc<Mutex<Patch>>, sink: Box<dyn AudioSink>) -> Self {
        let render_config = RenderConfig::from_engine(patch.lock().config());
        tracing::info!(
            sink = sink.name(),
            sample_rate = render_config.sample_rate,
            frames_per_buffer = render_config.frames_per_buffer,
            "control scheduler created"
        );
        Self {
            patch,
            sink,
            render_config,
            lock_budget: DEFAULT_LOCK_BUDGET,
        }
    }

    /// Sets how long render callbacks wait for the patch lock.
    pub fn with_lock_budget(mut self, budget: Duration) -> Self {
        self.lock_budget = budget;
        self
    }

    /// The shared patch.
    pub fn patch(&self) -> &Arc<Mutex<Patch>> {
        &self.patch
    }

    /// Stream parameters used for every chain.
    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    /// Runs one control tick.
    ///
    /// All transitions of the tick are applied even if one fails; the first
    /// stream failure is returned after the affected chain has been returned
    /// to a consistent state.
    pub fn tick(&mut self) -> Result<TickReport, EngineError> {
        let plan = self.patch.lock().control_tick();

        let mut report = TickReport::default();
        let mut first_error = None;
        for transition in plan.transitions {
            match transition {
                Transition::Open { chain, generation } => match self.open_stream(chain, generation) {
                    Ok(()) => report.started.push(chain),
                    Err(e) => {
                        tracing::warn!(chain = %chain, error = %e, "stream open failed");
                        first_error.get_or_insert(e);
                    }
                },
                Transition::Release { chain, release } => report.released.push((chain, release)),
                Transition::Close { chain, stream } => {
                    report.stopped.push(chain);
                    match stream.map(StreamHandle::close) {
                        Some(Ok(())) => tracing::info!(chain = %chain, "stream closed"),
                        Some(Err(source)) => {
                            tracing::warn!(chain = %chain, error = %source, "stream close failed");
                            first_error.get_or_insert(EngineError::StreamClose { chain, source });
                        }
                        None => {}
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Ticks at the configured control rate until `running` is cleared, then
    /// stops every chain.
    ///
    /// Tick failures are logged and the loop continues; the failing chain is
    /// already back in the Stopped state.
    pub fn run(&mut self, running: &AtomicBool) {
        let period = self.patch.lock().config().control_period();
        tracing::info!(period_us = period.as_micros() as u64, "control loop started");
        let mut next = Instant::now();
        while running.load(Ordering::Acquire) {
            if let Err(e) = self.tick() {
                tracing::warn!(error = %e, "control tick failed");
            }
            next += period;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            } else {
                next = now;
            }
        }
        self.shutdown();
        tracing::info!("control loop stopped");
    }

    /// Hard-stops every active chain and closes its stream.
    pub fn shutdown(&mut self) {
        let streams = self.patch.lock().stop_all();
        for (chain, stream) in streams {
            if let Err(e) = stream.close() {
                tracing::warn!(chain = %chain, error = %e, "stream close failed");
            }
        }
    }

    fn open_stream(&mut self, chain: ChainId, generation: u64) -> Result<(), EngineError> {
        let callback = render_callback(&self.patch, chain, generation, self.lock_budget);
        match self.sink.open(&self.render_config, callback) {
            Ok(stream) => {
                tracing::info!(chain = %chain, sink = self.sink.name(), "stream opened");
                let leftover = self.patch.lock().attach_stream(chain, generation, stream);
                if let Some(stream) = leftover {
                    // The chain stopped between the plan and the open.
                    stream
                        .close()
                        .map_err(|source| EngineError::StreamClose { chain, source })?;
                }
                Ok(())
            }
            Err(source) => {
                self.patch.lock().abort_play(chain, generation);
                Err(EngineError::StreamOpen { chain, source })
            }
        }
    }
}

impl std::fmt::Debug for ControlScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlScheduler")
            .field("sink", &self.sink.name())
            .field("render_config", &self.render_config)
            .finish_non_exhaustive()
    }
}

/// Builds the render callback for one play generation of a chain.
///
/// The callback holds the patch weakly and locks it once per buffer with a
/// bounded wait. If the lock is not acquired in time the buffer is silent;
/// if the patch is gone or the chain is no longer on this generation it
/// reports [`StreamControl::Complete`].
pub fn render_callback(
    patch: &Arc<Mutex<Patch>>,
    chain: ChainId,
    generation: u64,
    budget: Duration,
) -> RenderCallback {
    let patch: Weak<Mutex<Patch>> = Arc::downgrade(patch);
    Box::new(move |out: &mut [f32]| {
        let Some(patch) = patch.upgrade() else {
            out.fill(0.0);
            return StreamControl::Complete;
        };
        let Some(mut guard) = patch.try_lock_for(budget) else {
            out.fill(0.0);
            return StreamControl::Continue;
        };
        guard.render(chain, generation, out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainState;
    use crate::config::EngineConfig;
    use crate::input::InputVector;
    use crate::nodes::{ChainStart, NodeKind, Square};
    use crate::param::Parameter;
    use crate::sink::OfflineSink;

    fn square_patch(inputs: &InputVector) -> (Patch, ChainId) {
        let mut patch = Patch::new("sq", EngineConfig::default(), inputs.clone());
        let start = patch.add_node(NodeKind::ChainStart(ChainStart::new(Parameter::input(1))));
        let sq = patch.add_node(NodeKind::Square(Square::new(Parameter::constant(100.0))));
        let out = patch.add_node(NodeKind::termination());
        patch.connect(start, sq).unwrap();
        patch.connect(sq, out).unwrap();
        let chain = patch.add_chain("sq", start, out, None).unwrap();
        (patch, chain)
    }

    #[test]
    fn tick_opens_and_closes_streams() {
        let inputs = InputVector::new();
        let (patch, chain) = square_patch(&inputs);
        let sink = OfflineSink::new();
        let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));

        assert!(scheduler.tick().unwrap().is_empty());
        inputs.set(1, 1.0);
        assert_eq!(scheduler.tick().unwrap().started, vec![chain]);
        assert_eq!(sink.open_streams(), 1);
        assert!(scheduler.patch().lock().chain(chain).unwrap().has_stream());

        let samples = sink.pull(64);
        assert!(samples.iter().all(|&s| (s.abs() - 0.5).abs() < 1e-6));

        inputs.set(1, 0.0);
        assert_eq!(scheduler.tick().unwrap().stopped, vec![chain]);
        assert_eq!(sink.open_streams(), 0);
        assert_eq!(sink.closed_total(), 1);
    }

    #[test]
    fn open_failure_returns_chain_to_stopped() {
        let inputs = InputVector::new();
        let (patch, chain) = square_patch(&inputs);
        let sink = OfflineSink::new();
        let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));

        sink.fail_next_open("no device");
        inputs.set(1, 1.0);
        let err = scheduler.tick().unwrap_err();
        assert!(matches!(err, EngineError::StreamOpen { chain: c, .. } if c == chain));
        assert!(!scheduler.patch().lock().chain(chain).unwrap().is_active());

        // The gate is still open, so the next tick retries.
        assert_eq!(scheduler.tick().unwrap().started, vec![chain]);
    }

    #[test]
    fn close_failure_is_reported_after_stop() {
        let inputs = InputVector::new();
        let (patch, chain) = square_patch(&inputs);
        let sink = OfflineSink::new();
        let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));

        inputs.set(1, 1.0);
        scheduler.tick().unwrap();
        sink.pull(32);

        sink.fail_next_close("device lost");
        inputs.set(1, 0.0);
        let err = scheduler.tick().unwrap_err();
        assert!(matches!(err, EngineError::StreamClose { chain: c, .. } if c == chain));

        {
            let patch = scheduler.patch().lock();
            let c = patch.chain(chain).unwrap();
            assert_eq!(c.state(), ChainState::Stopped);
            assert!(!c.has_stream());
            assert_eq!(c.termination(), c.original_termination());
            assert_eq!(c.time_elapsed(), 0.0);
            assert_eq!(patch.graph().age(c.source()), 0);
        }
        assert_eq!(sink.open_streams(), 0);

        // Nothing is left half-stopped: the next gate opens a fresh stream.
        inputs.set(1, 1.0);
        assert_eq!(scheduler.tick().unwrap().started, vec![chain]);
        assert_eq!(sink.open_streams(), 1);
    }

    #[test]
    fn callback_completes_when_patch_is_gone() {
        let inputs = InputVector::new();
        let (patch, chain) = square_patch(&inputs);
        let shared = Arc::new(Mutex::new(patch));
        let mut callback = render_callback(&shared, chain, 1, DEFAULT_LOCK_BUDGET);
        drop(shared);
        let mut out = [1.0f32; 4];
        assert_eq!(callback(&mut out[..]), StreamControl::Complete);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn shutdown_closes_everything() {
        let inputs = InputVector::new();
        let (patch, _) = square_patch(&inputs);
        let sink = OfflineSink::new();
        let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));
        inputs.set(1, 1.0);
        scheduler.tick().unwrap();
        scheduler.shutdown();
        assert_eq!(sink.open_streams(), 0);
    }
}
