// Fixed-rate render loop.
//
// Each iteration snapshots commands, advances the face by one fixed `dt`,
// submits the frame and sleeps out whatever is left of the budget. Overruns
// are absorbed as drift: frames are never doubled up to catch up.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, trace, warn};

use crate::display::DisplaySink;
use crate::engine::EyeEngine;
use crate::error::{EngineError, Result};
use crate::face::Face;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Cloneable stop switch; safe to call from inside the render thread.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Opens the display on the render thread, once per `start`.
pub type SinkFactory = Box<dyn FnMut() -> Result<Box<dyn DisplaySink>> + Send>;

type Parts = (Face, SinkFactory);

pub struct FrameScheduler {
    engine: EyeEngine,
    running: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    parts: Option<Parts>,
    worker: Option<JoinHandle<Parts>>,
    dt: f64,
}

impl FrameScheduler {
    pub fn new<F>(engine: &EyeEngine, open_sink: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn DisplaySink>> + Send + 'static,
    {
        let config = engine.config();
        let open_sink: SinkFactory = Box::new(open_sink);
        Self {
            engine: engine.clone(),
            running: Arc::new(AtomicBool::new(false)),
            frames: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
            parts: Some((Face::new(config), open_sink)),
            worker: None,
            dt: config.frame_dt(),
        }
    }

    /// Render into a clone of `sink` each time the loop starts.
    pub fn with_sink<S>(engine: &EyeEngine, sink: S) -> Self
    where
        S: DisplaySink + Clone + Send + 'static,
    {
        Self::new(engine, move || {
            let sink: Box<dyn DisplaySink> = Box::new(sink.clone());
            Ok(sink)
        })
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// Start the loop on its own thread and wait until its display is open.
    ///
    /// Returns `Ok(false)` if already running, and the sink's error if the
    /// display could not be opened (the scheduler is then stopped again).
    pub fn start(&mut self) -> Result<bool> {
        if self.state() == SchedulerState::Running {
            return Ok(false);
        }
        self.join();
        let Some((face, open_sink)) = self.parts.take() else {
            warn!("scheduler has nothing to run");
            return Ok(false);
        };

        self.running.store(true, Ordering::Release);
        let worker = RenderLoop {
            engine: self.engine.clone(),
            running: self.running.clone(),
            frames: self.frames.clone(),
            dropped: self.dropped.clone(),
            dt: self.dt,
        };
        let (ready_tx, ready_rx) = mpsc::channel();
        self.worker = Some(thread::spawn(move || worker.run(face, open_sink, ready_tx)));

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => {
                self.join();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::Release);
                self.join();
                Err(EngineError::DisplaySubmitFailure(
                    "render thread exited before the display opened".into(),
                ))
            }
        }
    }

    /// Ask the loop to stop after the current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.running.clone())
    }

    /// Wait for a stopped loop to exit and take its state back.
    pub fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(parts) => self.parts = Some(parts),
                Err(_) => warn!("render thread panicked"),
            }
        }
    }

    /// Stop and wait.
    pub fn shutdown(&mut self) {
        self.stop();
        self.join();
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// The face, while the loop isn't holding it.
    pub fn face(&self) -> Option<&Face> {
        self.parts.as_ref().map(|(face, _)| face)
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct RenderLoop {
    engine: EyeEngine,
    running: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    dt: f64,
}

impl RenderLoop {
    fn run(self, mut face: Face, mut open_sink: SinkFactory, ready: Sender<Result<()>>) -> Parts {
        let mut sink = match open_sink() {
            Ok(sink) => sink,
            Err(e) => {
                warn!(error = %e, "display failed to open");
                self.running.store(false, Ordering::Release);
                let _ = ready.send(Err(e));
                return (face, open_sink);
            }
        };
        info!(fps = self.engine.config().fps, sink = sink.name(), "render loop starting");
        let _ = ready.send(Ok(()));

        let budget = Duration::from_secs_f64(self.dt);
        while self.running.load(Ordering::Acquire) {
            let started = Instant::now();

            let commands = self.engine.take_snapshot();
            let frame = face.tick(&commands, self.dt);
            if let Err(e) = sink.submit(&frame) {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, sink = sink.name(), "frame dropped");
            }
            self.frames.fetch_add(1, Ordering::Relaxed);

            let elapsed = started.elapsed();
            match budget.checked_sub(elapsed) {
                Some(rest) => thread::sleep(rest),
                None => trace!(?elapsed, ?budget, "frame overrun"),
            }
        }

        info!(frames = self.frames.load(Ordering::Relaxed), "render loop stopped");
        (face, open_sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::display::MemorySink;
    use crate::emotion::Emotion;
    use crate::frame::Frame;

    #[derive(Clone)]
    struct FailingSink {
        attempts: Arc<AtomicU64>,
    }

    impl DisplaySink for FailingSink {
        fn submit(&mut self, _frame: &Frame) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            Err(EngineError::DisplaySubmitFailure("bus timeout".into()))
        }
    }

    /// Takes `delay` to push every frame out.
    #[derive(Clone)]
    struct SlowSink {
        inner: MemorySink,
        delay: Duration,
    }

    impl DisplaySink for SlowSink {
        fn submit(&mut self, frame: &Frame) -> Result<()> {
            thread::sleep(self.delay);
            self.inner.submit(frame)
        }
    }

    fn engine() -> EyeEngine {
        EyeEngine::new(EngineConfig {
            fps: 100,
            seed: Some(1),
            ..EngineConfig::default()
        })
    }

    fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn runs_until_stopped_and_can_restart() {
        let engine = engine();
        let sink = MemorySink::new(4);
        let mut scheduler = FrameScheduler::with_sink(&engine, sink.clone());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        assert!(scheduler.start().unwrap());
        assert!(!scheduler.start().unwrap());
        assert_eq!(scheduler.state(), SchedulerState::Running);
        wait_for(|| sink.submitted() >= 5);

        scheduler.shutdown();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        let rendered = scheduler.frames_rendered();
        assert_eq!(sink.submitted(), rendered);
        assert!(scheduler.face().is_some());

        assert!(scheduler.start().unwrap());
        wait_for(|| sink.submitted() > rendered);
        scheduler.shutdown();
    }

    #[test]
    fn emotion_commands_reach_the_loop() {
        let engine = engine();
        let sink = MemorySink::new(1);
        let mut scheduler = FrameScheduler::with_sink(&engine, sink.clone());
        scheduler.start().unwrap();
        engine.set_emotion("angry").unwrap();
        let before = sink.submitted();
        wait_for(|| sink.submitted() > before + 2);
        scheduler.shutdown();

        let face = scheduler.face().unwrap();
        assert_eq!(face.expression().emotion(), Emotion::Angry);
    }

    #[test]
    fn failed_submissions_are_dropped_not_fatal() {
        let engine = engine();
        let attempts = Arc::new(AtomicU64::new(0));
        let sink = FailingSink { attempts: attempts.clone() };
        let mut scheduler = FrameScheduler::with_sink(&engine, sink);
        scheduler.start().unwrap();
        wait_for(|| attempts.load(Ordering::Relaxed) >= 5);
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.shutdown();
        assert_eq!(scheduler.frames_dropped(), scheduler.frames_rendered());
        assert!(scheduler.frames_dropped() >= 5);
    }

    #[test]
    fn display_that_fails_to_open_is_reported() {
        let engine = engine();
        let mut scheduler = FrameScheduler::new(&engine, || {
            Err(EngineError::DisplaySubmitFailure("no panel".into()))
        });
        let err = scheduler.start().unwrap_err();
        assert_eq!(err, EngineError::DisplaySubmitFailure("no panel".into()));
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(scheduler.frames_rendered(), 0);
        assert!(scheduler.face().is_some());
    }

    #[test]
    fn sink_is_opened_on_the_render_thread() {
        let engine = engine();
        let caller = thread::current().id();
        let opened_on = Arc::new(std::sync::Mutex::new(None));
        let record = opened_on.clone();
        let sink = MemorySink::new(1);
        let handle = sink.clone();
        let mut scheduler = FrameScheduler::new(&engine, move || {
            *record.lock().unwrap() = Some(thread::current().id());
            let sink: Box<dyn DisplaySink> = Box::new(handle.clone());
            Ok(sink)
        });
        scheduler.start().unwrap();
        wait_for(|| sink.submitted() >= 1);
        scheduler.shutdown();
        let opened_on = opened_on.lock().unwrap().unwrap();
        assert_ne!(opened_on, caller);
    }

    #[test]
    fn slow_display_is_not_caught_up() {
        let engine = engine();
        let dt = engine.config().frame_dt();
        let delay = Duration::from_secs_f64(dt * 2.0);
        let sink = SlowSink { inner: MemorySink::new(1), delay };
        let recorded = sink.inner.clone();
        let mut scheduler = FrameScheduler::with_sink(&engine, sink);

        let started = Instant::now();
        scheduler.start().unwrap();
        wait_for(|| recorded.submitted() >= 8);
        scheduler.shutdown();
        let elapsed = started.elapsed();

        // one frame per iteration, each at least as long as the sink
        let rendered = scheduler.frames_rendered();
        assert_eq!(recorded.submitted(), rendered);
        let ceiling = (elapsed.as_secs_f64() / delay.as_secs_f64()).floor() as u64 + 1;
        assert!(rendered <= ceiling, "{rendered} frames in {elapsed:?}");

        // and every frame advanced the simulation by the same fixed dt
        let now = scheduler.face().unwrap().behavior().now();
        assert!((now - rendered as f64 * dt).abs() < 1e-9, "sim time {now}");
    }

    #[test]
    fn stop_handle_stops_the_loop() {
        let engine = engine();
        let sink = MemorySink::new(1);
        let mut scheduler = FrameScheduler::with_sink(&engine, sink.clone());
        let handle = scheduler.stop_handle();
        scheduler.start().unwrap();
        wait_for(|| sink.submitted() >= 2);
        handle.stop();
        scheduler.join();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }
}
