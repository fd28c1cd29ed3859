// The owned engine handle collaborators talk to.
//
// Everything a producer can change lives in one `CommandState` behind one
// mutex. Producers hold the lock only to copy a few fields in; the render
// loop holds it only to copy a snapshot out. Nothing here waits on a frame.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{
    clamp_param, EngineConfig, FeatureFlags, Tuning, TuningOverrides, CORNER_RADIUS_RANGE,
    EYE_SIZE_RANGE, EYE_SPACING_RANGE, MOVEMENT_SPEED_RANGE,
};
use crate::emotion::Emotion;
use crate::error::Result;

/// Horizontal and vertical limits for an explicit `look`.
pub const LOOK_LIMIT_X: f64 = 10.0;
pub const LOOK_LIMIT_Y: f64 = 6.0;

/// Shared command surface. One-shot requests are consumed by the snapshot.
#[derive(Debug, Clone)]
struct CommandState {
    emotion: Emotion,
    revision: u64,
    flags: FeatureFlags,
    tuning: Tuning,
    blink_requested: bool,
    gaze: Option<(f64, f64)>,
    sequence_id: u64,
}

impl CommandState {
    fn set_emotion(&mut self, emotion: Emotion) {
        self.emotion = emotion;
        self.revision += 1;
        self.gaze = None;
    }

    fn take_snapshot(&mut self) -> CommandSnapshot {
        CommandSnapshot {
            emotion: self.emotion,
            revision: self.revision,
            flags: self.flags,
            tuning: self.tuning,
            blink_requested: std::mem::take(&mut self.blink_requested),
            gaze: self.gaze.take(),
        }
    }
}

/// What the render loop sees for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSnapshot {
    pub emotion: Emotion,
    /// Bumped on every accepted `set_emotion`, even for the same label.
    pub revision: u64,
    pub flags: FeatureFlags,
    pub tuning: Tuning,
    pub blink_requested: bool,
    pub gaze: Option<(f64, f64)>,
}

impl CommandSnapshot {
    /// Snapshot of a freshly configured engine with nothing pending.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            emotion: config.initial_emotion(),
            revision: 0,
            flags: config.flags,
            tuning: config.tuning,
            blink_requested: false,
            gaze: None,
        }
    }
}

#[derive(Clone)]
pub struct EyeEngine {
    commands: Arc<Mutex<CommandState>>,
    config: Arc<EngineConfig>,
}

impl EyeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let config = config.validated();
        let initial = CommandSnapshot::from_config(&config);
        let state = CommandState {
            emotion: initial.emotion,
            revision: initial.revision,
            flags: initial.flags,
            tuning: initial.tuning,
            blink_requested: false,
            gaze: None,
            sequence_id: 0,
        };
        Self {
            commands: Arc::new(Mutex::new(state)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // The state is plain data, so a panic elsewhere can't leave it torn.
    fn lock(&self) -> MutexGuard<'_, CommandState> {
        self.commands.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy out this frame's commands, consuming one-shot requests.
    pub fn take_snapshot(&self) -> CommandSnapshot {
        self.lock().take_snapshot()
    }

    // ===== Emotion =====

    /// Switch emotion. Takes effect on the next frame; also cancels any
    /// sequence in progress and any `look` override.
    pub fn set_emotion(&self, label: &str) -> Result<()> {
        let emotion = parse_label(label)?;
        let mut state = self.lock();
        state.sequence_id += 1;
        state.set_emotion(emotion);
        Ok(())
    }

    /// Switch emotion and apply tuning overrides in one step.
    pub fn set_emotion_with(&self, label: &str, overrides: &TuningOverrides) -> Result<()> {
        let emotion = parse_label(label)?;
        let tuning = self.tuning().with_overrides(overrides);
        let mut state = self.lock();
        state.sequence_id += 1;
        state.set_emotion(emotion);
        state.tuning = tuning;
        Ok(())
    }

    pub fn emotion(&self) -> Emotion {
        self.lock().emotion
    }

    // ===== Gaze & blink =====

    /// Look at an explicit offset, clamped to the look limits. Lasts until
    /// the next emotion change.
    pub fn look(&self, x: f64, y: f64) {
        let x = clamp_param("look_x", x, &(-LOOK_LIMIT_X..=LOOK_LIMIT_X));
        let y = clamp_param("look_y", y, &(-LOOK_LIMIT_Y..=LOOK_LIMIT_Y));
        self.lock().gaze = Some((x, y));
    }

    pub fn blink(&self) {
        self.lock().blink_requested = true;
    }

    // ===== Feature toggles =====

    pub fn flags(&self) -> FeatureFlags {
        self.lock().flags
    }

    pub fn set_flags(&self, flags: FeatureFlags) {
        self.lock().flags = flags;
    }

    pub fn enable_blink(&self, on: bool) {
        self.lock().flags.blink = on;
    }

    pub fn enable_idle_wander(&self, on: bool) {
        self.lock().flags.idle_wander = on;
    }

    pub fn enable_breathing(&self, on: bool) {
        self.lock().flags.breathing = on;
    }

    pub fn enable_micro_jitter(&self, on: bool) {
        self.lock().flags.micro_jitter = on;
    }

    pub fn enable_particles(&self, on: bool) {
        self.lock().flags.particles = on;
    }

    // ===== Tuning =====

    pub fn tuning(&self) -> Tuning {
        self.lock().tuning
    }

    /// Returns the value actually applied after clamping.
    pub fn set_movement_speed(&self, speed: f64) -> f64 {
        let speed = clamp_param("movement_speed", speed, &MOVEMENT_SPEED_RANGE);
        self.lock().tuning.movement_speed = speed;
        speed
    }

    pub fn set_eye_size(&self, size: f64) -> f64 {
        let size = clamp_param("eye_size", size, &EYE_SIZE_RANGE);
        self.lock().tuning.eye_size = size;
        size
    }

    pub fn set_eye_spacing(&self, spacing: f64) -> f64 {
        let spacing = clamp_param("eye_spacing", spacing, &EYE_SPACING_RANGE);
        self.lock().tuning.eye_spacing = spacing;
        spacing
    }

    pub fn set_corner_radius(&self, radius: f64) -> f64 {
        let radius = clamp_param("corner_radius", radius, &CORNER_RADIUS_RANGE);
        self.lock().tuning.corner_radius = radius;
        radius
    }

    pub fn apply_overrides(&self, overrides: &TuningOverrides) -> Tuning {
        let tuning = self.tuning().with_overrides(overrides);
        self.lock().tuning = tuning;
        tuning
    }

    // ===== Sequences =====

    /// Play `(label, hold)` steps in order on a background thread.
    ///
    /// Every label is checked first; one bad label rejects the whole
    /// sequence. A later `set_emotion` or `play_sequence` cancels this one
    /// before its next step.
    pub fn play_sequence(&self, steps: &[(&str, Duration)]) -> Result<JoinHandle<()>> {
        let steps = steps
            .iter()
            .map(|(label, hold)| parse_label(label).map(|emotion| (emotion, *hold)))
            .collect::<Result<Vec<_>>>()?;

        let id = {
            let mut state = self.lock();
            state.sequence_id += 1;
            state.sequence_id
        };
        info!(id, steps = steps.len(), "playing emotion sequence");

        let engine = self.clone();
        Ok(thread::spawn(move || {
            for (emotion, hold) in steps {
                {
                    let mut state = engine.lock();
                    if state.sequence_id != id {
                        debug!(id, "sequence superseded");
                        return;
                    }
                    state.set_emotion(emotion);
                }
                thread::sleep(hold);
            }
        }))
    }
}

fn parse_label(label: &str) -> Result<Emotion> {
    label.parse::<Emotion>().map_err(|e| {
        warn!(error = %e, "rejected emotion command");
        e
    })
}
