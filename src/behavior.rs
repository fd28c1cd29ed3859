// Procedural life on top of the expression springs: blinking, idle gaze
// wandering, breathing and micro-jitter. Each concern runs on its own and
// they compose; none of them writes a spring's value.

use std::f64::consts::{PI, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::color::Rgb;
use crate::config::FeatureFlags;
use crate::emotion::{Emotion, ShapeTag};
use crate::expression::{ExpressionSnapshot, ExpressionState};

pub const BLINK_DURATION_SECS: (f64, f64) = (0.12, 0.18);
pub const DOUBLE_BLINK_CHANCE: f64 = 0.2;
pub const DOUBLE_BLINK_GAP_SECS: (f64, f64) = (0.06, 0.12);
/// Share of a blink's closure applied to the lower lid.
pub const LOWER_LID_BLINK_SHARE: f64 = 0.5;

pub const WANDER_MIN_INTERVAL_SECS: f64 = 2.0;
pub const WANDER_MAX_INTERVAL_SECS: f64 = 3.5;
/// Idle gaze targets are drawn from ±these many pixels.
pub const IDLE_WANDER_X: f64 = 8.0;
pub const IDLE_WANDER_Y: f64 = 4.0;
/// How far past the wander range the position springs may swing.
pub const WANDER_OVERSHOOT_ALLOWANCE: f64 = 0.25;

pub const BREATH_AMPLITUDE: f64 = 0.025;
pub const BREATH_PERIOD_SECS: f64 = 1.6;

// (amplitude px, frequency Hz, phase rad) per axis
const JITTER_X: [(f64, f64, f64); 2] = [(0.3, 1.3, 0.0), (0.2, 2.9, 1.1)];
const JITTER_Y: [(f64, f64, f64); 2] = [(0.25, 1.7, 0.5), (0.15, 3.7, 2.3)];

/// Seconds between blinks for an emotion.
fn blink_interval(emotion: Emotion) -> (f64, f64) {
    match emotion {
        Emotion::Sleepy => (1.0, 3.0),
        Emotion::Sleeping => (0.8, 2.0),
        _ => (1.5, 6.0),
    }
}

/// Drowsy emotions blink slowly as well as often.
fn blink_stretch(emotion: Emotion) -> f64 {
    match emotion {
        Emotion::Sleepy => 1.8,
        Emotion::Sleeping => 2.2,
        _ => 1.0,
    }
}

// ============================================================================
// BLINK
// ============================================================================

#[derive(Debug, Clone)]
pub struct BlinkScheduler {
    pub next_blink_time: f64,
    pub is_blinking: bool,
    pub blink_start_time: f64,
    pub blink_duration: f64,
    chained: bool,
}

impl BlinkScheduler {
    fn new(rng: &mut StdRng) -> Self {
        let (lo, hi) = blink_interval(Emotion::Idle);
        Self {
            next_blink_time: rng.gen_range(lo..hi),
            is_blinking: false,
            blink_start_time: 0.0,
            blink_duration: 0.0,
            chained: false,
        }
    }

    fn update(&mut self, now: f64, emotion: Emotion, enabled: bool, requested: bool, rng: &mut StdRng) {
        if self.is_blinking {
            if now - self.blink_start_time >= self.blink_duration {
                self.is_blinking = false;
                if !self.chained && rng.gen_bool(DOUBLE_BLINK_CHANCE) {
                    self.chained = true;
                    let (lo, hi) = DOUBLE_BLINK_GAP_SECS;
                    self.next_blink_time = now + rng.gen_range(lo..hi);
                    trace!(at = self.next_blink_time, "double blink queued");
                } else {
                    self.chained = false;
                    let (lo, hi) = blink_interval(emotion);
                    self.next_blink_time = now + rng.gen_range(lo..hi);
                }
            }
            return;
        }

        if requested || (enabled && now >= self.next_blink_time) {
            let (lo, hi) = BLINK_DURATION_SECS;
            self.is_blinking = true;
            self.blink_start_time = now;
            self.blink_duration = rng.gen_range(lo..hi) * blink_stretch(emotion);
            trace!(now, duration = self.blink_duration, "blink");
        }
    }

    /// Half-sine closure pulse: 0 → 1 → 0 over the blink.
    pub fn offset(&self, now: f64) -> f64 {
        if !self.is_blinking || self.blink_duration <= 0.0 {
            return 0.0;
        }
        let progress = ((now - self.blink_start_time) / self.blink_duration).clamp(0.0, 1.0);
        (PI * progress).sin()
    }
}

// ============================================================================
// IDLE WANDER
// ============================================================================

#[derive(Debug, Clone)]
pub struct IdleWanderState {
    pub last_move_time: f64,
    next_interval: f64,
    pub moves: u64,
}

impl IdleWanderState {
    fn new() -> Self {
        Self {
            last_move_time: 0.0,
            next_interval: WANDER_MIN_INTERVAL_SECS,
            moves: 0,
        }
    }

    fn update(&mut self, now: f64, expression: &mut ExpressionState, rng: &mut StdRng) {
        if now - self.last_move_time < self.next_interval {
            return;
        }
        let x = rng.gen_range(-IDLE_WANDER_X..=IDLE_WANDER_X);
        let y = rng.gen_range(-IDLE_WANDER_Y..=IDLE_WANDER_Y);
        expression.set_gaze(x, y);
        self.last_move_time = now;
        self.next_interval = rng.gen_range(WANDER_MIN_INTERVAL_SECS..WANDER_MAX_INTERVAL_SECS);
        self.moves += 1;
        trace!(x, y, "idle gaze");
    }
}

// ============================================================================
// RESOLVED PARAMETERS
// ============================================================================

/// Everything the renderer needs for one frame.
///
/// `x`/`y` include jitter; `gaze_x` is the bare spring value that drives
/// perspective. Lids are spring + blink and are not yet clamped: the
/// renderer masks with the clamped part and widens with the negative part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedParams {
    pub emotion: Emotion,
    pub x: f64,
    pub y: f64,
    pub gaze_x: f64,
    pub width_scale: f64,
    pub height_scale: f64,
    pub angle: f64,
    pub upper_lid: f64,
    pub lower_lid: f64,
    pub color: Rgb,
    pub shape: ShapeTag,
}

// ============================================================================
// BEHAVIOR LAYER
// ============================================================================

pub struct BehaviorLayer {
    now: f64,
    blink: BlinkScheduler,
    wander: IdleWanderState,
    breath_phase: f64,
    gaze_held: bool,
    rng: StdRng,
}

impl BehaviorLayer {
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let blink = BlinkScheduler::new(&mut rng);
        Self {
            now: 0.0,
            blink,
            wander: IdleWanderState::new(),
            breath_phase: 0.0,
            gaze_held: false,
            rng,
        }
    }

    /// Advance the behavior clock by `dt` and inject targets into the
    /// expression springs where a behavior owns them (idle gaze).
    pub fn update(
        &mut self,
        expression: &mut ExpressionState,
        flags: &FeatureFlags,
        blink_requested: bool,
        dt: f64,
    ) {
        self.now += dt;
        let emotion = expression.emotion();

        if expression.just_changed() && emotion == Emotion::Idle {
            // give the return to center a full interval before wandering
            self.wander.last_move_time = self.now;
            self.wander.next_interval = WANDER_MIN_INTERVAL_SECS;
        }

        self.blink
            .update(self.now, emotion, flags.blink, blink_requested, &mut self.rng);

        if flags.idle_wander && emotion == Emotion::Idle && !self.gaze_held {
            self.wander.update(self.now, expression, &mut self.rng);
        }

        self.breath_phase = (self.breath_phase + dt * TAU / BREATH_PERIOD_SECS).rem_euclid(TAU);
    }

    /// An explicit look owns the gaze; wandering pauses until released.
    pub fn hold_gaze(&mut self) {
        self.gaze_held = true;
    }

    /// Hand the gaze back after an emotion command. Wandering resumes a full
    /// interval later.
    pub fn release_gaze(&mut self) {
        if self.gaze_held {
            self.gaze_held = false;
            self.wander.last_move_time = self.now;
            self.wander.next_interval = WANDER_MIN_INTERVAL_SECS;
        }
    }

    pub fn gaze_held(&self) -> bool {
        self.gaze_held
    }

    pub fn breathing_scale(&self, flags: &FeatureFlags) -> f64 {
        if flags.breathing {
            1.0 + BREATH_AMPLITUDE * self.breath_phase.sin()
        } else {
            1.0
        }
    }

    pub fn jitter(&self, flags: &FeatureFlags) -> (f64, f64) {
        if !flags.micro_jitter {
            return (0.0, 0.0);
        }
        let wave = |terms: &[(f64, f64, f64)]| {
            terms
                .iter()
                .map(|(amp, freq, phase)| amp * (TAU * freq * self.now + phase).sin())
                .sum::<f64>()
        };
        (wave(&JITTER_X), wave(&JITTER_Y))
    }

    pub fn blink_offset(&self) -> f64 {
        self.blink.offset(self.now)
    }

    /// Layer the modulations over a spring snapshot.
    pub fn resolve(&self, snapshot: &ExpressionSnapshot, flags: &FeatureFlags) -> ResolvedParams {
        let (jx, jy) = self.jitter(flags);
        let breath = self.breathing_scale(flags);
        let blink = self.blink_offset();
        ResolvedParams {
            emotion: snapshot.emotion,
            x: snapshot.x + jx,
            y: snapshot.y + jy,
            gaze_x: snapshot.x,
            width_scale: snapshot.width_scale * breath,
            height_scale: snapshot.height_scale * breath,
            angle: snapshot.angle,
            upper_lid: snapshot.upper_lid + blink,
            lower_lid: snapshot.lower_lid + blink * LOWER_LID_BLINK_SHARE,
            color: snapshot.color,
            shape: snapshot.shape,
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn blink_state(&self) -> &BlinkScheduler {
        &self.blink
    }

    pub fn wander_state(&self) -> &IdleWanderState {
        &self.wander
    }
}
