// Living snapshot of what the eyes are doing: one spring per animated
// parameter plus a fading color, retargeted whenever the emotion changes.

use tracing::{debug, info};

use crate::color::{ColorF, Rgb};
use crate::emotion::{Emotion, ShapeTag};
use crate::error::Result;
use crate::spring::SpringSolver;

/// Movement speed at which the spring constants below apply unscaled.
pub const DEFAULT_MOVEMENT_SPEED: f64 = 0.75;

/// Fraction of the remaining color distance closed per second (exponential).
pub const COLOR_FADE_RATE: f64 = 6.0;
/// Longest single spring integration step, in seconds.
pub const MAX_SPRING_STEP: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    X,
    Y,
    WidthScale,
    HeightScale,
    Angle,
    UpperLid,
    LowerLid,
}

impl Param {
    pub const ALL: [Param; 7] = [
        Param::X,
        Param::Y,
        Param::WidthScale,
        Param::HeightScale,
        Param::Angle,
        Param::UpperLid,
        Param::LowerLid,
    ];

    /// (stiffness, damping) at the default movement speed, unit mass.
    fn base_tuning(self) -> (f64, f64) {
        match self {
            Param::X | Param::Y => (120.0, 16.0),
            Param::WidthScale | Param::HeightScale => (150.0, 16.0),
            Param::Angle => (100.0, 14.0),
            Param::UpperLid | Param::LowerLid => (200.0, 24.0),
        }
    }
}

/// Read-only resolved values handed to the behavior layer and renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionSnapshot {
    pub emotion: Emotion,
    pub previous: Emotion,
    pub x: f64,
    pub y: f64,
    pub width_scale: f64,
    pub height_scale: f64,
    pub angle: f64,
    pub upper_lid: f64,
    pub lower_lid: f64,
    pub color: Rgb,
    pub shape: ShapeTag,
}

#[derive(Debug, Clone)]
pub struct ExpressionState {
    springs: [SpringSolver; 7],
    color: ColorF,
    target_color: ColorF,
    emotion: Emotion,
    previous: Emotion,
    just_changed: bool,
    movement_speed: f64,
}

impl ExpressionState {
    /// Start settled on `emotion`'s profile.
    pub fn new(emotion: Emotion) -> Self {
        let profile = emotion.profile();
        let initial = [
            profile.x,
            profile.y,
            profile.width_scale,
            profile.height_scale,
            profile.angle,
            profile.upper_lid,
            profile.lower_lid,
        ];
        let springs = Param::ALL.map(|param| {
            let (stiffness, damping) = param.base_tuning();
            SpringSolver::new(initial[param as usize], stiffness, damping, 1.0)
        });
        let color = ColorF::from(profile.color);
        Self {
            springs,
            color,
            target_color: color,
            emotion,
            previous: emotion,
            just_changed: false,
            movement_speed: DEFAULT_MOVEMENT_SPEED,
        }
    }

    /// Retarget every spring at `label`'s profile. Never snaps.
    pub fn set_emotion(&mut self, label: &str) -> Result<()> {
        let emotion = label.parse::<Emotion>()?;
        self.apply(emotion);
        Ok(())
    }

    pub fn apply(&mut self, emotion: Emotion) {
        let profile = emotion.profile();
        let targets = [
            profile.x,
            profile.y,
            profile.width_scale,
            profile.height_scale,
            profile.angle,
            profile.upper_lid,
            profile.lower_lid,
        ];
        for (spring, target) in self.springs.iter_mut().zip(targets) {
            spring.set_target(target);
        }
        self.target_color = ColorF::from(profile.color);

        if emotion != self.emotion {
            info!(from = %self.emotion, to = %emotion, "emotion transition");
            self.previous = self.emotion;
            self.emotion = emotion;
            self.just_changed = true;
        }
    }

    /// Point the gaze springs somewhere else without touching the rest.
    pub fn set_gaze(&mut self, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        self.springs[Param::X as usize].set_target(x);
        self.springs[Param::Y as usize].set_target(y);
    }

    /// Scale spring stiffness by `s²` and damping by `s` so the damping
    /// ratio, and with it the overshoot, stays the same at any speed.
    pub fn set_movement_speed(&mut self, speed: f64) {
        if (speed - self.movement_speed).abs() < f64::EPSILON {
            return;
        }
        let s = speed / DEFAULT_MOVEMENT_SPEED;
        for param in Param::ALL {
            let (stiffness, damping) = param.base_tuning();
            self.springs[param as usize].retune(stiffness * s * s, damping * s);
        }
        debug!(speed, "movement speed retuned");
        self.movement_speed = speed;
    }

    /// Advance every spring and the color fade by one frame.
    ///
    /// Springs are integrated in substeps of at most `MAX_SPRING_STEP` so a
    /// low frame rate never feeds the explicit integrator an unstable step.
    pub fn step(&mut self, dt: f64) {
        self.just_changed = false;
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        // the slowest configurable frame rate is 1 fps
        let dt = dt.min(1.0);
        // tolerance keeps exact multiples of the step from gaining a substep
        let substeps = (dt / MAX_SPRING_STEP - 1e-9).ceil().max(1.0);
        let h = dt / substeps;
        for _ in 0..substeps as u32 {
            for spring in self.springs.iter_mut() {
                spring.update(h);
            }
        }
        let t = 1.0 - (-COLOR_FADE_RATE * dt).exp();
        self.color = self.color.lerp(self.target_color, t);
    }

    pub fn snapshot(&self) -> ExpressionSnapshot {
        let v = |p: Param| self.springs[p as usize].value;
        ExpressionSnapshot {
            emotion: self.emotion,
            previous: self.previous,
            x: v(Param::X),
            y: v(Param::Y),
            width_scale: v(Param::WidthScale),
            height_scale: v(Param::HeightScale),
            angle: v(Param::Angle),
            upper_lid: v(Param::UpperLid),
            lower_lid: v(Param::LowerLid),
            color: self.color.to_rgb(),
            shape: self.emotion.profile().shape,
        }
    }

    pub fn spring(&self, param: Param) -> &SpringSolver {
        &self.springs[param as usize]
    }

    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn previous_emotion(&self) -> Emotion {
        self.previous
    }

    /// True between a label change and the next `step`.
    pub fn just_changed(&self) -> bool {
        self.just_changed
    }

    pub fn color_target(&self) -> Rgb {
        self.target_color.to_rgb()
    }

    pub fn is_settled(&self, epsilon: f64) -> bool {
        self.springs.iter().all(|s| s.is_settled(epsilon))
    }
}

impl Default for ExpressionState {
    fn default() -> Self {
        ExpressionState::new(Emotion::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    const DT: f64 = 1.0 / 60.0;

    fn targets(state: &ExpressionState) -> Vec<f64> {
        Param::ALL.iter().map(|p| state.spring(*p).target).collect()
    }

    #[test]
    fn set_emotion_retargets_without_snapping() {
        let mut state = ExpressionState::default();
        state.set_emotion("sad").unwrap();
        let sad = Emotion::Sad.profile();
        assert_eq!(state.spring(Param::UpperLid).target, sad.upper_lid);
        assert_eq!(state.spring(Param::UpperLid).value, 0.0);
        assert_eq!(state.spring(Param::Angle).target, sad.angle);
        assert_eq!(state.color_target(), sad.color);
        assert_eq!(state.emotion(), Emotion::Sad);
        assert_eq!(state.previous_emotion(), Emotion::Idle);
        assert!(state.just_changed());
    }

    #[test]
    fn setting_the_same_emotion_twice_is_idempotent() {
        let mut state = ExpressionState::default();
        state.set_emotion("happy").unwrap();
        state.step(DT);
        let once = targets(&state);
        state.set_emotion("happy").unwrap();
        assert_eq!(targets(&state), once);
        assert!(!state.just_changed());
        assert_eq!(state.previous_emotion(), Emotion::Idle);
    }

    #[test]
    fn unknown_emotion_changes_nothing() {
        let mut state = ExpressionState::default();
        state.set_emotion("angry").unwrap();
        let before = targets(&state);
        let err = state.set_emotion("ecstatic").unwrap_err();
        assert_eq!(err, EngineError::UnknownEmotion("ecstatic".into()));
        assert_eq!(targets(&state), before);
        assert_eq!(state.emotion(), Emotion::Angry);
    }

    #[test]
    fn step_clears_change_flag_and_fades_color() {
        let mut state = ExpressionState::default();
        state.set_emotion("angry").unwrap();
        let start = ColorF::from(state.snapshot().color);
        let target = ColorF::from(Emotion::Angry.profile().color);
        state.step(DT);
        assert!(!state.just_changed());
        let after = ColorF::from(state.snapshot().color);
        assert!(after.distance(target) < start.distance(target));
        for _ in 0..240 {
            state.step(DT);
        }
        assert_eq!(state.snapshot().color, Emotion::Angry.profile().color);
    }

    #[test]
    fn faster_speed_keeps_damping_ratio() {
        let mut state = ExpressionState::default();
        let before = state.spring(Param::X).damping_ratio();
        state.set_movement_speed(1.0);
        let after = state.spring(Param::X).damping_ratio();
        assert!((before - after).abs() < 1e-12);
        assert!(state.spring(Param::X).stiffness > 120.0);
    }

    #[test]
    fn gaze_only_moves_position_targets() {
        let mut state = ExpressionState::default();
        state.set_gaze(5.0, -2.0);
        assert_eq!(state.spring(Param::X).target, 5.0);
        assert_eq!(state.spring(Param::Y).target, -2.0);
        assert_eq!(state.spring(Param::WidthScale).target, 1.0);

        state.set_gaze(f64::NAN, 1.0);
        assert_eq!(state.spring(Param::X).target, 5.0);
        assert_eq!(state.spring(Param::Y).target, -2.0);
    }

    #[test]
    fn springs_settle_at_every_frame_rate() {
        for speed in [0.1, DEFAULT_MOVEMENT_SPEED, 1.0] {
            for fps in 1..=120u32 {
                let dt = 1.0 / fps as f64;
                let mut state = ExpressionState::default();
                state.set_movement_speed(speed);
                state.set_emotion("angry").unwrap();
                for _ in 0..(10 * fps) {
                    state.step(dt);
                    for param in Param::ALL {
                        let value = state.spring(param).value;
                        assert!(value.is_finite() && value.abs() < 100.0, "{fps} fps, speed {speed}: {param:?} = {value}");
                    }
                }
                for param in Param::ALL {
                    let spring = state.spring(param);
                    assert!(
                        (spring.value - spring.target).abs() < 0.01,
                        "{fps} fps, speed {speed}: {param:?} stuck at {}",
                        spring.value
                    );
                }
            }
        }
    }

    #[test]
    fn long_frames_match_the_same_time_in_short_frames() {
        let mut coarse = ExpressionState::default();
        let mut fine = ExpressionState::default();
        coarse.set_emotion("surprised").unwrap();
        fine.set_emotion("surprised").unwrap();
        coarse.step(4.0 * DT);
        for _ in 0..4 {
            fine.step(DT);
        }
        for param in Param::ALL {
            assert!((coarse.spring(param).value - fine.spring(param).value).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_or_bad_dt_leaves_springs_alone() {
        let mut state = ExpressionState::default();
        state.set_emotion("sad").unwrap();
        state.step(0.0);
        state.step(f64::NAN);
        state.step(-1.0);
        assert_eq!(state.spring(Param::UpperLid).value, 0.0);
        assert!(!state.just_changed());
    }
}
