// Engine configuration: display geometry, frame rate, feature toggles and
// the tuning values collaborators may override at runtime.
//
// Loaded from JSON with every field optional. Out-of-range values are
// clamped with a warning, never rejected.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::emotion::Emotion;
use crate::error::EngineError;

pub const MOVEMENT_SPEED_RANGE: RangeInclusive<f64> = 0.1..=1.0;
pub const EYE_SIZE_RANGE: RangeInclusive<f64> = 12.0..=64.0;
pub const EYE_SPACING_RANGE: RangeInclusive<f64> = 16.0..=110.0;
pub const CORNER_RADIUS_RANGE: RangeInclusive<f64> = 0.0..=32.0;
pub const FPS_RANGE: RangeInclusive<u32> = 1..=120;
pub const DIMENSION_RANGE: RangeInclusive<u32> = 16..=512;

/// Clamp `value` into `range`, logging a `ConfigOutOfRange` when it had to.
pub fn clamp_param(name: &'static str, value: f64, range: &RangeInclusive<f64>) -> f64 {
    let (min, max) = (*range.start(), *range.end());
    if range.contains(&value) {
        return value;
    }
    let err = EngineError::ConfigOutOfRange { name, value, min, max };
    // NaN compares false everywhere; pin it to the minimum
    let applied = if value.is_nan() { min } else { value.clamp(min, max) };
    warn!(error = %err, applied, "tuning value clamped");
    applied
}

fn clamp_count(name: &'static str, value: u32, range: &RangeInclusive<u32>) -> u32 {
    let clamped = clamp_param(
        name,
        value as f64,
        &(*range.start() as f64..=*range.end() as f64),
    );
    clamped as u32
}

// ============================================================================
// FEATURE FLAGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub blink: bool,
    pub idle_wander: bool,
    pub breathing: bool,
    pub micro_jitter: bool,
    pub particles: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            blink: true,
            idle_wander: true,
            breathing: false,
            micro_jitter: true,
            particles: true,
        }
    }
}

// ============================================================================
// TUNING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// 0.1 = slow and floaty, 1.0 = snappy.
    pub movement_speed: f64,
    /// Nominal eye width and height in pixels.
    pub eye_size: f64,
    /// Distance between the two eye centers in pixels.
    pub eye_spacing: f64,
    pub corner_radius: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            movement_speed: 0.75,
            eye_size: 36.0,
            eye_spacing: 60.0,
            corner_radius: 10.0,
        }
    }
}

impl Tuning {
    pub fn clamped(self) -> Self {
        Self {
            movement_speed: clamp_param("movement_speed", self.movement_speed, &MOVEMENT_SPEED_RANGE),
            eye_size: clamp_param("eye_size", self.eye_size, &EYE_SIZE_RANGE),
            eye_spacing: clamp_param("eye_spacing", self.eye_spacing, &EYE_SPACING_RANGE),
            corner_radius: clamp_param("corner_radius", self.corner_radius, &CORNER_RADIUS_RANGE),
        }
    }

    /// Apply whichever overrides are present, clamped.
    pub fn with_overrides(self, overrides: &TuningOverrides) -> Self {
        Self {
            movement_speed: overrides.movement_speed.unwrap_or(self.movement_speed),
            eye_size: overrides.eye_size.unwrap_or(self.eye_size),
            eye_spacing: overrides.eye_spacing.unwrap_or(self.eye_spacing),
            corner_radius: overrides.corner_radius.unwrap_or(self.corner_radius),
        }
        .clamped()
    }
}

/// Partial tuning update; `None` leaves the current value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TuningOverrides {
    pub movement_speed: Option<f64>,
    pub eye_size: Option<f64>,
    pub eye_spacing: Option<f64>,
    pub corner_radius: Option<f64>,
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Seeds blink, wander and particle randomness. `None` uses entropy.
    pub seed: Option<u64>,
    pub initial_emotion: String,
    pub flags: FeatureFlags,
    pub tuning: Tuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            fps: 60,
            seed: None,
            initial_emotion: Emotion::Idle.as_str().to_string(),
            flags: FeatureFlags::default(),
            tuning: Tuning::default(),
        }
    }
}

impl EngineConfig {
    /// Bring every numeric field into range.
    pub fn validated(self) -> Self {
        Self {
            width: clamp_count("width", self.width, &DIMENSION_RANGE),
            height: clamp_count("height", self.height, &DIMENSION_RANGE),
            fps: clamp_count("fps", self.fps, &FPS_RANGE),
            tuning: self.tuning.clamped(),
            ..self
        }
    }

    /// Seconds per frame.
    pub fn frame_dt(&self) -> f64 {
        1.0 / self.fps.max(1) as f64
    }

    pub fn initial_emotion(&self) -> Emotion {
        match self.initial_emotion.parse::<Emotion>() {
            Ok(emotion) => emotion,
            Err(e) => {
                warn!(error = %e, "falling back to idle");
                Emotion::Idle
            }
        }
    }
}

/// Load a JSON config, falling back to defaults when the file is missing or
/// unparsable. The result is always validated.
pub fn load_config(path: &Path) -> EngineConfig {
    let config = match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<EngineConfig>(&content) {
            Ok(config) => {
                info!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                EngineConfig::default()
            }
        },
        Err(_) => {
            info!(path = %path.display(), "no config file, using defaults");
            EngineConfig::default()
        }
    };
    config.validated()
}
