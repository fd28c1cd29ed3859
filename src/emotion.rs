// Emotion labels and the profile table that drives every expression.
//
// Emotions differ only along the same physical axes: gaze offset, scale,
// tilt, eyelids, color and silhouette. Adding an emotion means adding a
// variant and one table row; rendering never branches on the label.

use std::fmt;
use std::str::FromStr;

use crate::color::Rgb;
use crate::error::{EngineError, Result};

/// Which silhouette the renderer synthesizes for an eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeTag {
    Normal,
    Heart,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Emotion {
    #[default]
    Idle,
    Happy,
    Sad,
    Angry,
    Surprised,
    Curious,
    Thinking,
    Listening,
    Speaking,
    Alert,
    Concerned,
    Sleepy,
    Sleeping,
    Excited,
    Love,
    Suspicious,
    Focused,
}

impl Emotion {
    pub const ALL: [Emotion; 17] = [
        Emotion::Idle,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
        Emotion::Curious,
        Emotion::Thinking,
        Emotion::Listening,
        Emotion::Speaking,
        Emotion::Alert,
        Emotion::Concerned,
        Emotion::Sleepy,
        Emotion::Sleeping,
        Emotion::Excited,
        Emotion::Love,
        Emotion::Suspicious,
        Emotion::Focused,
    ];

    pub fn as_str(&self) -> &'static str {
        self.profile().label
    }

    pub fn profile(&self) -> &'static EmotionProfile {
        &PROFILES[*self as usize]
    }

    /// Next label in table order, wrapping. Used by the gamepad harness.
    pub fn next(&self) -> Emotion {
        Emotion::ALL[(*self as usize + 1) % Emotion::ALL.len()]
    }

    pub fn previous(&self) -> Emotion {
        let len = Emotion::ALL.len();
        Emotion::ALL[(*self as usize + len - 1) % len]
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = EngineError;

    fn from_str(label: &str) -> Result<Self> {
        let wanted = label.trim();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EngineError::UnknownEmotion(label.to_string()))
    }
}

/// Target parameter vector for one emotion.
///
/// Offsets are in pixels (+x right, +y down), `angle` in degrees (positive
/// droops the outer corners), lids are closure fractions where negative
/// values open the eye wider than nominal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionProfile {
    pub label: &'static str,
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

/// Look up the profile for a label.
pub fn profile_for(label: &str) -> Result<EmotionProfile> {
    label.parse::<Emotion>().map(|e| *e.profile())
}

const NEUTRAL: EmotionProfile = EmotionProfile {
    label: "idle",
    x: 0.0,
    y: 0.0,
    width_scale: 1.0,
    height_scale: 1.0,
    angle: 0.0,
    upper_lid: 0.0,
    lower_lid: 0.0,
    color: Rgb::new(0, 200, 255),
    shape: ShapeTag::Normal,
};

// Indexed by `Emotion as usize`; order must match the enum.
static PROFILES: [EmotionProfile; 17] = [
    NEUTRAL,
    EmotionProfile {
        label: "happy",
        y: -2.0,
        width_scale: 1.1,
        height_scale: 0.75,
        lower_lid: 0.45,
        color: Rgb::new(255, 210, 40),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "sad",
        y: 4.0,
        width_scale: 0.95,
        height_scale: 0.85,
        angle: 12.0,
        upper_lid: 0.35,
        color: Rgb::new(40, 90, 255),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "angry",
        y: 1.0,
        width_scale: 1.05,
        height_scale: 0.7,
        angle: -15.0,
        upper_lid: 0.4,
        lower_lid: 0.1,
        color: Rgb::new(255, 30, 20),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "surprised",
        y: -2.0,
        width_scale: 1.2,
        height_scale: 1.25,
        upper_lid: -0.2,
        lower_lid: -0.1,
        color: Rgb::new(235, 245, 255),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "curious",
        x: 4.0,
        y: -1.0,
        width_scale: 1.05,
        height_scale: 1.05,
        angle: 6.0,
        upper_lid: 0.1,
        color: Rgb::new(60, 255, 190),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "thinking",
        x: -8.0,
        y: -5.0,
        width_scale: 0.95,
        height_scale: 0.9,
        angle: 4.0,
        upper_lid: 0.2,
        lower_lid: 0.1,
        color: Rgb::new(180, 140, 255),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "listening",
        y: -4.0,
        width_scale: 1.05,
        height_scale: 1.1,
        upper_lid: -0.05,
        color: Rgb::new(0, 255, 200),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "speaking",
        height_scale: 0.95,
        upper_lid: 0.05,
        lower_lid: 0.05,
        ..NEUTRAL
    },
    EmotionProfile {
        label: "alert",
        y: -1.0,
        width_scale: 1.1,
        height_scale: 1.2,
        upper_lid: -0.15,
        lower_lid: -0.05,
        color: Rgb::new(255, 140, 0),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "concerned",
        y: 2.0,
        width_scale: 0.95,
        height_scale: 0.95,
        angle: 8.0,
        upper_lid: 0.25,
        lower_lid: 0.05,
        color: Rgb::new(255, 170, 60),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "sleepy",
        y: 3.0,
        height_scale: 0.85,
        angle: 4.0,
        upper_lid: 0.55,
        lower_lid: 0.1,
        color: Rgb::new(110, 70, 170),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "sleeping",
        y: 4.0,
        width_scale: 1.05,
        height_scale: 0.8,
        upper_lid: 0.8,
        lower_lid: 0.12,
        color: Rgb::new(60, 60, 140),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "excited",
        y: -3.0,
        width_scale: 1.15,
        height_scale: 1.1,
        lower_lid: 0.3,
        color: Rgb::new(255, 40, 220),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "love",
        width_scale: 1.1,
        height_scale: 1.1,
        color: Rgb::new(255, 60, 140),
        shape: ShapeTag::Heart,
        ..NEUTRAL
    },
    EmotionProfile {
        label: "suspicious",
        x: 3.0,
        width_scale: 1.05,
        height_scale: 0.6,
        angle: -6.0,
        upper_lid: 0.45,
        lower_lid: 0.25,
        color: Rgb::new(200, 230, 60),
        ..NEUTRAL
    },
    EmotionProfile {
        label: "focused",
        width_scale: 0.95,
        height_scale: 0.8,
        angle: -4.0,
        upper_lid: 0.3,
        lower_lid: 0.15,
        color: Rgb::new(140, 200, 255),
        ..NEUTRAL
    },
];
