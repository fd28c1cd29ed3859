// Eye base trait and layout
pub mod base;

// Individual silhouettes
mod default;
mod heart;

pub use base::{EyePosition, EyeShape, Side};

pub use default::RoundedEye;
pub use heart::HeartEye;

use crate::emotion::ShapeTag;

static ROUNDED: RoundedEye = RoundedEye;
static HEART: HeartEye = HeartEye;

/// Silhouette the renderer uses for a profile's shape tag.
pub fn shape_for(tag: ShapeTag) -> &'static dyn EyeShape {
    match tag {
        ShapeTag::Normal => &ROUNDED,
        ShapeTag::Heart => &HEART,
    }
}

/// Get all available eye shapes
pub fn get_all_eye_shapes() -> Vec<&'static dyn EyeShape> {
    vec![&ROUNDED, &HEART]
}
