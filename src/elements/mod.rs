// Face element modules
pub mod eyes;

pub use eyes::{get_all_eye_shapes, shape_for, EyePosition, EyeShape, Side};
pub use eyes::{HeartEye, RoundedEye};
