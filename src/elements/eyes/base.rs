/// Base trait for all eye silhouettes.
///
/// Shapes are sampled in the eye's own unrotated frame: `(x, y)` is a pixel
/// center relative to the eye center, +y down, and the silhouette spans
/// `[-half_w, half_w] × [-half_h, half_h]`.
pub trait EyeShape: Send + Sync {
    /// Get the name of this eye shape
    fn name(&self) -> &str;

    /// Get a description of this eye shape
    fn description(&self) -> &str;

    /// Fraction of the pixel at `(x, y)` covered by the silhouette, 0..=1.
    fn coverage(&self, x: f64, y: f64, half_w: f64, half_h: f64, corner_radius: f64) -> f64;
}

/// Which eye on screen. Tilt is mirrored between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Sign applied to the shared tilt so the eyes rotate in opposite
    /// directions. Positive tilt lowers both outer corners.
    pub fn tilt_sign(&self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Rest position of one eye on the panel, before gaze offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePosition {
    pub center_x: f64,
    pub center_y: f64,
}

impl EyePosition {
    /// Anchor for `side` on a `width × height` panel with the given spacing
    /// between eye centers.
    pub fn anchor(side: Side, width: u32, height: u32, spacing: f64) -> Self {
        let mid_x = width as f64 / 2.0;
        let offset = match side {
            Side::Left => -spacing / 2.0,
            Side::Right => spacing / 2.0,
        };
        Self {
            center_x: mid_x + offset,
            center_y: height as f64 / 2.0,
        }
    }
}
