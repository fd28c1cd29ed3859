use super::base::EyeShape;

/// Default eyes - a rounded rectangle with anti-aliased edges
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundedEye;

impl RoundedEye {
    pub fn new() -> Self {
        Self
    }

    /// Signed distance to the rounded rectangle; negative inside.
    pub fn signed_distance(x: f64, y: f64, half_w: f64, half_h: f64, corner_radius: f64) -> f64 {
        let r = corner_radius.min(half_w).min(half_h).max(0.0);
        let qx = x.abs() - (half_w - r);
        let qy = y.abs() - (half_h - r);
        let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
        let inside = qx.max(qy).min(0.0);
        outside + inside - r
    }
}

impl EyeShape for RoundedEye {
    fn name(&self) -> &str {
        "Default Eyes"
    }

    fn description(&self) -> &str {
        "Rounded rectangle eyes"
    }

    fn coverage(&self, x: f64, y: f64, half_w: f64, half_h: f64, corner_radius: f64) -> f64 {
        if half_w <= 0.0 || half_h <= 0.0 {
            return 0.0;
        }
        // one pixel of falloff across the edge
        (0.5 - Self::signed_distance(x, y, half_w, half_h, corner_radius)).clamp(0.0, 1.0)
    }
}
