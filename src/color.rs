use serde::{Deserialize, Serialize};

/// 8-bit RGB triple, the unit the frame buffer stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `factor` (clamped to 0..=1).
    pub fn scaled(self, factor: f64) -> Rgb {
        let f = factor.clamp(0.0, 1.0);
        Rgb {
            r: (self.r as f64 * f).round() as u8,
            g: (self.g as f64 * f).round() as u8,
            b: (self.b as f64 * f).round() as u8,
        }
    }

    /// Per-channel max; how overlapping layers combine over black.
    pub fn max(self, other: Rgb) -> Rgb {
        Rgb {
            r: self.r.max(other.r),
            g: self.g.max(other.g),
            b: self.b.max(other.b),
        }
    }
}

/// Continuous color used while fading between emotion colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorF {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorF {
    /// Move toward `target` by `t` (0 = stay, 1 = arrive).
    pub fn lerp(self, target: ColorF, t: f64) -> ColorF {
        let t = t.clamp(0.0, 1.0);
        ColorF {
            r: self.r + (target.r - self.r) * t,
            g: self.g + (target.g - self.g) * t,
            b: self.b + (target.b - self.b) * t,
        }
    }

    pub fn to_rgb(self) -> Rgb {
        Rgb {
            r: self.r.round().clamp(0.0, 255.0) as u8,
            g: self.g.round().clamp(0.0, 255.0) as u8,
            b: self.b.round().clamp(0.0, 255.0) as u8,
        }
    }

    pub fn distance(self, other: ColorF) -> f64 {
        let (dr, dg, db) = (self.r - other.r, self.g - other.g, self.b - other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl From<Rgb> for ColorF {
    fn from(c: Rgb) -> Self {
        ColorF {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_is_clamped() {
        let a = ColorF::from(Rgb::new(0, 0, 0));
        let b = ColorF::from(Rgb::new(200, 100, 50));
        assert_eq!(a.lerp(b, 2.0).to_rgb(), Rgb::new(200, 100, 50));
        assert_eq!(a.lerp(b, 0.5).to_rgb(), Rgb::new(100, 50, 25));
        assert_eq!(a.lerp(b, -1.0).to_rgb(), Rgb::BLACK);
    }

    #[test]
    fn scaled_dims_channels() {
        assert_eq!(Rgb::new(255, 128, 0).scaled(0.5), Rgb::new(128, 64, 0));
        assert_eq!(Rgb::new(10, 20, 30).scaled(3.0), Rgb::new(10, 20, 30));
    }
}
