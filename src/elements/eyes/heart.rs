use super::base::EyeShape;

/// Heart-shaped eyes - cute expression
#[derive(Debug, Clone, Copy, Default)]
pub struct HeartEye;

const HEART_WIDTH: usize = 24;
const HEART_HEIGHT: usize = 16;

// Heart bitmap pattern (24x16), row 0 is the top
const HEART_PATTERN: [[u8; HEART_WIDTH]; HEART_HEIGHT] = [
    [0,0,0,1,1,1,1,1,1,0,0,0,0,0,0,1,1,1,1,1,1,0,0,0],
    [0,0,1,1,1,1,1,1,1,1,0,0,0,0,1,1,1,1,1,1,1,1,0,0],
    [0,1,1,1,1,1,1,1,1,1,1,1,0,1,1,1,1,1,1,1,1,1,1,0],
    [0,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,0],
    [0,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,0],
    [0,0,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,0,0],
    [0,0,0,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,0,0,0],
    [0,0,0,0,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,0,0,0,0],
    [0,0,0,0,0,1,1,1,1,1,1,1,1,1,1,1,1,1,1,0,0,0,0,0],
    [0,0,0,0,0,0,1,1,1,1,1,1,1,1,1,1,1,1,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,1,1,1,1,1,1,1,1,1,1,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,1,1,1,1,1,1,1,1,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,1,1,1,1,1,1,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,1,1,1,1,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,1,1,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,0,1,0,0,0,0,0,0,0,0,0,0,0],
];

// 2x2 supersampling offsets within a pixel
const SUBSAMPLES: [(f64, f64); 4] = [(-0.25, -0.25), (0.25, -0.25), (-0.25, 0.25), (0.25, 0.25)];

impl HeartEye {
    pub fn new() -> Self {
        Self
    }

    fn sample(x: f64, y: f64, half_w: f64, half_h: f64) -> bool {
        let u = (x + half_w) / (2.0 * half_w);
        let v = (y + half_h) / (2.0 * half_h);
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return false;
        }
        let col = (u * HEART_WIDTH as f64) as usize;
        let row = (v * HEART_HEIGHT as f64) as usize;
        HEART_PATTERN[row][col] == 1
    }
}

impl EyeShape for HeartEye {
    fn name(&self) -> &str {
        "Heart Eyes"
    }

    fn description(&self) -> &str {
        "Heart-shaped eyes - cute expression"
    }

    fn coverage(&self, x: f64, y: f64, half_w: f64, half_h: f64, _corner_radius: f64) -> f64 {
        if half_w <= 0.0 || half_h <= 0.0 {
            return 0.0;
        }
        let hits = SUBSAMPLES
            .iter()
            .filter(|(dx, dy)| Self::sample(x + dx, y + dy, half_w, half_h))
            .count();
        hits as f64 / SUBSAMPLES.len() as f64
    }
}
