use crate::color::Rgb;

/// Fixed-size RGB raster handed to the display sink. Row-major, origin top
/// left, black background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Write a pixel; out-of-bounds writes are dropped.
    pub fn set(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Composite `color` at `coverage` over whatever is already there.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgb, coverage: f64) {
        if coverage <= 0.0 {
            return;
        }
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.pixels[i].max(color.scaled(coverage));
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::BLACK);
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Packed `r, g, b` bytes, row-major.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p != Rgb::BLACK).count()
    }

    /// Lit pixels inside the column range `[x0, x1)`.
    pub fn lit_count_in_columns(&self, x0: u32, x1: u32) -> usize {
        (0..self.height as i32)
            .flat_map(|y| (x0 as i32..x1.min(self.width) as i32).map(move |x| (x, y)))
            .filter(|(x, y)| self.get(*x, *y).is_some_and(|p| p != Rgb::BLACK))
            .count()
    }
}
