// Where finished frames go.
//
// A sink accepts a full RGB raster per frame. Any error it reports is
// logged by the scheduler and the frame is dropped; there are no retries.
// Sinks are opened on the render thread and never leave it, so hardware
// handles need not be `Send`.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::Result;
use crate::frame::Frame;

pub trait DisplaySink {
    fn name(&self) -> &str {
        "display"
    }

    fn submit(&mut self, frame: &Frame) -> Result<()>;
}

// ============================================================================
// MEMORY SINK
// ============================================================================

#[derive(Default)]
struct Recorded {
    frames: Vec<Frame>,
    submitted: u64,
}

/// Keeps the most recent frames in memory behind a cloneable handle.
#[derive(Clone)]
pub struct MemorySink {
    recorded: Arc<Mutex<Recorded>>,
    keep: usize,
}

impl MemorySink {
    pub fn new(keep: usize) -> Self {
        Self {
            recorded: Arc::new(Mutex::new(Recorded::default())),
            keep: keep.max(1),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut recorded = self.recorded.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut recorded)
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.with(|r| r.frames.clone())
    }

    pub fn latest(&self) -> Option<Frame> {
        self.with(|r| r.frames.last().cloned())
    }

    /// Total frames ever submitted, including ones no longer kept.
    pub fn submitted(&self) -> u64 {
        self.with(|r| r.submitted)
    }
}

impl DisplaySink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn submit(&mut self, frame: &Frame) -> Result<()> {
        let keep = self.keep;
        self.with(|r| {
            if r.frames.len() == keep {
                r.frames.remove(0);
            }
            r.frames.push(frame.clone());
            r.submitted += 1;
        });
        Ok(())
    }
}

// ============================================================================
// NULL SINK
// ============================================================================

/// Discards frames, logging throughput every `report_every` frames.
#[derive(Debug, Clone)]
pub struct NullSink {
    count: u64,
    report_every: u64,
}

impl NullSink {
    pub fn new(report_every: u64) -> Self {
        Self {
            count: 0,
            report_every: report_every.max(1),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl DisplaySink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn submit(&mut self, frame: &Frame) -> Result<()> {
        self.count += 1;
        if self.count % self.report_every == 0 {
            debug!(frames = self.count, lit = frame.lit_count(), "null sink");
        }
        Ok(())
    }
}

// ============================================================================
// LED MATRIX SINK
// ============================================================================

#[cfg(feature = "led-matrix")]
pub use led::{LedMatrixConfig, LedMatrixSink};

#[cfg(feature = "led-matrix")]
mod led {
    use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix, LedMatrixOptions};
    use tracing::info;

    use super::DisplaySink;
    use crate::error::{EngineError, Result};
    use crate::frame::Frame;

    #[derive(Debug, Clone)]
    pub struct LedMatrixConfig {
        pub rows: u32,
        pub cols: u32,
        pub chain_length: u32,
        pub hardware_mapping: String,
        /// 0.0 to 1.0
        pub brightness: f64,
    }

    impl Default for LedMatrixConfig {
        fn default() -> Self {
            Self {
                rows: 32,
                cols: 64,
                chain_length: 2,
                hardware_mapping: "adafruit-hat".to_string(),
                brightness: 1.0,
            }
        }
    }

    pub struct LedMatrixSink {
        matrix: LedMatrix,
        canvas: Option<LedCanvas>,
        brightness: f64,
    }

    impl LedMatrixSink {
        pub fn new(config: &LedMatrixConfig) -> Result<Self> {
            let mut options = LedMatrixOptions::new();
            options.set_rows(config.rows);
            options.set_cols(config.cols);
            options.set_chain_length(config.chain_length);
            options.set_hardware_mapping(&config.hardware_mapping);

            let matrix = LedMatrix::new(Some(options), None)
                .map_err(|e| EngineError::DisplaySubmitFailure(format!("matrix init: {}", e)))?;
            info!(rows = config.rows, cols = config.cols, chain = config.chain_length, "LED matrix ready");
            Ok(Self {
                matrix,
                canvas: None,
                brightness: config.brightness.clamp(0.0, 1.0),
            })
        }
    }

    impl DisplaySink for LedMatrixSink {
        fn name(&self) -> &str {
            "led-matrix"
        }

        fn submit(&mut self, frame: &Frame) -> Result<()> {
            let mut canvas = match self.canvas.take() {
                Some(canvas) => canvas,
                None => self.matrix.offscreen_canvas(),
            };
            canvas.clear();
            let (cols, rows) = canvas.canvas_size();
            let w = (frame.width() as i32).min(cols);
            let h = (frame.height() as i32).min(rows);
            for y in 0..h {
                for x in 0..w {
                    if let Some(pixel) = frame.get(x, y) {
                        let p = pixel.scaled(self.brightness);
                        let color = LedColor { red: p.r, green: p.g, blue: p.b };
                        canvas.set(x, y, &color);
                    }
                }
            }
            self.canvas = Some(self.matrix.swap(canvas));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn memory_sink_keeps_only_recent_frames() {
        let sink = MemorySink::new(2);
        let mut handle = sink.clone();
        for i in 0..5u8 {
            let mut frame = Frame::new(2, 2);
            frame.set(0, 0, Rgb::new(i, 0, 0));
            handle.submit(&frame).unwrap();
        }
        assert_eq!(sink.submitted(), 5);
        let frames = sink.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].get(0, 0), Some(Rgb::new(3, 0, 0)));
        assert_eq!(sink.latest().unwrap().get(0, 0), Some(Rgb::new(4, 0, 0)));
    }

    #[test]
    fn null_sink_counts() {
        let mut sink = NullSink::new(10);
        let frame = Frame::new(4, 4);
        for _ in 0..25 {
            sink.submit(&frame).unwrap();
        }
        assert_eq!(sink.count(), 25);
    }
}
