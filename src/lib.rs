// Animated robot eyes for small RGB displays.
//
// [`EyeEngine`] is the handle collaborators hold: set an emotion, look
// somewhere, blink, toggle behaviors. A [`FrameScheduler`] runs the
// per-frame pipeline (springs, behavior layer, particles, renderer) on its
// own thread and hands each [`Frame`] to a [`DisplaySink`].

pub mod behavior;
pub mod color;
pub mod config;
pub mod display;
pub mod elements;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod expression;
pub mod face;
pub mod frame;
pub mod gamepad;
pub mod particles;
pub mod render;
pub mod scheduler;
pub mod spring;


pub use config::{load_config, EngineConfig, FeatureFlags, Tuning, TuningOverrides};
pub use display::{DisplaySink, MemorySink, NullSink};
pub use emotion::{Emotion, EmotionProfile};
pub use engine::EyeEngine;
pub use error::{EngineError, Result};
pub use face::Face;
pub use frame::Frame;
pub use scheduler::{FrameScheduler, SchedulerState, SinkFactory};
