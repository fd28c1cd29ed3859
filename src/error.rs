// Error taxonomy for the eye engine.
//
// Only the boundary calls have error paths: emotion commands and display
// submission. Physics and rendering are total over their inputs.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Label outside the closed emotion set. Nothing was applied.
    #[error("unknown emotion: {0:?}")]
    UnknownEmotion(String),

    /// The display sink rejected a frame. The frame is dropped.
    #[error("display submit failed: {0}")]
    DisplaySubmitFailure(String),

    /// A tuning value fell outside its documented range and was clamped.
    #[error("{name} = {value} outside [{min}, {max}], clamped")]
    ConfigOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
