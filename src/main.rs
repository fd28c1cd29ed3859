use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use stella_eyes::elements::get_all_eye_shapes;
use stella_eyes::gamepad::{self, GamepadController};
use stella_eyes::{load_config, EyeEngine, FrameScheduler};

const DEFAULT_CONFIG: &str = "eyes.json";

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var_os("EYES_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = load_config(&config_path);
    info!(
        width = config.width,
        height = config.height,
        fps = config.fps,
        emotion = %config.initial_emotion,
        "starting eyes"
    );
    for shape in get_all_eye_shapes() {
        debug!(name = shape.name(), description = shape.description(), "eye shape");
    }

    let engine = EyeEngine::new(config);
    let mut scheduler = open_display(&engine);
    scheduler.start()?;

    let controller = GamepadController::new(&engine);
    gamepad::print_control_mapping();
    run_controls(&engine, controller)?;

    scheduler.shutdown();
    Ok(())
}

// The matrix handle is created on the render thread and stays there.
#[cfg(feature = "led-matrix")]
fn open_display(engine: &EyeEngine) -> FrameScheduler {
    use stella_eyes::display::{DisplaySink, LedMatrixConfig, LedMatrixSink};

    FrameScheduler::new(engine, || {
        let sink: Box<dyn DisplaySink> = Box::new(LedMatrixSink::new(&LedMatrixConfig::default())?);
        Ok(sink)
    })
}

#[cfg(not(feature = "led-matrix"))]
fn open_display(engine: &EyeEngine) -> FrameScheduler {
    info!("no display backend compiled in, frames are discarded");
    FrameScheduler::with_sink(engine, stella_eyes::NullSink::new(600))
}

#[cfg(feature = "gamepad")]
fn run_controls(engine: &EyeEngine, mut controller: GamepadController) -> Result<()> {
    let mut gilrs = gilrs::Gilrs::new().map_err(|e| anyhow::anyhow!("gamepad init: {e}"))?;

    let mut found = false;
    for (id, pad) in gilrs.gamepads() {
        info!(gamepad = %id, name = pad.name(), "gamepad connected");
        found = true;
    }
    if !found {
        warn!("no gamepad detected, touring emotions instead");
        return tour_forever(engine);
    }

    loop {
        gamepad::poll(&mut gilrs, &mut controller);
        thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(not(feature = "gamepad"))]
fn run_controls(engine: &EyeEngine, _controller: GamepadController) -> Result<()> {
    warn!("built without gamepad support, touring emotions instead");
    tour_forever(engine)
}

fn tour_forever(engine: &EyeEngine) -> Result<()> {
    loop {
        let handle = engine.play_sequence(&gamepad::tour())?;
        if handle.join().is_err() {
            warn!("tour thread panicked");
        }
        engine.blink();
        thread::sleep(Duration::from_millis(500));
    }
}
