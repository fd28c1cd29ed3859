// Gamepad control for the demo harness.
// Button handling is plain Rust so it can be driven without hardware; the
// gilrs translation only exists with the `gamepad` feature.

use std::time::{Duration, Instant};

use tracing::info;

use crate::emotion::Emotion;
use crate::engine::{EyeEngine, LOOK_LIMIT_X, LOOK_LIMIT_Y};

/// Holding Start at least this long returns to idle instead of touring.
pub const LONG_PRESS: Duration = Duration::from_millis(800);
/// Pixels of gaze per d-pad press.
pub const LOOK_STEP: f64 = 2.0;

/// A short walk through the expressive range, used by Start and by the
/// harness when no gamepad is attached.
pub fn tour() -> Vec<(&'static str, Duration)> {
    let secs = Duration::from_secs;
    vec![
        ("idle", secs(4)),
        ("happy", secs(3)),
        ("curious", secs(3)),
        ("surprised", secs(2)),
        ("thinking", secs(3)),
        ("love", secs(4)),
        ("suspicious", secs(3)),
        ("sad", secs(3)),
        ("angry", secs(2)),
        ("sleepy", secs(3)),
        ("sleeping", secs(5)),
        ("excited", secs(2)),
        ("idle", secs(1)),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadButton {
    South,
    East,
    North,
    West,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadEvent {
    Pressed(PadButton),
    Released(PadButton),
}

// Button press tracking for long press detection
#[derive(Debug, Default)]
pub struct ButtonTracker {
    start_pressed_at: Option<Instant>,
}

impl ButtonTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn press(&mut self, at: Instant) {
        self.start_pressed_at = Some(at);
    }

    /// How long Start was held, if a press was seen.
    fn release(&mut self, at: Instant) -> Option<Duration> {
        self.start_pressed_at
            .take()
            .map(|pressed| at.saturating_duration_since(pressed))
    }
}

pub struct GamepadController {
    engine: EyeEngine,
    tracker: ButtonTracker,
    gaze: (f64, f64),
}

impl GamepadController {
    pub fn new(engine: &EyeEngine) -> Self {
        Self {
            engine: engine.clone(),
            tracker: ButtonTracker::new(),
            gaze: (0.0, 0.0),
        }
    }

    pub fn handle(&mut self, event: PadEvent, at: Instant) {
        match event {
            PadEvent::Pressed(button) => self.pressed(button, at),
            PadEvent::Released(PadButton::Start) => {
                if let Some(held) = self.tracker.release(at) {
                    if held >= LONG_PRESS {
                        info!("long press: back to idle");
                        self.switch_to(Emotion::Idle);
                    } else if let Err(e) = self.engine.play_sequence(&tour()) {
                        info!(error = %e, "tour rejected");
                    }
                }
            }
            PadEvent::Released(_) => {}
        }
    }

    fn pressed(&mut self, button: PadButton, at: Instant) {
        let flags = self.engine.flags();
        match button {
            PadButton::South => self.switch_to(self.engine.emotion().next()),
            PadButton::West => self.switch_to(self.engine.emotion().previous()),
            PadButton::North => {
                self.engine.enable_blink(!flags.blink);
                info!(on = !flags.blink, "blinking");
            }
            PadButton::East => {
                self.engine.enable_breathing(!flags.breathing);
                info!(on = !flags.breathing, "breathing");
            }
            PadButton::Select => {
                self.engine.enable_particles(!flags.particles);
                info!(on = !flags.particles, "particles");
            }

            PadButton::DPadLeft => self.nudge(-LOOK_STEP, 0.0),
            PadButton::DPadRight => self.nudge(LOOK_STEP, 0.0),
            PadButton::DPadUp => self.nudge(0.0, -LOOK_STEP),
            PadButton::DPadDown => self.nudge(0.0, LOOK_STEP),

            PadButton::LeftTrigger | PadButton::RightTrigger => self.engine.blink(),

            // handled on release to tell short from long
            PadButton::Start => self.tracker.press(at),
        }
    }

    fn switch_to(&mut self, emotion: Emotion) {
        // set_emotion re-centers the gaze
        self.gaze = (0.0, 0.0);
        if let Err(e) = self.engine.set_emotion(emotion.as_str()) {
            info!(error = %e, "emotion rejected");
        }
    }

    fn nudge(&mut self, dx: f64, dy: f64) {
        self.gaze = (
            (self.gaze.0 + dx).clamp(-LOOK_LIMIT_X, LOOK_LIMIT_X),
            (self.gaze.1 + dy).clamp(-LOOK_LIMIT_Y, LOOK_LIMIT_Y),
        );
        self.engine.look(self.gaze.0, self.gaze.1);
    }

    pub fn gaze(&self) -> (f64, f64) {
        self.gaze
    }
}

pub fn print_control_mapping() {
    println!("\n🎮 Controls:");
    println!("  A / X      next / previous emotion");
    println!("  Y          toggle blinking");
    println!("  B          toggle breathing");
    println!("  Select     toggle particles");
    println!("  D-pad      look around");
    println!("  Triggers   blink");
    println!("  Start      play the tour (hold to return to idle)");
}

#[cfg(feature = "gamepad")]
pub use pad::{poll, translate};

#[cfg(feature = "gamepad")]
mod pad {
    use std::time::Instant;

    use gilrs::{Button, Event, EventType, Gilrs};
    use tracing::debug;

    use super::{GamepadController, PadButton, PadEvent};

    fn map_button(button: Button) -> Option<PadButton> {
        Some(match button {
            Button::South => PadButton::South,
            Button::East => PadButton::East,
            Button::North => PadButton::North,
            Button::West => PadButton::West,
            Button::DPadUp => PadButton::DPadUp,
            Button::DPadDown => PadButton::DPadDown,
            Button::DPadLeft => PadButton::DPadLeft,
            Button::DPadRight => PadButton::DPadRight,
            Button::LeftTrigger | Button::LeftTrigger2 => PadButton::LeftTrigger,
            Button::RightTrigger | Button::RightTrigger2 => PadButton::RightTrigger,
            Button::Select => PadButton::Select,
            Button::Start => PadButton::Start,
            _ => return None,
        })
    }

    pub fn translate(event: &EventType) -> Option<PadEvent> {
        match event {
            EventType::ButtonPressed(button, _) => map_button(*button).map(PadEvent::Pressed),
            EventType::ButtonReleased(button, _) => map_button(*button).map(PadEvent::Released),
            _ => None,
        }
    }

    /// Drain pending gilrs events into the controller. Non-blocking.
    pub fn poll(gilrs: &mut Gilrs, controller: &mut GamepadController) {
        while let Some(Event { id, event, .. }) = gilrs.next_event() {
            debug!(gamepad = %id, ?event, "gamepad event");
            if let Some(pad_event) = translate(&event) {
                controller.handle(pad_event, Instant::now());
            }
        }
    }
}
