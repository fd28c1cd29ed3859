// Face pipeline
// Owns the animated state and turns one command snapshot into one frame.

use crate::behavior::{BehaviorLayer, ResolvedParams};
use crate::config::{EngineConfig, Tuning};
use crate::engine::CommandSnapshot;
use crate::expression::ExpressionState;
use crate::frame::Frame;
use crate::particles::ParticleLayer;
use crate::render::Renderer;

// ============================================================================
// FACE
// ============================================================================

pub struct Face {
    expression: ExpressionState,
    behavior: BehaviorLayer,
    particles: ParticleLayer,
    renderer: Renderer,
    tuning: Tuning,
    applied_revision: u64,
    last_params: Option<ResolvedParams>,
}

impl Face {
    pub fn new(config: &EngineConfig) -> Self {
        let mut expression = ExpressionState::new(config.initial_emotion());
        expression.set_movement_speed(config.tuning.movement_speed);
        Self {
            expression,
            behavior: BehaviorLayer::new(config.seed),
            particles: ParticleLayer::new(config.seed),
            renderer: Renderer::new(config.width, config.height, &config.tuning),
            tuning: config.tuning,
            applied_revision: 0,
            last_params: None,
        }
    }

    /// Advance everything by `dt` and render the result.
    ///
    /// Order: commands → behavior → particles → springs → render.
    pub fn tick(&mut self, commands: &CommandSnapshot, dt: f64) -> Frame {
        self.apply_commands(commands);

        let flags = commands.flags;
        self.behavior
            .update(&mut self.expression, &flags, commands.blink_requested, dt);

        if flags.particles {
            let origin = self.renderer.particle_origin();
            self.particles.spawn_if_due(&self.expression, origin, dt);
            self.particles.update(dt);
        } else {
            self.particles.clear();
        }

        self.expression.step(dt);

        let params = self.behavior.resolve(&self.expression.snapshot(), &flags);
        self.last_params = Some(params);
        self.renderer.draw(&params, self.particles.particles())
    }

    fn apply_commands(&mut self, commands: &CommandSnapshot) {
        if commands.revision != self.applied_revision {
            self.expression.apply(commands.emotion);
            self.behavior.release_gaze();
            self.applied_revision = commands.revision;
        }
        if let Some((x, y)) = commands.gaze {
            self.expression.set_gaze(x, y);
            self.behavior.hold_gaze();
        }
        if commands.tuning != self.tuning {
            self.expression.set_movement_speed(commands.tuning.movement_speed);
            self.renderer.set_tuning(&commands.tuning);
            self.tuning = commands.tuning;
        }
    }

    pub fn expression(&self) -> &ExpressionState {
        &self.expression
    }

    pub fn behavior(&self) -> &BehaviorLayer {
        &self.behavior
    }

    pub fn particles(&self) -> &ParticleLayer {
        &self.particles
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Parameters the last frame was drawn from.
    pub fn last_params(&self) -> Option<&ResolvedParams> {
        self.last_params.as_ref()
    }
}
