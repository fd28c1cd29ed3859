// Decorative particles ("Z"s while sleeping, little hearts while in love).
// Purely additive: nothing here feeds back into the eyes.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::Rgb;
use crate::emotion::Emotion;
use crate::expression::ExpressionState;
use crate::frame::Frame;

pub const MAX_PARTICLES: usize = 12;
/// Life lost per second; a particle lasts a little under three seconds.
pub const LIFE_DECAY_PER_SEC: f64 = 0.35;
pub const WIGGLE_AMPLITUDE: f64 = 4.0;
pub const WIGGLE_FREQUENCY: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Z,
    Heart,
}

const Z_BITMAP: [[u8; 5]; 5] = [
    [1, 1, 1, 1, 1],
    [0, 0, 0, 1, 0],
    [0, 0, 1, 0, 0],
    [0, 1, 0, 0, 0],
    [1, 1, 1, 1, 1],
];

const HEART_BITMAP: [[u8; 5]; 5] = [
    [0, 1, 0, 1, 0],
    [1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1],
    [0, 1, 1, 1, 0],
    [0, 0, 1, 0, 0],
];

impl Glyph {
    pub fn bitmap(&self) -> &'static [[u8; 5]; 5] {
        match self {
            Glyph::Z => &Z_BITMAP,
            Glyph::Heart => &HEART_BITMAP,
        }
    }

    /// Particles spawned per second while the emotion qualifies.
    fn spawn_rate(&self) -> f64 {
        match self {
            Glyph::Z => 0.8,
            Glyph::Heart => 1.2,
        }
    }
}

/// Which glyph, if any, an emotion gives off.
pub fn glyph_for(emotion: Emotion) -> Option<Glyph> {
    match emotion {
        Emotion::Sleeping => Some(Glyph::Z),
        Emotion::Love => Some(Glyph::Heart),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Remaining life in (0, 1]; also the draw brightness.
    pub life: f64,
    pub glyph: Glyph,
    phase: f64,
}

impl Particle {
    /// Blit the glyph with its top-left at the particle position.
    pub fn draw(&self, frame: &mut Frame, color: Rgb) {
        let ox = self.x.round() as i32;
        let oy = self.y.round() as i32;
        for (row, bits) in self.glyph.bitmap().iter().enumerate() {
            for (col, bit) in bits.iter().enumerate() {
                if *bit == 1 {
                    frame.blend(ox + col as i32, oy + row as i32, color, self.life);
                }
            }
        }
    }
}

pub struct ParticleLayer {
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleLayer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            // offset so particles don't mirror the behavior layer's stream
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(0x5EED)),
            None => StdRng::from_entropy(),
        };
        Self {
            particles: Vec::new(),
            rng,
        }
    }

    /// Maybe spawn one particle near `origin`. The chance is proportional
    /// to `dt`; entering a qualifying emotion spawns one right away.
    pub fn spawn_if_due(&mut self, state: &ExpressionState, origin: (f64, f64), dt: f64) {
        let Some(glyph) = glyph_for(state.emotion()) else {
            return;
        };
        if self.particles.len() >= MAX_PARTICLES {
            return;
        }
        let due = state.just_changed() || self.rng.gen::<f64>() < glyph.spawn_rate() * dt;
        if !due {
            return;
        }
        let particle = Particle {
            x: origin.0 + self.rng.gen_range(0.0..10.0),
            y: origin.1,
            vx: self.rng.gen_range(4.0..10.0),
            vy: -self.rng.gen_range(8.0..14.0),
            life: 1.0,
            glyph,
            phase: self.rng.gen_range(0.0..TAU),
        };
        self.particles.push(particle);
    }

    /// Drift, wiggle and fade; drop anything out of life.
    pub fn update(&mut self, dt: f64) {
        for p in self.particles.iter_mut() {
            p.phase = (p.phase + TAU * WIGGLE_FREQUENCY * dt).rem_euclid(TAU);
            p.x += (p.vx + WIGGLE_AMPLITUDE * p.phase.sin()) * dt;
            p.y += p.vy * dt;
            p.life -= LIFE_DECAY_PER_SEC * dt;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn only_qualifying_emotions_spawn() {
        let mut layer = ParticleLayer::new(Some(1));
        let state = ExpressionState::new(Emotion::Happy);
        for _ in 0..600 {
            layer.spawn_if_due(&state, (90.0, 40.0), DT);
        }
        assert!(layer.particles().is_empty());
    }

    #[test]
    fn sleeping_spawns_z_and_respects_the_cap() {
        let mut layer = ParticleLayer::new(Some(1));
        let mut state = ExpressionState::default();
        state.set_emotion("sleeping").unwrap();
        layer.spawn_if_due(&state, (90.0, 40.0), DT);
        assert_eq!(layer.particles().len(), 1);
        assert_eq!(layer.particles()[0].glyph, Glyph::Z);
        state.step(DT);

        for _ in 0..(60 * 60) {
            layer.spawn_if_due(&state, (90.0, 40.0), 1.0);
            assert!(layer.particles().len() <= MAX_PARTICLES);
        }
        assert_eq!(layer.particles().len(), MAX_PARTICLES);
    }

    #[test]
    fn particles_rise_fade_and_expire() {
        let mut layer = ParticleLayer::new(Some(2));
        let mut state = ExpressionState::default();
        state.set_emotion("love").unwrap();
        layer.spawn_if_due(&state, (90.0, 40.0), DT);
        let start = layer.particles()[0].clone();

        layer.update(0.5);
        let moved = &layer.particles()[0];
        assert!(moved.y < start.y);
        assert!(moved.life < start.life);

        for _ in 0..(60 * 3) {
            layer.update(DT);
        }
        assert!(layer.particles().is_empty());
    }

    #[test]
    fn faded_particles_draw_dimmer() {
        let mut frame = Frame::new(16, 16);
        let particle = Particle {
            x: 2.0,
            y: 2.0,
            vx: 0.0,
            vy: 0.0,
            life: 0.5,
            glyph: Glyph::Z,
            phase: 0.0,
        };
        particle.draw(&mut frame, Rgb::new(200, 200, 200));
        assert_eq!(frame.get(2, 2), Some(Rgb::new(100, 100, 100)));
        assert_eq!(frame.lit_count(), 13);
    }
}
