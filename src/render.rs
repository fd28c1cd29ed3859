// Turns one frame's resolved parameters into a raster.
//
// Each eye is synthesized in its own unrotated frame (silhouette, then
// eyelid mask) and only then rotated and placed, so tilted expressions get
// slanted lids. The two eyes share one gaze offset and are coupled through
// a perspective scale: the eye on the side the gaze points to grows, the
// other shrinks.

use crate::behavior::ResolvedParams;
use crate::config::Tuning;
use crate::elements::{shape_for, EyePosition, Side};
use crate::frame::Frame;
use crate::particles::Particle;

/// Largest relative size change perspective may apply to either eye.
pub const PERSPECTIVE_MAX: f64 = 0.25;
/// Gaze offset (px) at which perspective reaches ~76% of its maximum.
pub const PERSPECTIVE_RANGE_PX: f64 = 12.0;
/// Extra height per unit of negative (wider than open) eyelid.
pub const LID_WIDEN_FACTOR: f64 = 0.5;

/// `(left, right)` size multipliers for a horizontal gaze offset. Both stay
/// strictly inside `1 ± PERSPECTIVE_MAX` for any finite gaze.
pub fn perspective_scales(gaze_x: f64) -> (f64, f64) {
    let factor = PERSPECTIVE_MAX * (gaze_x / PERSPECTIVE_RANGE_PX).tanh();
    (1.0 - factor, 1.0 + factor)
}

/// Where and how big one eye is this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeGeometry {
    pub side: Side,
    pub center_x: f64,
    pub center_y: f64,
    pub half_w: f64,
    pub half_h: f64,
    pub corner_radius: f64,
    /// Screen rotation in radians, already mirrored for this side.
    pub rotation: f64,
    pub perspective: f64,
    /// Clamped closure fractions used for masking.
    pub upper_lid: f64,
    pub lower_lid: f64,
}

impl EyeGeometry {
    /// Local (unrotated, eye-centered) point to screen coordinates.
    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        let (sin, cos) = self.rotation.sin_cos();
        (
            self.center_x + x * cos - y * sin,
            self.center_y + x * sin + y * cos,
        )
    }

    pub fn to_local(&self, sx: f64, sy: f64) -> (f64, f64) {
        let (sin, cos) = self.rotation.sin_cos();
        let (dx, dy) = (sx - self.center_x, sy - self.center_y);
        (dx * cos + dy * sin, -dx * sin + dy * cos)
    }

    /// Coverage of the eyelid mask at a local point: 1 where the eye is
    /// open, 0 behind either lid, one pixel of falloff at each lid edge.
    pub fn lid_coverage(&self, y: f64) -> f64 {
        let top_cut = -self.half_h + 2.0 * self.half_h * self.upper_lid;
        let bottom_cut = self.half_h - 2.0 * self.half_h * self.lower_lid;
        let below_top = (y - top_cut + 0.5).clamp(0.0, 1.0);
        let above_bottom = (bottom_cut - y + 0.5).clamp(0.0, 1.0);
        below_top * above_bottom
    }

    fn bounding_radius(&self) -> f64 {
        self.half_w.hypot(self.half_h) + 1.0
    }
}

// ============================================================================
// RENDERER
// ============================================================================

#[derive(Debug, Clone)]
pub struct Renderer {
    width: u32,
    height: u32,
    tuning: Tuning,
}

impl Renderer {
    pub fn new(width: u32, height: u32, tuning: &Tuning) -> Self {
        Self {
            width,
            height,
            tuning: *tuning,
        }
    }

    pub fn set_tuning(&mut self, tuning: &Tuning) {
        self.tuning = *tuning;
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn anchor(&self, side: Side) -> EyePosition {
        EyePosition::anchor(side, self.width, self.height, self.tuning.eye_spacing)
    }

    /// Where drifting particles are born: just above the right eye.
    pub fn particle_origin(&self) -> (f64, f64) {
        let anchor = self.anchor(Side::Right);
        (
            anchor.center_x + self.tuning.eye_size * 0.3,
            anchor.center_y - self.tuning.eye_size * 0.6,
        )
    }

    pub fn eye_geometry(&self, params: &ResolvedParams, side: Side) -> EyeGeometry {
        let (left, right) = perspective_scales(params.gaze_x);
        let perspective = match side {
            Side::Left => left,
            Side::Right => right,
        };
        let widen = (-params.upper_lid).max(0.0) + (-params.lower_lid).max(0.0);
        let half = self.tuning.eye_size / 2.0;
        let anchor = self.anchor(side);

        EyeGeometry {
            side,
            center_x: anchor.center_x + params.x,
            center_y: anchor.center_y + params.y,
            half_w: (half * params.width_scale * perspective).max(0.0),
            half_h: (half * params.height_scale * perspective * (1.0 + LID_WIDEN_FACTOR * widen)).max(0.0),
            corner_radius: self.tuning.corner_radius * perspective,
            rotation: params.angle.to_radians() * side.tilt_sign(),
            perspective,
            upper_lid: params.upper_lid.clamp(0.0, 1.0),
            lower_lid: params.lower_lid.clamp(0.0, 1.0),
        }
    }

    /// Render both eyes and any particles. Touches nothing but the new frame.
    pub fn draw(&self, params: &ResolvedParams, particles: &[Particle]) -> Frame {
        let mut frame = Frame::new(self.width, self.height);
        for side in Side::BOTH {
            let geometry = self.eye_geometry(params, side);
            self.draw_eye(&mut frame, params, &geometry);
        }
        for particle in particles {
            particle.draw(&mut frame, params.color);
        }
        frame
    }

    fn draw_eye(&self, frame: &mut Frame, params: &ResolvedParams, eye: &EyeGeometry) {
        if eye.half_w <= 0.0 || eye.half_h <= 0.0 {
            return;
        }
        let shape = shape_for(params.shape);
        let reach = eye.bounding_radius();
        let x0 = ((eye.center_x - reach).floor() as i32).max(0);
        let x1 = ((eye.center_x + reach).ceil() as i32).min(self.width as i32 - 1);
        let y0 = ((eye.center_y - reach).floor() as i32).max(0);
        let y1 = ((eye.center_y + reach).ceil() as i32).min(self.height as i32 - 1);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let (lx, ly) = eye.to_local(px as f64 + 0.5, py as f64 + 0.5);
                let lid = eye.lid_coverage(ly);
                if lid <= 0.0 {
                    continue;
                }
                let body = shape.coverage(lx, ly, eye.half_w, eye.half_h, eye.corner_radius);
                frame.blend(px, py, params.color, body * lid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::emotion::{Emotion, ShapeTag};

    fn params() -> ResolvedParams {
        ResolvedParams {
            emotion: Emotion::Idle,
            x: 0.0,
            y: 0.0,
            gaze_x: 0.0,
            width_scale: 1.0,
            height_scale: 1.0,
            angle: 0.0,
            upper_lid: 0.0,
            lower_lid: 0.0,
            color: Rgb::new(0, 200, 255),
            shape: ShapeTag::Normal,
        }
    }

    fn renderer() -> Renderer {
        Renderer::new(128, 128, &Tuning::default())
    }

    #[test]
    fn gaze_right_grows_the_right_eye() {
        for gaze in [0.5, 3.0, 12.0, 100.0, 1e9] {
            let (left, right) = perspective_scales(gaze);
            assert!(left < right, "gaze {}", gaze);
            assert!(left >= 1.0 - PERSPECTIVE_MAX && right <= 1.0 + PERSPECTIVE_MAX);
        }
        let (left, right) = perspective_scales(-6.0);
        assert!(left > right);
        assert_eq!(perspective_scales(0.0), (1.0, 1.0));
    }

    #[test]
    fn perspective_shows_up_in_the_frame() {
        let r = renderer();
        let p = ResolvedParams { gaze_x: 8.0, ..params() };
        let frame = r.draw(&p, &[]);
        let left = frame.lit_count_in_columns(0, 64);
        let right = frame.lit_count_in_columns(64, 128);
        assert!(left > 0 && right > left, "left {} right {}", left, right);
    }

    #[test]
    fn neutral_eyes_are_symmetric() {
        let frame = renderer().draw(&params(), &[]);
        assert_eq!(frame.lit_count_in_columns(0, 64), frame.lit_count_in_columns(64, 128));
        assert_eq!(frame.get(34, 64), Some(Rgb::new(0, 200, 255)));
        assert_eq!(frame.get(0, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn positive_tilt_droops_both_outer_corners() {
        let r = renderer();
        let p = ResolvedParams { angle: 12.0, ..params() };
        let left = r.eye_geometry(&p, Side::Left);
        let right = r.eye_geometry(&p, Side::Right);
        assert_eq!(left.rotation, -right.rotation);

        // top-outer corner sits lower (larger y) than top-inner corner
        let (_, left_outer) = left.to_screen(-left.half_w, -left.half_h);
        let (_, left_inner) = left.to_screen(left.half_w, -left.half_h);
        assert!(left_outer > left_inner);
        let (_, right_outer) = right.to_screen(right.half_w, -right.half_h);
        let (_, right_inner) = right.to_screen(-right.half_w, -right.half_h);
        assert!(right_outer > right_inner);

        let angry = ResolvedParams { angle: -15.0, ..params() };
        let left = r.eye_geometry(&angry, Side::Left);
        let (_, outer) = left.to_screen(-left.half_w, -left.half_h);
        let (_, inner) = left.to_screen(left.half_w, -left.half_h);
        assert!(outer < inner);
    }

    #[test]
    fn local_and_screen_round_trip() {
        let r = renderer();
        let p = ResolvedParams { angle: 20.0, x: 3.0, y: -2.0, ..params() };
        let g = r.eye_geometry(&p, Side::Left);
        let (sx, sy) = g.to_screen(4.0, -7.0);
        let (lx, ly) = g.to_local(sx, sy);
        assert!((lx - 4.0).abs() < 1e-9 && (ly + 7.0).abs() < 1e-9);
    }

    #[test]
    fn lids_mask_in_the_local_frame() {
        let r = renderer();
        let open = r.draw(&params(), &[]).lit_count();
        let half = r.draw(&ResolvedParams { upper_lid: 0.5, ..params() }, &[]).lit_count();
        let shut = r.draw(&ResolvedParams { upper_lid: 1.2, ..params() }, &[]).lit_count();
        assert!(half < open && half > 0);
        assert_eq!(shut, 0);

        let g = r.eye_geometry(&ResolvedParams { upper_lid: 0.5, ..params() }, Side::Left);
        assert_eq!(g.lid_coverage(-g.half_h + 1.0), 0.0);
        assert_eq!(g.lid_coverage(g.half_h - 2.0), 1.0);
    }

    #[test]
    fn negative_lids_widen_the_eye() {
        let r = renderer();
        let normal = r.eye_geometry(&params(), Side::Left);
        let wide = r.eye_geometry(&ResolvedParams { upper_lid: -0.2, ..params() }, Side::Left);
        assert!(wide.half_h > normal.half_h);
        assert_eq!(wide.upper_lid, 0.0);
        assert_eq!(wide.half_w, normal.half_w);
    }

    #[test]
    fn heart_profile_draws_a_heart() {
        let r = renderer();
        let heart = ResolvedParams { shape: ShapeTag::Heart, ..params() };
        let g = r.eye_geometry(&heart, Side::Left);
        let frame = r.draw(&heart, &[]);
        // notch between the lobes stays dark, rounded rect would fill it
        let notch_y = (g.center_y - g.half_h + 0.5) as i32;
        assert_eq!(frame.get(g.center_x as i32, notch_y), Some(Rgb::BLACK));
        let body = r.draw(&params(), &[]);
        assert_ne!(body.get(g.center_x as i32, notch_y), Some(Rgb::BLACK));
    }

    #[test]
    fn drawing_does_not_depend_on_call_order() {
        let r = renderer();
        let p = ResolvedParams { angle: 7.0, gaze_x: 3.0, x: 3.0, ..params() };
        assert_eq!(r.draw(&p, &[]), r.draw(&p, &[]));
    }
}
