// Damped harmonic oscillator for one animated scalar.

/// Mass-spring-damper integrator. Semi-implicit Euler: velocity first, then
/// value from the new velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSolver {
    pub value: f64,
    pub target: f64,
    pub velocity: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl SpringSolver {
    pub fn new(initial: f64, stiffness: f64, damping: f64, mass: f64) -> Self {
        Self {
            value: initial,
            target: initial,
            velocity: 0.0,
            stiffness,
            damping,
            mass,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Jump to `value` with no animation and no residual velocity.
    pub fn snap_to(&mut self, value: f64) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
    }

    /// Advance one step of `dt` seconds and return the new value.
    pub fn update(&mut self, dt: f64) -> f64 {
        let force = self.stiffness * (self.target - self.value) - self.damping * self.velocity;
        let accel = force / self.mass;
        self.velocity += accel * dt;
        self.value += self.velocity * dt;
        self.value
    }

    /// Replace stiffness and damping, keeping position and velocity.
    pub fn retune(&mut self, stiffness: f64, damping: f64) {
        self.stiffness = stiffness;
        self.damping = damping;
    }

    /// Damping ratio; 1.0 is critical damping.
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    pub fn is_settled(&self, epsilon: f64) -> bool {
        (self.target - self.value).abs() < epsilon && self.velocity.abs() < epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn snap_clears_velocity() {
        let mut spring = SpringSolver::new(0.0, 120.0, 16.0, 1.0);
        spring.set_target(10.0);
        for _ in 0..5 {
            spring.update(DT);
        }
        assert!(spring.velocity > 0.0);
        spring.snap_to(3.0);
        assert_eq!(spring.value, 3.0);
        assert_eq!(spring.target, 3.0);
        assert_eq!(spring.velocity, 0.0);
        assert_eq!(spring.update(DT), 3.0);
    }

    #[test]
    fn set_target_only_moves_target() {
        let mut spring = SpringSolver::new(2.0, 120.0, 16.0, 1.0);
        spring.set_target(-4.0);
        assert_eq!(spring.value, 2.0);
        assert_eq!(spring.velocity, 0.0);
        assert_eq!(spring.target, -4.0);
    }

    #[test]
    fn underdamped_spring_overshoots_then_settles() {
        let mut spring = SpringSolver::new(0.0, 120.0, 8.0, 1.0);
        assert!(spring.damping_ratio() < 1.0);
        spring.set_target(1.0);
        let mut peak: f64 = 0.0;
        for _ in 0..600 {
            peak = peak.max(spring.update(DT));
        }
        assert!(peak > 1.0, "expected overshoot, peak {}", peak);
        assert!(spring.is_settled(1e-3));
    }

    #[test]
    fn retune_keeps_motion_state() {
        let mut spring = SpringSolver::new(0.0, 120.0, 16.0, 1.0);
        spring.set_target(5.0);
        spring.update(DT);
        let (value, velocity) = (spring.value, spring.velocity);
        spring.retune(200.0, 20.0);
        assert_eq!(spring.value, value);
        assert_eq!(spring.velocity, velocity);
    }

    proptest! {
        #[test]
        fn converges_without_diverging(
            stiffness in 50.0f64..400.0,
            ratio in 0.3f64..1.5,
            mass in 0.5f64..2.0,
            a in -50.0f64..50.0,
            b in -50.0f64..50.0,
        ) {
            prop_assume!((a - b).abs() > 1e-3);
            let damping = ratio * 2.0 * (stiffness * mass).sqrt();
            let mut spring = SpringSolver::new(a, stiffness, damping, mass);
            spring.set_target(b);
            let bound = 2.0 * (a - b).abs() + 1e-9;
            for _ in 0..5000 {
                let value = spring.update(DT);
                prop_assert!((value - b).abs() <= bound, "diverged: {} vs {}", value, b);
            }
            prop_assert!((spring.value - b).abs() < 1e-6 * (1.0 + (a - b).abs()));
        }

        #[test]
        fn identical_springs_stay_identical(
            stiffness in 10.0f64..400.0,
            damping in 1.0f64..40.0,
            targets in proptest::collection::vec(-20.0f64..20.0, 1..8),
        ) {
            let mut left = SpringSolver::new(0.0, stiffness, damping, 1.0);
            let mut right = left;
            for target in targets {
                left.set_target(target);
                right.set_target(target);
                for _ in 0..30 {
                    prop_assert_eq!(left.update(DT).to_bits(), right.update(DT).to_bits());
                }
            }
        }
    }
}
