//! Gravity-bound body and its integrator

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_ORBIT, HIT_RADIUS, MAX_STEP_MS, SUN_MASS};

/// Position, velocity and orientation of one simulated object.
///
/// State is mutated only through the integrator; the single exception is
/// `apply_snapshot`, which overwrites a remote body after a report merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub angle: f64,
    pub ang_vel: f64,
}

/// Wire form of a body, merged field-by-field on receipt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub angle: f64,
    pub ang_vel: f64,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    /// One semi-implicit Euler sub-step: velocity first, then position.
    ///
    /// Gravity is an inverse-square pull toward the origin, skipped at r = 0.
    /// `rotation` feeds angular acceleration, `thrust` accelerates along the
    /// current heading.
    pub fn step(&mut self, dt: f64, rotation: f64, thrust: f64) {
        let mut ax = thrust * self.angle.cos();
        let mut ay = thrust * self.angle.sin();

        let r_cubed = (self.x * self.x + self.y * self.y).powf(1.5);
        if r_cubed != 0.0 {
            ax -= SUN_MASS * self.x / r_cubed;
            ay -= SUN_MASS * self.y / r_cubed;
        }

        self.vx += ax * dt;
        self.vy += ay * dt;
        self.ang_vel += rotation * dt;

        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.angle += self.ang_vel * dt;
    }

    /// Consume `interval` in sub-steps of at most `MAX_STEP_MS`.
    ///
    /// Keeps the integration stable even when a single large interval arrives
    /// after a long pause.
    pub fn advance(&mut self, interval: f64, rotation: f64, thrust: f64) {
        let mut remaining = interval;
        while remaining > 0.0 {
            let dt = remaining.min(MAX_STEP_MS);
            remaining -= dt;
            self.step(dt, rotation, thrust);
        }
    }

    /// Place the body on a random roughly-circular orbit around the sun
    pub fn randomize_placement<R: Rng>(&mut self, rng: &mut R) {
        let radius = (1.0 + rng.gen::<f64>() * 3.0) / 4.0 * DEFAULT_ORBIT;
        let theta = std::f64::consts::TAU * rng.gen::<f64>();
        let angle = std::f64::consts::TAU * rng.gen::<f64>();
        let direction = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        let vel = direction * (SUN_MASS / radius).sqrt();

        self.x = radius * theta.cos();
        self.y = radius * theta.sin();
        self.angle = angle;

        // Tangential velocity for a circular orbit at this radius
        self.vx = vel * (theta - std::f64::consts::FRAC_PI_2).cos();
        self.vy = vel * (theta - std::f64::consts::FRAC_PI_2).sin();
        self.ang_vel = 0.0;
    }

    /// Circular proximity test against a point
    pub fn hit_test(&self, x: f64, y: f64, radius: f64) -> bool {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt() <= radius
    }

    /// Proximity test at the standard hit radius
    pub fn hit_test_default(&self, x: f64, y: f64) -> bool {
        self.hit_test(x, y, HIT_RADIUS)
    }

    pub fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
            angle: self.angle,
            ang_vel: self.ang_vel,
        }
    }

    /// Overwrite this body from a reported snapshot.
    ///
    /// Returns false without committing anything when the snapshot carries a
    /// non-finite value.
    pub fn apply_snapshot(&mut self, snap: &BodySnapshot) -> bool {
        if !snap.is_finite() {
            return false;
        }

        self.x = snap.x;
        self.y = snap.y;
        self.vx = snap.vx;
        self.vy = snap.vy;
        self.angle = snap.angle;
        self.ang_vel = snap.ang_vel;
        true
    }

    /// Specific orbital energy, used to bound integrator drift in tests
    pub fn orbital_energy(&self) -> f64 {
        let r = (self.x * self.x + self.y * self.y).sqrt();
        let v_sq = self.vx * self.vx + self.vy * self.vy;
        v_sq / 2.0 - SUN_MASS / r
    }
}

impl BodySnapshot {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.vx.is_finite()
            && self.vy.is_finite()
            && self.angle.is_finite()
            && self.ang_vel.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn circular_body() -> Body {
        let mut body = Body::new();
        body.x = DEFAULT_ORBIT;
        body.vy = (SUN_MASS / DEFAULT_ORBIT).sqrt();
        body
    }

    #[test]
    fn substeps_match_one_large_advance() {
        let mut split = circular_body();
        let mut whole = circular_body();

        for _ in 0..200 {
            split.advance(5.0, 0.0, 0.0);
        }
        whole.advance(1000.0, 0.0, 0.0);

        assert!((split.x - whole.x).abs() < 1e-6);
        assert!((split.y - whole.y).abs() < 1e-6);
        assert!((split.vx - whole.vx).abs() < 1e-9);
        assert!((split.vy - whole.vy).abs() < 1e-9);
    }

    #[test]
    fn large_interval_is_subdivided() {
        // A 10 second stall must not explode the orbit
        let mut body = circular_body();
        let before = body.orbital_energy();
        body.advance(10_000.0, 0.0, 0.0);
        let after = body.orbital_energy();

        assert!((after - before).abs() < before.abs() * 0.01);
    }

    #[test]
    fn orbital_energy_is_roughly_conserved_over_one_period() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut body = Body::new();
        body.randomize_placement(&mut rng);

        let r = (body.x * body.x + body.y * body.y).sqrt();
        let period = std::f64::consts::TAU * (r.powi(3) / SUN_MASS).sqrt();

        let before = body.orbital_energy();
        body.advance(period, 0.0, 0.0);
        let after = body.orbital_energy();

        assert!((after - before).abs() < before.abs() * 0.01);
    }

    #[test]
    fn gravity_skipped_at_origin() {
        let mut body = Body::new();
        body.step(1.0, 0.0, 0.0);
        assert_eq!(body.x, 0.0);
        assert_eq!(body.y, 0.0);
    }

    #[test]
    fn randomize_placement_stays_in_orbit_band() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let mut body = Body::new();
            body.randomize_placement(&mut rng);
            let r = (body.x * body.x + body.y * body.y).sqrt();
            assert!(r >= DEFAULT_ORBIT * 0.25 - 1e-9);
            assert!(r <= DEFAULT_ORBIT + 1e-9);

            let speed = (body.vx * body.vx + body.vy * body.vy).sqrt();
            assert!((speed - (SUN_MASS / r).sqrt()).abs() < 1e-9);
        }
    }

    #[test]
    fn hit_test_boundary() {
        let body = Body::new();
        assert!(body.hit_test(20.0, 0.0, 24.0));
        assert!(body.hit_test(24.0, 0.0, 24.0));
        assert!(!body.hit_test(25.0, 0.0, 24.0));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut body = Body::new();
        body.randomize_placement(&mut rng);

        let mut copy = Body::new();
        assert!(copy.apply_snapshot(&body.snapshot()));
        assert_eq!(copy, body);
    }

    #[test]
    fn non_finite_snapshot_rejected() {
        let mut body = circular_body();
        let reference = body.clone();

        let mut snap = body.snapshot();
        snap.vx = f64::NAN;
        assert!(!body.apply_snapshot(&snap));
        assert_eq!(body, reference);
    }
}
