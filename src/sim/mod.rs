//! Orbital simulation: bodies, missiles, ships and the world registry

pub mod body;
pub mod missile;
pub mod ship;
pub mod world;

pub use body::Body;
pub use missile::Missile;
pub use ship::{Ship, ShipState};
pub use world::{TickOutcome, World};

/// Central mass of the sun (gravitational parameter, px^3/ms^2)
pub const SUN_MASS: f64 = 4.0;
/// Thrust acceleration while the engine is on (px/ms^2)
pub const THRUST_ACCEL: f64 = 0.00004;
/// Angular acceleration applied per unit of rotation input (rad/ms^2)
pub const ROTATION_RATE: f64 = 0.004;
/// Reference orbit radius for random placement (px)
pub const DEFAULT_ORBIT: f64 = 350.0;

/// Maximum integrator sub-step; larger elapsed intervals are subdivided (ms)
pub const MAX_STEP_MS: f64 = 1.0;

/// Maximum time between reports even with no input change (ms)
pub const KEEPALIVE_MS: f64 = 1000.0;
/// Keep-alive multiples after which a silent peer is evicted
pub const STALE_REPORTS: f64 = 5.0;
/// Delay before a destroyed ship respawns (ms)
pub const DESTROYED_MS: f64 = 3000.0;
/// Delay before a hyperspaced ship re-enters (ms)
pub const HYPERSPACED_MS: f64 = 3000.0;
/// Minimum time between missile launches (ms)
pub const LAUNCH_COOLDOWN_MS: f64 = 500.0;
/// Missile age before it participates in collisions (ms)
pub const MISSILE_ARM_MS: f64 = 250.0;
/// Missile age at which it expires (ms)
pub const MISSILE_LIFETIME_MS: f64 = 5000.0;
/// Per-ship cap on live missiles
pub const MAX_MISSILES: usize = 10;
/// Velocity boost a missile gets along the ship's heading (px/ms)
pub const MISSILE_BOOST: f64 = 0.2;

/// Hit radius of the sun (px)
pub const SUN_HIT_RADIUS: f64 = 24.0;
/// Hit radius for ships, debris and missiles (px)
pub const HIT_RADIUS: f64 = 12.0;

/// Number of debris fragments a destroyed ship shatters into
pub const DEBRIS_COUNT: usize = 6;
/// Fragment offsets from the ship center, rotated by its heading (px)
pub const DEBRIS_XPOS: [f64; DEBRIS_COUNT] = [-6.0, -6.1, 6.0, 6.0, -6.1, -6.0];
pub const DEBRIS_YPOS: [f64; DEBRIS_COUNT] = [2.0, 5.3, 0.7, -0.7, -5.3, -2.0];
/// Fragment orientations relative to the ship heading, in units of pi
pub const DEBRIS_ANGLE: [f64; DEBRIS_COUNT] = [0.648, 0.886, 0.886, 1.114, 1.114, 1.352];

/// Control intent from the input boundary, consumed once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    RotateLeft(bool),
    RotateRight(bool),
    Thrust(bool),
    Fire(bool),
    Hyperspace,
    Pause,
    ObserveToggle,
}

/// Held input state assembled from control events
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlState {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub thrust: bool,
    pub fire: bool,
}

impl ControlState {
    /// Signed rotation input for the integrator
    pub fn rotation(&self) -> f64 {
        (self.rotate_right as i8 - self.rotate_left as i8) as f64 * ROTATION_RATE
    }

    /// Thrust acceleration input for the integrator
    pub fn thrust(&self) -> f64 {
        if self.thrust {
            THRUST_ACCEL
        } else {
            0.0
        }
    }
}
