//! Ship lifecycle state machine

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::net::protocol::{PeerId, Report};
use crate::net::timing::TimingStats;

use super::body::Body;
use super::missile::Missile;
use super::{
    DEBRIS_ANGLE, DEBRIS_COUNT, DEBRIS_XPOS, DEBRIS_YPOS, LAUNCH_COOLDOWN_MS, MAX_MISSILES,
    MAX_STEP_MS, MISSILE_BOOST,
};

/// Ship lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipState {
    Active,
    Destroyed,
    Hyperspaced,
}

/// One spacecraft, either locally owned or a replica of a peer.
///
/// The locally-owned ship is authoritative for all of its fields; remote
/// ships are overwritten by merged reports and only extrapolated between
/// them.
#[derive(Debug, Clone)]
pub struct Ship {
    pub id: PeerId,
    pub name: String,
    pub state: ShipState,

    /// Current rotation input (signed angular acceleration)
    pub rotation: f64,
    /// Current thrust input (acceleration along heading)
    pub thrust: f64,

    /// Latest one-way delay measured for reports from this peer (ms)
    pub recv_delay: f64,
    /// Simulation time of the last lifecycle transition
    pub last_active: f64,
    /// Simulation time this ship was last advanced to
    pub last_update: f64,
    /// Simulation time of the last missile launch
    pub last_launch: f64,
    /// Simulation time the last report was sent (local) or received (remote)
    pub last_report: f64,

    /// Round-trip outbound timing, from the peer's echoed receive delays
    pub send_timing: TimingStats,
    /// Inbound timing, from locally measured receive delays
    pub recv_timing: TimingStats,

    pub body: Body,
    /// Populated only while DESTROYED
    pub debris: [Body; DEBRIS_COUNT],
    pub missiles: Vec<Missile>,
}

impl Ship {
    pub fn new(id: PeerId) -> Self {
        Self {
            id,
            name: String::new(),
            state: ShipState::Hyperspaced,
            rotation: 0.0,
            thrust: 0.0,
            recv_delay: 0.0,
            last_active: 0.0,
            last_update: 0.0,
            last_launch: 0.0,
            last_report: 0.0,
            send_timing: TimingStats::new(),
            recv_timing: TimingStats::new(),
            body: Body::new(),
            debris: Default::default(),
            missiles: Vec::new(),
        }
    }

    /// (Re)spawn on a random orbit and go ACTIVE
    pub fn place_random<R: Rng>(&mut self, rng: &mut R, now: f64) {
        self.state = ShipState::Active;
        self.last_launch = now;
        self.last_update = now;
        self.body.randomize_placement(rng);
    }

    /// ACTIVE -> DESTROYED: shatter into debris fragments derived from the
    /// ship body at the instant of destruction
    pub fn destroy<R: Rng>(&mut self, rng: &mut R, now: f64) {
        let cos = self.body.angle.cos();
        let sin = self.body.angle.sin();

        self.state = ShipState::Destroyed;
        self.last_active = now;

        for (i, debris) in self.debris.iter_mut().enumerate() {
            debris.x = self.body.x + DEBRIS_XPOS[i] * cos;
            debris.y = self.body.y + DEBRIS_YPOS[i] * sin;
            debris.angle = self.body.angle + DEBRIS_ANGLE[i] * std::f64::consts::PI;

            debris.vx = self.body.vx + rng.gen::<f64>() * 0.04 - 0.02;
            debris.vy = self.body.vy + rng.gen::<f64>() * 0.04 - 0.02;
            debris.ang_vel = (rng.gen::<f64>() * 0.004 - 0.002) * std::f64::consts::PI;
        }
    }

    /// ACTIVE -> HYPERSPACED, ignored from any other state
    pub fn enter_hyperspace(&mut self, now: f64) -> bool {
        if self.state != ShipState::Active {
            return false;
        }

        self.state = ShipState::Hyperspaced;
        self.last_active = now;
        true
    }

    /// Spawn a missile unless the cap is reached or the cooldown since the
    /// last launch has not elapsed. Silent no-op in either case.
    pub fn launch_missile(&mut self, now: f64) -> bool {
        if self.missiles.len() >= MAX_MISSILES || now - self.last_launch < LAUNCH_COOLDOWN_MS {
            return false;
        }

        let mut body = self.body.clone();
        body.vx += MISSILE_BOOST * self.body.angle.cos();
        body.vy += MISSILE_BOOST * self.body.angle.sin();
        body.angle = 0.0;
        body.ang_vel = 0.0;

        self.missiles.push(Missile::new(body));
        self.last_launch = now;
        true
    }

    /// Advance the ship (or its debris) and all missiles up to `now` in
    /// bounded sub-steps.
    ///
    /// The ship's angular velocity is zeroed every sub-step and set only from
    /// the rotation input, so there is no residual spin.
    pub fn update(&mut self, now: f64) {
        let mut interval = now - self.last_update;

        while interval > 0.0 {
            let dt = interval.min(MAX_STEP_MS);
            interval -= dt;

            match self.state {
                ShipState::Active => {
                    self.body.ang_vel = 0.0;
                    self.body.step(dt, self.rotation, self.thrust);
                }
                ShipState::Destroyed => {
                    for debris in self.debris.iter_mut() {
                        debris.step(dt, 0.0, 0.0);
                    }
                }
                ShipState::Hyperspaced => {}
            }

            for missile in self.missiles.iter_mut() {
                missile.advance(dt);
            }
        }

        self.last_update = now;
    }

    /// Merge an inbound report into this (remote) ship.
    ///
    /// `wall_now` is the local wall-clock arrival time; the sender's
    /// simulation timestamp is rebased onto the local simulation clock via
    /// the measured receive delay so extrapolation stays continuous across
    /// independent clocks.
    pub fn apply_report(&mut self, report: &Report, my_id: PeerId, now: f64, wall_now: f64) {
        self.name = report.name.clone();
        self.state = report.state;
        self.rotation = report.rotation;
        self.thrust = report.thrust;

        self.recv_delay = wall_now - report.last_update;
        self.last_update = now - self.recv_delay;
        self.last_report = now;

        if let Some(&send_delay) = report.recv_delay.get(&my_id) {
            if send_delay != 0.0 && send_delay.is_finite() {
                self.send_timing.insert(send_delay, now);
            }
        }
        self.recv_timing.insert(self.recv_delay, now);

        if let Some(snap) = &report.body {
            self.body.apply_snapshot(snap);
        }

        if let Some(snaps) = &report.debris {
            for (debris, snap) in self.debris.iter_mut().zip(snaps.iter()) {
                debris.apply_snapshot(snap);
            }
        }

        // The missile collection is replaced wholesale on every report
        self.missiles = report
            .missiles
            .iter()
            .filter_map(Missile::from_snapshot)
            .collect();
    }
}
