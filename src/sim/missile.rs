//! Missiles: a body plus age-since-launch

use serde::{Deserialize, Serialize};

use super::body::{Body, BodySnapshot};
use super::{MISSILE_ARM_MS, MISSILE_LIFETIME_MS};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Missile {
    pub body: Body,
    /// Milliseconds since launch
    pub age: f64,
}

/// Wire form of a missile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissileSnapshot {
    pub body: BodySnapshot,
    pub age: f64,
}

impl Missile {
    pub fn new(body: Body) -> Self {
        // Reports carry fractional ages, so a fresh missile starts just past
        // zero the way a first integration step would leave it
        Self { body, age: 1.0 }
    }

    /// Advance the missile; ballistic, no thrust or steering
    pub fn advance(&mut self, interval: f64) {
        self.body.advance(interval, 0.0, 0.0);
        self.age += interval;
    }

    /// Armed missiles participate in collisions; younger ones are inert,
    /// which prevents an instant self-kill on launch
    pub fn armed(&self) -> bool {
        self.age >= MISSILE_ARM_MS
    }

    pub fn expired(&self) -> bool {
        self.age > MISSILE_LIFETIME_MS
    }

    pub fn snapshot(&self) -> MissileSnapshot {
        MissileSnapshot {
            body: self.body.snapshot(),
            age: self.age,
        }
    }

    /// Rebuild a missile from a report; rejects non-finite snapshots
    pub fn from_snapshot(snap: &MissileSnapshot) -> Option<Self> {
        if !snap.body.is_finite() || !snap.age.is_finite() {
            return None;
        }

        let mut body = Body::new();
        body.apply_snapshot(&snap.body);
        Some(Self {
            body,
            age: snap.age,
        })
    }
}
