//! World registry: every known ship keyed by peer identity
//!
//! The world is mutated only from the engine tick task: inbound transport
//! events are drained into it once per tick, so merges and physics never
//! race. Remote ships are passive replicas; only the local ship is
//! authoritative.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::net::protocol::{PeerId, Report};

use super::ship::{Ship, ShipState};
use super::{
    ControlEvent, ControlState, DESTROYED_MS, HIT_RADIUS, HYPERSPACED_MS, KEEPALIVE_MS,
    LAUNCH_COOLDOWN_MS, STALE_REPORTS, SUN_HIT_RADIUS,
};

/// Result of one world tick
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Report due for broadcast, if any
    pub report: Option<Report>,
    /// Peers evicted for staleness this tick
    pub evicted: Vec<PeerId>,
}

pub struct World {
    ships: HashMap<PeerId, Ship>,
    my_id: Option<PeerId>,
    name: String,
    control: ControlState,
    observe_only: bool,
    paused: bool,
    report_needed: bool,
    rng: StdRng,
}

impl World {
    pub fn new(name: String, observe_only: bool) -> Self {
        Self::with_rng(name, observe_only, StdRng::from_entropy())
    }

    pub fn with_rng(name: String, observe_only: bool, rng: StdRng) -> Self {
        Self {
            ships: HashMap::new(),
            my_id: None,
            name,
            control: ControlState::default(),
            observe_only,
            paused: false,
            report_needed: true,
            rng,
        }
    }

    /// Assign the local identity and spawn the local ship.
    ///
    /// Observe-only clients keep the ship parked in hyperspace instead of
    /// spawning it.
    pub fn set_self(&mut self, id: PeerId, now: f64) {
        let mut ship = Ship::new(id);
        ship.name = self.name.clone();
        if !self.observe_only {
            ship.place_random(&mut self.rng, now);
        }

        self.my_id = Some(id);
        self.ships.insert(id, ship);
        self.report_needed = true;
    }

    pub fn my_id(&self) -> Option<PeerId> {
        self.my_id
    }

    pub fn my_ship(&self) -> Option<&Ship> {
        self.my_id.and_then(|id| self.ships.get(&id))
    }

    fn my_ship_mut(&mut self) -> Option<&mut Ship> {
        let id = self.my_id?;
        self.ships.get_mut(&id)
    }

    /// Read-only access for rendering and diagnostics
    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    pub fn ship(&self, id: PeerId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Remove a peer that explicitly quit
    pub fn remove_ship(&mut self, id: PeerId) {
        if Some(id) != self.my_id {
            self.ships.remove(&id);
        }
    }

    /// Consume one control intent from the input boundary
    pub fn apply_input(&mut self, event: ControlEvent, now: f64) {
        match event {
            ControlEvent::RotateLeft(held) => {
                self.control.rotate_left = held;
                self.report_needed = true;
            }
            ControlEvent::RotateRight(held) => {
                self.control.rotate_right = held;
                self.report_needed = true;
            }
            ControlEvent::Thrust(held) => {
                self.control.thrust = held;
                self.report_needed = true;
            }
            ControlEvent::Fire(held) => {
                self.control.fire = held;
            }
            ControlEvent::Hyperspace => {
                if let Some(ship) = self.my_ship_mut() {
                    if ship.enter_hyperspace(now) {
                        self.report_needed = true;
                    }
                }
            }
            ControlEvent::Pause => {
                self.paused = !self.paused;
                if !self.paused {
                    if !self.observe_only {
                        let rng = &mut self.rng;
                        if let Some(id) = self.my_id {
                            if let Some(ship) = self.ships.get_mut(&id) {
                                ship.place_random(rng, now);
                            }
                        }
                    }
                    self.report_needed = true;
                }
            }
            ControlEvent::ObserveToggle => {
                self.observe_only = !self.observe_only;
                if self.observe_only {
                    if let Some(ship) = self.my_ship_mut() {
                        ship.state = ShipState::Hyperspaced;
                        ship.last_active = 0.0;
                        ship.missiles.clear();
                    }
                    self.report_needed = true;
                }
            }
        }
    }

    /// Advance the world one tick.
    ///
    /// Order matters and mirrors the update cadence the protocol assumes:
    /// local collision check, stale-peer eviction, missile collisions,
    /// physics for every ship, local lifecycle scheduling, then report
    /// scheduling.
    pub fn tick(&mut self, now: f64, wall_now: f64) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        let my_id = match self.my_id {
            Some(id) => id,
            None => return outcome,
        };
        if self.paused {
            return outcome;
        }

        if let Some(ship) = self.ships.get_mut(&my_id) {
            ship.name = self.name.clone();
            ship.rotation = self.control.rotation();
            ship.thrust = self.control.thrust();
        }

        if self.local_ship_hit(my_id) {
            if let Some(ship) = self.ships.get_mut(&my_id) {
                ship.destroy(&mut self.rng, now);
                self.report_needed = true;
            }
        }

        outcome.evicted = self.evict_stale(my_id, now);
        self.remove_doomed_missiles();

        for ship in self.ships.values_mut() {
            ship.update(now);
        }

        self.schedule_lifecycle(my_id, now);

        let report_due = self
            .ships
            .get(&my_id)
            .map(|ship| now - ship.last_report >= KEEPALIVE_MS)
            .unwrap_or(false);

        if self.report_needed || report_due {
            if let Some(report) = self.build_report(now, wall_now) {
                outcome.report = Some(report);
                if let Some(ship) = self.ships.get_mut(&my_id) {
                    ship.last_report = now;
                }
                self.report_needed = false;
            }
        }

        outcome
    }

    /// True when the local ACTIVE ship touches the sun, another ACTIVE
    /// ship, any debris of a DESTROYED ship, or any armed missile
    fn local_ship_hit(&self, my_id: PeerId) -> bool {
        let me = match self.ships.get(&my_id) {
            Some(ship) if ship.state == ShipState::Active => ship,
            _ => return false,
        };

        if me.body.hit_test(0.0, 0.0, SUN_HIT_RADIUS) {
            return true;
        }

        for ship in self.ships.values() {
            if ship.id != my_id {
                match ship.state {
                    ShipState::Active => {
                        if me.body.hit_test_default(ship.body.x, ship.body.y) {
                            return true;
                        }
                    }
                    ShipState::Destroyed => {
                        for debris in &ship.debris {
                            if me.body.hit_test_default(debris.x, debris.y) {
                                return true;
                            }
                        }
                    }
                    ShipState::Hyperspaced => {}
                }
            }

            // Own missiles count too; the arming delay prevents an instant
            // self-kill on launch
            for missile in &ship.missiles {
                if missile.armed() && me.body.hit_test_default(missile.body.x, missile.body.y) {
                    return true;
                }
            }
        }

        false
    }

    /// Drop remote ships whose last report is older than the staleness
    /// window. An age of exactly the threshold is retained.
    fn evict_stale(&mut self, my_id: PeerId, now: f64) -> Vec<PeerId> {
        let horizon = STALE_REPORTS * KEEPALIVE_MS;
        let stale: Vec<PeerId> = self
            .ships
            .values()
            .filter(|ship| ship.id != my_id && now - ship.last_report > horizon)
            .map(|ship| ship.id)
            .collect();

        for id in &stale {
            debug!(peer_id = %id, "Evicting stale peer");
            self.ships.remove(id);
        }

        stale
    }

    /// Remove missiles that expired or collided with the sun, debris, or
    /// another missile. Both missiles of a colliding pair are removed in the
    /// same pass.
    fn remove_doomed_missiles(&mut self) {
        struct MissileRef {
            owner: PeerId,
            index: usize,
            x: f64,
            y: f64,
        }

        let mut missiles = Vec::new();
        let mut debris = Vec::new();
        let mut doomed: HashSet<(PeerId, usize)> = HashSet::new();

        for ship in self.ships.values() {
            if ship.state == ShipState::Destroyed {
                for fragment in &ship.debris {
                    debris.push((fragment.x, fragment.y));
                }
            }

            for (index, missile) in ship.missiles.iter().enumerate() {
                if missile.expired() || missile.body.hit_test(0.0, 0.0, SUN_HIT_RADIUS) {
                    doomed.insert((ship.id, index));
                }
                missiles.push(MissileRef {
                    owner: ship.id,
                    index,
                    x: missile.body.x,
                    y: missile.body.y,
                });
            }
        }

        for m in &missiles {
            if debris
                .iter()
                .any(|&(x, y)| (m.x - x).hypot(m.y - y) <= HIT_RADIUS)
            {
                doomed.insert((m.owner, m.index));
            }
        }

        for (i, a) in missiles.iter().enumerate() {
            for b in missiles.iter().skip(i + 1) {
                if (a.x - b.x).hypot(a.y - b.y) <= HIT_RADIUS {
                    doomed.insert((a.owner, a.index));
                    doomed.insert((b.owner, b.index));
                }
            }
        }

        if doomed.is_empty() {
            return;
        }

        for ship in self.ships.values_mut() {
            let id = ship.id;
            let mut index = 0;
            ship.missiles.retain(|_| {
                let keep = !doomed.contains(&(id, index));
                index += 1;
                keep
            });
        }
    }

    /// Fire, respawn and hyperspace-exit scheduling for the local ship
    fn schedule_lifecycle(&mut self, my_id: PeerId, now: f64) {
        let fire = self.control.fire;
        let observe_only = self.observe_only;
        let rng = &mut self.rng;

        let mut launched = false;
        let mut respawned = false;

        if let Some(ship) = self.ships.get_mut(&my_id) {
            match ship.state {
                ShipState::Active => {
                    if fire && now - ship.last_launch >= LAUNCH_COOLDOWN_MS {
                        launched = ship.launch_missile(now);
                    }
                }
                ShipState::Destroyed => {
                    if now - ship.last_active >= DESTROYED_MS {
                        ship.place_random(rng, now);
                        respawned = true;
                    }
                }
                ShipState::Hyperspaced => {
                    if !observe_only && now - ship.last_active >= HYPERSPACED_MS {
                        ship.place_random(rng, now);
                        respawned = true;
                    }
                }
            }
        }

        if launched || respawned {
            self.report_needed = true;
        }
    }

    /// Snapshot the local ship into a report.
    ///
    /// The send timestamp is rebased from the simulation clock onto the wall
    /// clock so receivers on independent clocks can measure the delay.
    pub fn build_report(&self, now: f64, wall_now: f64) -> Option<Report> {
        let offset = wall_now - now;
        let me = self.my_id.and_then(|id| self.ships.get(&id))?;

        let mut recv_delay = HashMap::new();
        for ship in self.ships.values() {
            if Some(ship.id) != self.my_id {
                recv_delay.insert(ship.id, ship.recv_delay);
            }
        }

        Some(Report {
            name: me.name.clone(),
            state: me.state,
            rotation: me.rotation,
            thrust: me.thrust,
            last_update: me.last_update + offset,
            recv_delay,
            body: (me.state == ShipState::Active).then(|| me.body.snapshot()),
            debris: (me.state == ShipState::Destroyed)
                .then(|| me.debris.iter().map(|d| d.snapshot()).collect()),
            missiles: me.missiles.iter().map(|m| m.snapshot()).collect(),
        })
    }

    /// Merge a peer's report, creating its ship on first sighting.
    ///
    /// Reports are idempotent overwrites: out-of-order application is
    /// last-write-wins by arrival, not by send timestamp.
    pub fn apply_report(&mut self, source: PeerId, report: &Report, now: f64, wall_now: f64) {
        let my_id = match self.my_id {
            Some(id) => id,
            None => return,
        };
        if source == my_id {
            return;
        }

        let ship = self.ships.entry(source).or_insert_with(|| Ship::new(source));
        ship.apply_report(report, my_id, now, wall_now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::missile::Missile;
    use crate::sim::{Body, MISSILE_ARM_MS, MISSILE_LIFETIME_MS};

    fn world(seed: u64) -> World {
        let mut world = World::with_rng("tester".to_string(), false, StdRng::seed_from_u64(seed));
        world.set_self(1, 0.0);
        world
    }

    /// Park the local ship far from the sun with negligible velocity so
    /// physics stays out of a scenario's way
    fn park(world: &mut World, x: f64, y: f64) {
        let id = world.my_id().unwrap();
        let ship = world.ships.get_mut(&id).unwrap();
        ship.body = Body {
            x,
            y,
            ..Body::default()
        };
    }

    fn insert_remote(world: &mut World, id: PeerId, now: f64) {
        let mut ship = Ship::new(id);
        ship.state = ShipState::Active;
        ship.last_report = now;
        ship.last_update = now;
        ship.body.x = 10_000.0 + id as f64 * 1000.0;
        world.ships.insert(id, ship);
    }

    #[test]
    fn ship_within_sun_radius_is_destroyed() {
        let mut world = world(1);
        park(&mut world, 20.0, 0.0);
        world.tick(1.0, 1.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Destroyed);
    }

    #[test]
    fn ship_outside_sun_radius_survives() {
        let mut world = world(1);
        park(&mut world, 25.0, 0.0);
        world.tick(1.0, 1.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Active);
    }

    #[test]
    fn unarmed_missile_does_not_kill() {
        let mut world = world(2);
        park(&mut world, 500.0, 0.0);

        insert_remote(&mut world, 2, 0.0);
        let mut missile = Missile::new(Body {
            x: 500.0,
            y: 0.0,
            ..Body::default()
        });
        missile.age = MISSILE_ARM_MS - 10.0;
        world.ships.get_mut(&2).unwrap().missiles.push(missile);

        world.tick(1.0, 1.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Active);
    }

    #[test]
    fn armed_missile_kills() {
        let mut world = world(2);
        park(&mut world, 500.0, 0.0);

        insert_remote(&mut world, 2, 0.0);
        let mut missile = Missile::new(Body {
            x: 500.0,
            y: 0.0,
            ..Body::default()
        });
        missile.age = MISSILE_ARM_MS;
        world.ships.get_mut(&2).unwrap().missiles.push(missile);

        world.tick(1.0, 1.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Destroyed);
    }

    #[test]
    fn eviction_is_strictly_past_the_threshold() {
        let horizon = STALE_REPORTS * KEEPALIVE_MS;
        let mut world = world(3);
        park(&mut world, 500.0, 0.0);

        insert_remote(&mut world, 2, 0.0);
        insert_remote(&mut world, 3, 0.0);
        world.ships.get_mut(&3).unwrap().last_report = -1.0;

        // Peer 2 is exactly at the threshold: retained. Peer 3 is one
        // millisecond past it: evicted.
        let outcome = world.tick(horizon, horizon);
        assert_eq!(outcome.evicted, vec![3]);
        assert!(world.ship(2).is_some());
        assert!(world.ship(3).is_none());
    }

    #[test]
    fn local_ship_is_never_evicted() {
        let mut world = world(3);
        park(&mut world, 500.0, 0.0);
        let outcome = world.tick(STALE_REPORTS * KEEPALIVE_MS * 10.0, 0.0);
        assert!(outcome.evicted.is_empty());
        assert!(world.my_ship().is_some());
    }

    #[test]
    fn colliding_missiles_both_removed() {
        let mut world = world(4);
        park(&mut world, 500.0, 0.0);

        insert_remote(&mut world, 2, 0.0);
        insert_remote(&mut world, 3, 0.0);

        let at = |x: f64| {
            let mut m = Missile::new(Body {
                x,
                y: 2000.0,
                ..Body::default()
            });
            m.age = MISSILE_ARM_MS;
            m
        };
        world.ships.get_mut(&2).unwrap().missiles.push(at(0.0));
        world.ships.get_mut(&3).unwrap().missiles.push(at(5.0));

        world.tick(1.0, 1.0);
        assert!(world.ship(2).unwrap().missiles.is_empty());
        assert!(world.ship(3).unwrap().missiles.is_empty());
    }

    #[test]
    fn expired_missile_removed() {
        let mut world = world(4);
        park(&mut world, 500.0, 0.0);
        insert_remote(&mut world, 2, 0.0);

        let mut missile = Missile::new(Body {
            x: 3000.0,
            ..Body::default()
        });
        missile.age = MISSILE_LIFETIME_MS + 1.0;
        world.ships.get_mut(&2).unwrap().missiles.push(missile);

        world.tick(1.0, 1.0);
        assert!(world.ship(2).unwrap().missiles.is_empty());
    }

    #[test]
    fn report_round_trip_reproduces_ship() {
        let mut sender = world(5);
        park(&mut sender, 400.0, 100.0);
        sender.apply_input(ControlEvent::Thrust(true), 0.0);
        sender.apply_input(ControlEvent::Fire(true), 0.0);
        sender.tick(LAUNCH_COOLDOWN_MS + 1.0, LAUNCH_COOLDOWN_MS + 1.0);
        let report = sender.build_report(600.0, 600.0).unwrap();

        let mut receiver = world(6);
        receiver.apply_report(1, &report, 600.0, 600.0);
        // Receiver id is also 1; reports from our own id are ignored
        assert!(receiver.ship(2).is_none());

        let mut receiver = World::with_rng("rx".to_string(), false, StdRng::seed_from_u64(7));
        receiver.set_self(2, 0.0);
        receiver.apply_report(1, &report, 600.0, 600.0);

        let replica = receiver.ship(1).unwrap();
        let original = sender.my_ship().unwrap();
        assert_eq!(replica.state, original.state);
        assert_eq!(replica.name, original.name);
        assert_eq!(replica.thrust, original.thrust);
        assert_eq!(replica.body, original.body);
        assert_eq!(replica.missiles, original.missiles);
    }

    #[test]
    fn destroyed_report_carries_debris() {
        let mut sender = world(8);
        park(&mut sender, 10.0, 0.0);
        sender.tick(1.0, 1.0);
        assert_eq!(sender.my_ship().unwrap().state, ShipState::Destroyed);

        let report = sender.build_report(2.0, 2.0).unwrap();
        assert!(report.body.is_none());
        assert_eq!(report.debris.as_ref().map(Vec::len), Some(6));

        let mut receiver = World::with_rng("rx".to_string(), false, StdRng::seed_from_u64(9));
        receiver.set_self(2, 0.0);
        receiver.apply_report(1, &report, 2.0, 2.0);

        let replica = receiver.ship(1).unwrap();
        assert_eq!(replica.state, ShipState::Destroyed);
        assert_eq!(replica.debris, sender.my_ship().unwrap().debris);
    }

    #[test]
    fn out_of_order_reports_are_last_write_wins() {
        let mut sender = world(10);
        park(&mut sender, 400.0, 0.0);
        let report_active = sender.build_report(100.0, 100.0).unwrap();

        let id = sender.my_id().unwrap();
        let rng = &mut sender.rng;
        sender.ships.get_mut(&id).unwrap().destroy(rng, 200.0);
        let report_destroyed = sender.build_report(200.0, 200.0).unwrap();

        let mut receiver = World::with_rng("rx".to_string(), false, StdRng::seed_from_u64(11));
        receiver.set_self(2, 0.0);

        // The newer report lands first; applying the older one afterwards
        // still wins. The protocol is not timestamp-ordered.
        receiver.apply_report(1, &report_destroyed, 300.0, 300.0);
        assert_eq!(receiver.ship(1).unwrap().state, ShipState::Destroyed);
        receiver.apply_report(1, &report_active, 301.0, 301.0);
        assert_eq!(receiver.ship(1).unwrap().state, ShipState::Active);
    }

    #[test]
    fn receive_delay_rebases_remote_clock() {
        let mut sender = world(12);
        park(&mut sender, 400.0, 0.0);
        sender.tick(50.0, 1000.0);
        let report = sender.build_report(50.0, 1000.0).unwrap();

        let mut receiver = World::with_rng("rx".to_string(), false, StdRng::seed_from_u64(13));
        receiver.set_self(2, 0.0);
        // Arrives 40ms of wall time later, at local sim time 90
        receiver.apply_report(1, &report, 90.0, 1040.0);

        let replica = receiver.ship(1).unwrap();
        assert!((replica.recv_delay - 40.0).abs() < 1e-9);
        assert!((replica.last_update - 50.0).abs() < 1e-9);
        assert_eq!(replica.recv_timing.stats().0, 40.0);
    }

    #[test]
    fn echoed_delay_feeds_outbound_timing() {
        let mut sender = world(14);
        park(&mut sender, 400.0, 0.0);
        let mut report = sender.build_report(100.0, 100.0).unwrap();
        report.recv_delay.insert(2, 25.0);

        let mut receiver = World::with_rng("rx".to_string(), false, StdRng::seed_from_u64(15));
        receiver.set_self(2, 0.0);
        receiver.apply_report(1, &report, 120.0, 120.0);

        let (min, _, max) = receiver.ship(1).unwrap().send_timing.stats();
        assert_eq!(min, 25.0);
        assert_eq!(max, 25.0);
    }

    #[test]
    fn keepalive_forces_report() {
        let mut world = world(16);
        park(&mut world, 400.0, 0.0);

        let first = world.tick(1.0, 1.0);
        assert!(first.report.is_some());

        let quiet = world.tick(2.0, 2.0);
        assert!(quiet.report.is_none());

        let due = world.tick(1.0 + KEEPALIVE_MS, 1.0 + KEEPALIVE_MS);
        assert!(due.report.is_some());
    }

    #[test]
    fn input_change_triggers_report() {
        let mut world = world(17);
        park(&mut world, 400.0, 0.0);
        world.tick(1.0, 1.0);

        world.apply_input(ControlEvent::RotateLeft(true), 2.0);
        let outcome = world.tick(3.0, 3.0);
        let report = outcome.report.expect("input change must schedule a report");
        assert!(report.rotation < 0.0);
    }

    #[test]
    fn destroyed_ship_respawns_after_delay() {
        let mut world = world(18);
        park(&mut world, 10.0, 0.0);
        world.tick(1.0, 1.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Destroyed);

        world.tick(DESTROYED_MS, DESTROYED_MS);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Destroyed);

        world.tick(1.0 + DESTROYED_MS, 1.0 + DESTROYED_MS);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Active);
    }

    #[test]
    fn observe_only_starts_parked() {
        let mut world =
            World::with_rng("obs".to_string(), true, StdRng::seed_from_u64(19));
        world.set_self(1, 0.0);

        let ship = world.my_ship().unwrap();
        assert_eq!(ship.state, ShipState::Hyperspaced);
        assert_eq!(ship.last_active, 0.0);

        // Never respawns, and never flies after a pause round trip either
        world.tick(HYPERSPACED_MS * 3.0, HYPERSPACED_MS * 3.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Hyperspaced);

        world.apply_input(ControlEvent::Pause, 1.0);
        world.apply_input(ControlEvent::Pause, 2.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Hyperspaced);
    }

    #[test]
    fn observe_toggle_parks_in_hyperspace() {
        let mut world = world(22);
        park(&mut world, 400.0, 0.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Active);

        world.apply_input(ControlEvent::ObserveToggle, 1.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Hyperspaced);

        world.tick(HYPERSPACED_MS * 3.0, HYPERSPACED_MS * 3.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Hyperspaced);
    }

    #[test]
    fn hyperspace_reentry_after_delay() {
        let mut world = world(20);
        park(&mut world, 400.0, 0.0);
        world.apply_input(ControlEvent::Hyperspace, 10.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Hyperspaced);

        world.tick(10.0 + HYPERSPACED_MS - 1.0, 0.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Hyperspaced);

        world.tick(10.0 + HYPERSPACED_MS, 0.0);
        assert_eq!(world.my_ship().unwrap().state, ShipState::Active);
    }

    #[test]
    fn paused_world_does_nothing() {
        let mut world = world(21);
        park(&mut world, 10.0, 0.0);
        world.apply_input(ControlEvent::Pause, 1.0);

        let outcome = world.tick(2.0, 2.0);
        assert!(outcome.report.is_none());
        // Sitting inside the sun, but paused: still active
        assert_eq!(world.my_ship().unwrap().state, ShipState::Active);
    }
}
