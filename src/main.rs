//! Peer client binary
//!
//! Connects to the relay, joins a room, and runs the engine loop: drain
//! inbound transport events into the world, tick the simulation, broadcast
//! due reports. Control intents arrive as plain text commands on stdin;
//! any richer front end talks over the same channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use gravwell::config::Config;
use gravwell::net::direct::DirectTransport;
use gravwell::net::hub::HubTransport;
use gravwell::net::protocol::{MsgKind, Report};
use gravwell::net::transport::{spawn_event_pump, Transport, TransportEvent};
use gravwell::sim::{ControlEvent, World};
use gravwell::util::time::{wall_millis, SimClock, TICK_INTERVAL_MS};
use gravwell::util::{init_tracing, shutdown_signal};

/// Cadence of the per-peer timing table log (ms)
const DIAG_INTERVAL_MS: f64 = 2000.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    info!("Starting peer client");
    info!(url = %config.relay_url, room = %config.relay_room, "Connecting to relay");

    let (hub, frames) = HubTransport::connect(&config.relay_url, &config.relay_room).await?;

    let (transport, events): (Arc<dyn Transport>, mpsc::Receiver<TransportEvent>) =
        if config.direct_enabled {
            let (direct, events) = DirectTransport::new(hub, frames, config.direct_bind_addr);
            (Arc::new(direct), events)
        } else {
            let (events_tx, events_rx) = mpsc::channel(256);
            spawn_event_pump(frames, events_tx);
            (Arc::new(hub), events_rx)
        };

    let (control_tx, control_rx) = mpsc::channel(64);
    spawn_control_reader(control_tx);

    let world = World::new(config.name.clone(), config.observe_only);

    tokio::select! {
        _ = run_engine(world, transport, events, control_rx) => {
            info!("Relay connection lost");
        }
        _ = shutdown_signal() => {}
    }

    info!("Client shutdown complete");
    Ok(())
}

/// The engine loop. Returns when the transport event stream ends, which
/// means the relay connection is gone.
async fn run_engine(
    mut world: World,
    transport: Arc<dyn Transport>,
    mut events: mpsc::Receiver<TransportEvent>,
    mut controls: mpsc::Receiver<ControlEvent>,
) {
    let clock = SimClock::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_diag = 0.0_f64;

    loop {
        ticker.tick().await;
        let now = clock.now_ms();
        let wall_now = wall_millis();

        // Drain inbound events accumulated since the last tick
        loop {
            match events.try_recv() {
                Ok(event) => handle_event(&mut world, transport.as_ref(), event, now, wall_now),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => return,
            }
        }

        while let Ok(event) = controls.try_recv() {
            world.apply_input(event, now);
        }

        let outcome = world.tick(now, wall_now);

        for id in outcome.evicted {
            transport.drop_peer(id);
        }

        if let Some(report) = outcome.report {
            match serde_json::to_string(&report) {
                Ok(json) => transport.send(MsgKind::Report, &json, None),
                Err(e) => warn!(error = %e, "Failed to encode report"),
            }
        }

        if now - last_diag >= DIAG_INTERVAL_MS {
            last_diag = now;
            log_timing_table(&world, transport.as_ref());
        }
    }
}

fn handle_event(
    world: &mut World,
    transport: &dyn Transport,
    event: TransportEvent,
    now: f64,
    wall_now: f64,
) {
    match event {
        TransportEvent::SelfId(id) => {
            info!(peer_id = %id, "Relay assigned identity");
            world.set_self(id, now);
        }
        TransportEvent::Join(id) => {
            debug!(peer_id = %id, "Peer joined");
        }
        TransportEvent::Quit(id) => {
            info!(peer_id = %id, "Peer quit");
            world.remove_ship(id);
            transport.drop_peer(id);
        }
        TransportEvent::Report { from, payload } => {
            match serde_json::from_str::<Report>(&payload) {
                Ok(report) => world.apply_report(from, &report, now, wall_now),
                Err(e) => warn!(peer_id = %from, error = %e, "Skipping malformed report"),
            }
        }
    }
}

/// Per-peer latency table: min/avg/max of the trailing minute, both ways
fn log_timing_table(world: &World, transport: &dyn Transport) {
    for ship in world.ships() {
        if Some(ship.id) == world.my_id() {
            continue;
        }
        let (out_min, out_avg, out_max) = ship.send_timing.stats();
        let (in_min, in_avg, in_max) = ship.recv_timing.stats();
        debug!(
            peer_id = %ship.id,
            name = %ship.name,
            path = %transport.relay_type(ship.id),
            out_ms = %format!("{}/{}/{}", out_min, out_avg, out_max),
            in_ms = %format!("{}/{}/{}", in_min, in_avg, in_max),
            "Peer timing"
        );
    }
}

/// Read control commands from stdin, one per line
fn spawn_control_reader(control_tx: mpsc::Sender<ControlEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_control(line) {
                Some(event) => {
                    if control_tx.send(event).await.is_err() {
                        break;
                    }
                }
                None => warn!(command = %line, "Unknown control command"),
            }
        }
    });
}

/// `"left"`, `"thrust off"`, `"hyper"` and friends
fn parse_control(line: &str) -> Option<ControlEvent> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?;
    let held = !matches!(parts.next(), Some("off"));

    match command {
        "left" => Some(ControlEvent::RotateLeft(held)),
        "right" => Some(ControlEvent::RotateRight(held)),
        "thrust" => Some(ControlEvent::Thrust(held)),
        "fire" => Some(ControlEvent::Fire(held)),
        "hyper" => Some(ControlEvent::Hyperspace),
        "pause" => Some(ControlEvent::Pause),
        "observe" => Some(ControlEvent::ObserveToggle),
        _ => None,
    }
}
