//! Movement Simulation Demo
//!
//! Runs a predicting client and an authoritative server side by side over a
//! simulated link with latency and packet loss, then reports how often the
//! client had to correct itself.
//!
//! ```text
//! cargo run -p movement_sim [settings.ron]
//! RUST_LOG=rewind_netcode=debug cargo run -p movement_sim
//! ```

mod config;
mod link;

use config::{ConfigError, SimConfig};
use link::Link;
use rewind_core::{DeterministicRng, EntityId, InputCommand, StateSnapshot, Tick};
use rewind_movement::{Buttons, KinematicStep, MovementInput, MovementSnapshot, Vec3};
use rewind_netcode::{
    AuthorityDriver, DriverConfig, ReconcileOutcome, ReconciliationDriver, RemoteCommand,
};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const PLAYER: EntityId = EntityId(1);

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "simulation failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Scripted player input, changing every few ticks
struct InputScript {
    rng: DeterministicRng,
    hold: u64,
    current: MovementInput,
}

impl InputScript {
    fn new(seed: u64, hold: u64) -> Self {
        Self {
            rng: DeterministicRng::new(seed ^ 0x5eed),
            hold,
            current: MovementInput::default(),
        }
    }

    fn sample(&mut self, tick: Tick) -> MovementInput {
        if (tick - 1) % self.hold == 0 {
            let mut input = MovementInput::axes(
                self.rng.range_f32(-1.0, 1.0),
                self.rng.range_f32(-1.0, 1.0),
            )
            .turning(self.rng.range_f32(-0.05, 0.05));
            if self.rng.chance(0.3) {
                input = input.pressing(Buttons::SPRINT);
            }
            if self.rng.chance(0.2) {
                input = input.pressing(Buttons::JUMP);
            }
            self.current = input;
        }
        self.current
    }
}

fn run() -> Result<(), ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(Path::new(&path))?,
        None => SimConfig::default(),
    };
    let rate = config.rate()?;
    let one_way = rate.ticks_for(config.latency());
    // The server runs this many ticks behind so commands arrive before their tick
    let lead = one_way + 1;

    let mut driver_config = config.driver.clone();
    let round_trip = DriverConfig::for_round_trip(config.latency() * 2, rate);
    let required = round_trip.history_capacity + lead as usize;
    if driver_config.history_capacity < required {
        warn!(
            configured = driver_config.history_capacity,
            required, "history too short for the link round trip, raising it"
        );
        driver_config = driver_config.with_history_capacity(required);
    }

    let step = KinematicStep {
        dt: rate.delta_seconds(),
        ..config.movement.clone()
    };
    let spawn = MovementSnapshot::spawn(0, Vec3::ZERO);
    let mut client =
        ReconciliationDriver::new(PLAYER, step.clone(), spawn.clone(), driver_config.clone())?;
    let mut server = AuthorityDriver::new(PLAYER, step, spawn, driver_config)?;

    let to_client = client.connect();
    let to_server = server.connect();
    let mut uplink = Link::new("uplink", one_way, config.command_loss, config.seed);
    let downlink_seed = config.seed.wrapping_add(1);
    let mut downlink = Link::new("downlink", one_way, config.snapshot_loss, downlink_seed);
    let mut script = InputScript::new(config.seed, config.input_hold_ticks);

    info!(
        ticks = config.ticks,
        hz = rate.hz(),
        one_way_ticks = one_way,
        command_loss = config.command_loss,
        snapshot_loss = config.snapshot_loss,
        "starting simulation"
    );

    for now in 1..=config.ticks {
        downlink.deliver(now, &to_client);
        for result in client.pump() {
            match result {
                Ok(ReconcileOutcome::Corrected { replayed }) => {
                    debug!(tick = now, replayed, "client corrected");
                }
                Ok(_) => {}
                Err(err) => warn!(tick = now, %err, "reconciliation failed"),
            }
        }

        let input = script.sample(now);
        let predicted = client.tick(Some(input)).tick;
        uplink.send(now, RemoteCommand::new(PLAYER, InputCommand::new(predicted, input)));

        uplink.deliver(now, &to_server);
        server.pump();
        if now > lead {
            server.tick();
            if server.current_tick() % config.snapshot_interval == 0 {
                downlink.send(now, server.outbound());
            }
        }

        if now % rate.hz() as u64 == 0 {
            let latest = client.latest();
            debug!(
                tick = now,
                position = %latest.position,
                confirmed = ?client.confirmed_tick(),
                frames_ahead = client.prediction_frames(),
                "client"
            );
        }
    }

    let client_stats = client.stats();
    let server_stats = server.stats();
    info!(
        sent = uplink.sent(),
        lost = uplink.lost(),
        late = server_stats.late_commands,
        synthesized = server_stats.synthesized_commands,
        "server input"
    );
    info!(
        sent = downlink.sent(),
        lost = downlink.lost(),
        agreed = client_stats.agreed,
        corrected = client_stats.corrected,
        stale = client_stats.stale,
        replayed_ticks = client_stats.replayed_ticks,
        "client reconciliation"
    );

    let tick = server.current_tick();
    match client.history().get(tick) {
        Some(predicted) => {
            let converged = predicted.compare(server.latest(), client.divergence());
            info!(tick, converged, server = %server.latest(), client = %predicted, "final state");
        }
        None => info!(tick, "final server tick already confirmed by the client"),
    }
    Ok(())
}
