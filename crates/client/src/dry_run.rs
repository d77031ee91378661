//! Scripted run of the encounter against the sandbox arena.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use encounter_core::{EncounterConfig, Point, Posture, SignalCode, Telegraph, Tick};
use encounter_runtime::{
    Arena, ArenaSetup, ControllerHandle, EncounterEnv, EncounterSummary, Event, Runtime, Topic,
};

use crate::config::ClientConfig;

/// Opponent placements relative to the encounter area, with their weakness.
const OPPONENTS: [(u32, (i32, i32), Posture); 3] = [
    (1, (2, 1), Posture::Magic),
    (2, (-3, 2), Posture::Ranged),
    (3, (4, -2), Posture::Melee),
];

/// Builds an arena around the configured encounter.
pub fn arena(config: &EncounterConfig) -> Arena {
    let arena = Arena::new(ArenaSetup {
        agent_position: config.safe_location,
        safe_location: config.safe_location,
        opponent_name: config.opponent_name.clone(),
        signals: config.signals,
        ..ArenaSetup::default()
    });

    let signals = config.signals;
    let script = vec![
        signals.magic,
        SignalCode::IDLE,
        SignalCode::IDLE,
        SignalCode::IDLE,
        signals.ranged,
        signals.area_effect,
        signals.melee,
        signals.posture_switch,
    ];
    for (id, (dx, dy), weakness) in OPPONENTS {
        let target = arena.spawn_opponent(id, config.encounter_area.offset(dx, dy));
        arena.set_weakness(target, Some(weakness));
        arena.set_script(target, script.clone());
        arena.set_opponent_engagement(target, id == 1, false);
    }
    arena
}

/// Runs the encounter until the tick budget is spent, Ctrl-C, or a fatal
/// error. Returns the summary held just before shutdown.
pub async fn run(config: ClientConfig) -> Result<EncounterSummary> {
    let arena = arena(&config.encounter);
    let runtime = Runtime::builder()
        .config(config.encounter.clone())
        .env(EncounterEnv::from_shared(Arc::new(arena.clone())))
        .build()
        .context("failed to build the encounter runtime")?;
    let handle = runtime.handle();

    for topic in [Topic::Phase, Topic::Combat, Topic::Notice] {
        tokio::spawn(log_events(topic, runtime.subscribe(topic)));
    }
    let world = tokio::spawn(drive_world(
        arena,
        handle.clone(),
        config.dry_run_ticks,
        Duration::from_millis(config.world_tick_ms),
        config.encounter.encounter_area,
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!(target: "encounter::client", "Interrupted");
            handle.shutdown();
        }
        _ = handle_stopped(&handle) => {}
    }

    world.abort();
    let summary = runtime.join().await.context("encounter ended with an error")?;
    info!(
        target: "encounter::client",
        kills = summary.kills,
        phase = %summary.phase,
        "Dry run finished"
    );
    Ok(summary)
}

/// Resolves once the scheduler was asked to stop or reached a terminal phase.
async fn handle_stopped(handle: &ControllerHandle) {
    let mut summary = handle.watch_summary();
    loop {
        if handle.is_shutdown() || summary.borrow().phase.is_stopped() {
            return;
        }
        if summary.changed().await.is_err() {
            return;
        }
    }
}

/// Advances the sandbox world and requests shutdown after `ticks` ticks.
async fn drive_world(
    arena: Arena,
    handle: ControllerHandle,
    ticks: u64,
    period: Duration,
    area: Point,
) {
    let mut interval = tokio::time::interval(period);
    for elapsed in 0..ticks {
        interval.tick().await;
        if handle.is_shutdown() {
            return;
        }
        arena.advance_tick();
        if elapsed % 25 == 24 {
            let now = arena.tick();
            arena.push_telegraph(Telegraph::new(arena.agent_position(), Tick(now.0 + 2)));
            debug!(target: "encounter::client", tick = %now, "Telegraphed impact on the agent");
        }
        if elapsed % 60 == 59 {
            let id = 100 + (elapsed / 60) as u32;
            let target = arena.spawn_opponent(id, area.offset(1, 3));
            arena.set_weakness(target, Some(Posture::Magic));
        }
    }
    info!(target: "encounter::client", ticks, "Tick budget spent");
    handle.shutdown();
}

async fn log_events(topic: Topic, mut events: Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => info!(target: "encounter::events", ?topic, event = ?event.into_inner()),
            Err(RecvError::Lagged(missed)) => {
                warn!(target: "encounter::events", ?topic, missed, "Event log lagged");
            }
            Err(RecvError::Closed) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use encounter_core::{EncounterPhase, WorldQuery};

    use super::*;

    #[test]
    fn arena_places_opponents_around_the_encounter_area() {
        let config = EncounterConfig::default();
        let arena = arena(&config);
        let opponents = arena.find_opponents(&config.opponent_name);
        assert_eq!(opponents.len(), OPPONENTS.len());
        assert!(opponents.iter().all(|opponent| {
            opponent
                .position
                .distance_to(config.encounter_area)
                .is_some_and(|distance| distance <= 4)
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn dry_run_finishes_within_its_tick_budget() {
        let config = ClientConfig {
            encounter: EncounterConfig {
                rng_seed: Some(11),
                ..EncounterConfig::default()
            },
            dry_run_ticks: 40,
            ..ClientConfig::default()
        };

        let summary = run(config).await.expect("dry run completes");
        assert_ne!(summary.phase, EncounterPhase::Stopped);
    }
}
