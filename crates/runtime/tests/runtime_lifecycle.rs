use std::sync::Arc;

use encounter_core::{
    AgentQuery, BankingStep, ConfigError, EncounterConfig, EncounterPhase, Loadout, Point,
};
use encounter_runtime::{
    Arena, ArenaSetup, ControllerEvent, EncounterEnv, EncounterSummary, LoadoutProvider, Runtime,
    RuntimeError, Topic,
};

fn runtime_for(arena: &Arena) -> Runtime {
    let config = EncounterConfig {
        encounter_area: Point::new(0, 0),
        rng_seed: Some(7),
        ..EncounterConfig::default()
    };
    Runtime::builder()
        .config(config)
        .env(EncounterEnv::from_shared(Arc::new(arena.clone())))
        .build()
        .expect("runtime builds")
}

fn arena() -> Arena {
    Arena::new(ArenaSetup {
        agent_position: Point::new(0, 0),
        ..ArenaSetup::default()
    })
}

#[tokio::test(start_paused = true)]
async fn runtime_reaches_fighting_and_shuts_down_idempotently() {
    let arena = arena();
    let runtime = runtime_for(&arena);
    let handle = runtime.handle();
    let mut phases = runtime.subscribe(Topic::Phase);

    loop {
        let event = phases.recv().await.expect("phase event");
        if let ControllerEvent::PhaseChanged {
            to: EncounterPhase::Fighting,
            ..
        } = event.into_inner()
        {
            break;
        }
    }

    handle.shutdown();
    handle.shutdown();
    assert!(handle.is_shutdown());

    let summary = runtime.shutdown().await.expect("clean shutdown");
    assert_eq!(summary.phase, EncounterPhase::Fighting);
    assert_eq!(handle.summary(), EncounterSummary::default());
    assert!(arena.active_postures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn banking_loads_the_trip_setup_before_travel() {
    let arena = arena();
    arena.set_health(40);
    let runtime = runtime_for(&arena);
    let mut phases = runtime.subscribe(Topic::Phase);

    let mut seen = Vec::new();
    while seen.last() != Some(&EncounterPhase::Fighting) {
        if let ControllerEvent::PhaseChanged { to, .. } =
            phases.recv().await.expect("phase event").into_inner()
        {
            seen.push(to);
        }
    }
    runtime.shutdown().await.expect("clean shutdown");

    assert_eq!(
        seen,
        vec![
            EncounterPhase::Preparing(BankingStep::LoadingLoadout),
            EncounterPhase::Traveling,
            EncounterPhase::Fighting,
        ]
    );
    assert!(arena.trip_setup_matches());
    assert!(arena.health_percent() >= EncounterConfig::DEFAULT_TOP_UP_HEALTH_PCT);
}

#[tokio::test(start_paused = true)]
async fn fatal_error_ends_the_runtime() {
    let arena = arena();
    arena.remove_gear_set(Loadout::Melee);
    let runtime = runtime_for(&arena);
    let handle = runtime.handle();

    let result = runtime.join().await;

    assert!(matches!(
        result,
        Err(RuntimeError::Config(ConfigError::MissingLoadout(Loadout::Melee)))
    ));
    assert_eq!(handle.summary().phase, EncounterPhase::Stopped);
}

#[tokio::test]
async fn builder_requires_an_environment() {
    let result = Runtime::builder().build_controller();
    assert!(matches!(result, Err(RuntimeError::MissingEnvironment)));
}
