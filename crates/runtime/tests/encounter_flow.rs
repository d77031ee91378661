use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use encounter_core::{
    BankingStep, ConfigError, ConsumableKind, DispatchError, EncounterConfig, EncounterPhase,
    Loadout, Point, Posture, PostureToggle, RandomSource, SignalCode, SignalTable, StyleSet,
    TargetId, Telegraph, Tick,
};
use encounter_core::policy::hazard::SEARCH_OFFSETS;
use encounter_runtime::{
    Arena, ArenaSetup, ControllerEvent, DispatchRecord, EncounterController, EncounterEnv, Event,
    Runtime, RuntimeError, Topic,
};
use tokio::sync::broadcast::Receiver;

const AREA: Point = Point::new(0, 0);

/// Always lands on the first counter candidate and counts how often it was asked.
#[derive(Clone, Default)]
struct CountingRandom {
    draws: Arc<AtomicUsize>,
}

impl CountingRandom {
    fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }
}

impl RandomSource for CountingRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws.fetch_add(1, Ordering::SeqCst);
        0.0
    }
}

fn config(enabled_styles: StyleSet) -> EncounterConfig {
    EncounterConfig {
        encounter_area: AREA,
        enabled_styles,
        ..EncounterConfig::default()
    }
}

fn arena() -> Arena {
    Arena::new(ArenaSetup {
        agent_position: AREA,
        trip_ready: true,
        ..ArenaSetup::default()
    })
}

/// Builds a controller and drives it through banking and travel.
async fn fighting(
    config: EncounterConfig,
    arena: &Arena,
    rng: CountingRandom,
) -> EncounterController {
    let mut controller = Runtime::builder()
        .config(config)
        .env(EncounterEnv::from_shared(Arc::new(arena.clone())))
        .random_source(rng)
        .build_controller()
        .expect("valid configuration");

    controller.step().await.expect("banking pass");
    controller.step().await.expect("travel pass");
    assert_eq!(controller.state().phase, EncounterPhase::Fighting);
    arena.clear_log();
    controller
}

fn notices(events: &mut Receiver<Event>) -> Vec<String> {
    let mut messages = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ControllerEvent::Notice { message } = event.into_inner() {
            messages.push(message);
        }
    }
    messages
}

fn equips(log: &[DispatchRecord]) -> usize {
    log.iter()
        .filter(|record| matches!(record, DispatchRecord::EquipLoadout { .. }))
        .count()
}

fn toggles(log: &[DispatchRecord]) -> Vec<(PostureToggle, bool)> {
    log.iter()
        .filter_map(|record| match record {
            DispatchRecord::TogglePosture { toggle, on } => Some((*toggle, *on)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn single_enabled_counter_is_equipped_without_a_draw() {
    let arena = arena();
    let rng = CountingRandom::default();
    let mut controller = fighting(config(StyleSet::MELEE | StyleSet::MAGIC), &arena, rng.clone()).await;
    let id = arena.spawn_opponent(1, Point::new(1, 0));
    arena.set_weakness(id, Some(Posture::Magic));

    controller.step().await.expect("fighting pass");

    assert_eq!(
        arena.dispatch_log(),
        vec![
            DispatchRecord::EquipLoadout {
                loadout: Loadout::Melee,
                gear_set: "melee gear".into(),
            },
            DispatchRecord::Attack(id),
        ]
    );
    assert_eq!(rng.draws(), 0);
    let summary = controller.summary();
    assert_eq!(summary.target, Some(id));
    assert_eq!(summary.loadout, Some(Loadout::Melee));
}

#[tokio::test]
async fn ranged_weakness_with_melee_and_ranged_picks_melee() {
    let arena = arena();
    let rng = CountingRandom::default();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, rng.clone()).await;
    let id = arena.spawn_opponent(1, Point::new(1, 0));
    arena.set_weakness(id, Some(Posture::Ranged));

    controller.step().await.expect("fighting pass");

    assert_eq!(arena.equipped(), Some(Loadout::Melee));
    assert_eq!(rng.draws(), 0);
}

#[tokio::test]
async fn two_enabled_counters_are_split_by_one_draw() {
    let arena = arena();
    let rng = CountingRandom::default();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, rng.clone()).await;
    let id = arena.spawn_opponent(1, Point::new(3, 0));
    arena.set_weakness(id, Some(Posture::Magic));

    controller.step().await.expect("first pass");
    controller.step().await.expect("second pass");

    assert_eq!(rng.draws(), 1);
    assert_eq!(arena.equipped(), Some(Loadout::Ranged));
    assert_eq!(equips(&arena.dispatch_log()), 1);
}

#[tokio::test]
async fn area_attack_moves_to_first_safe_tile() {
    let arena = arena();
    for tile in [Point::new(2, 0), Point::new(-1, 0), Point::new(-2, 0)] {
        arena.block(tile);
    }
    let config = EncounterConfig {
        static_hazards: vec![Point::new(1, 0)],
        ..config(StyleSet::MELEE | StyleSet::RANGED)
    };
    let mut controller = fighting(config, &arena, CountingRandom::default()).await;
    let id = arena.spawn_opponent(1, Point::new(3, 3));
    arena.set_signal(id, SignalTable::default().area_effect);
    let mut combat = controller.handle().subscribe(Topic::Combat);

    controller.step().await.expect("evading pass");

    assert_eq!(
        arena.dispatch_log(),
        vec![DispatchRecord::MoveTo(Point::new(0, 1))]
    );
    assert_eq!(arena.agent_position(), Point::new(0, 1));
    let mut evaded = false;
    while let Ok(event) = combat.try_recv() {
        if let ControllerEvent::Evaded { from, to } = event.into_inner() {
            assert_eq!((from, to), (AREA, Point::new(0, 1)));
            evaded = true;
        }
    }
    assert!(evaded);
}

#[tokio::test]
async fn retreats_for_every_health_at_or_under_threshold_without_food() {
    let retreat_at = EncounterConfig::default().thresholds.retreat_health_pct;
    for health in 0..=retreat_at {
        let arena = arena();
        let mut controller =
            fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
                .await;
        arena.spawn_opponent(1, Point::new(1, 0));
        arena.set_stock(ConsumableKind::Food, 0);
        arena.set_health(health);

        controller.step().await.expect("retreat pass");

        let state = controller.state();
        assert_eq!(state.phase, EncounterPhase::Preparing(BankingStep::AtBank), "health {health}");
        assert_eq!(state.target, None, "health {health}");
        assert!(arena.dispatch_log().contains(&DispatchRecord::Escape));
    }
}

#[tokio::test]
async fn keeps_fighting_just_above_retreat_threshold() {
    let arena = arena();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    arena.spawn_opponent(1, Point::new(1, 0));
    arena.set_stock(ConsumableKind::Food, 0);
    arena.set_health(EncounterConfig::default().thresholds.retreat_health_pct + 1);

    controller.step().await.expect("fighting pass");

    assert_eq!(controller.state().phase, EncounterPhase::Fighting);
    assert!(!arena.dispatch_log().contains(&DispatchRecord::Escape));
}

#[tokio::test(start_paused = true)]
async fn retreat_completes_even_when_safety_is_not_reached() {
    let arena = arena();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    arena.spawn_opponent(1, Point::new(1, 0));
    arena.set_stock(ConsumableKind::ResourceRestore, 0);
    arena.set_resource(0);
    arena.set_escape_lands(false);

    let result = controller.step().await;

    assert!(matches!(result, Err(RuntimeError::WaitTimeout { .. })));
    assert_eq!(controller.state().phase, EncounterPhase::INITIAL);
    assert!(!controller.handle().is_paused());
}

#[tokio::test]
async fn repeated_magic_signal_toggles_protection_once() {
    let arena = arena();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    let id = arena.spawn_opponent(1, Point::new(3, 0));
    arena.set_signal(id, SignalTable::default().magic);

    for _ in 0..4 {
        controller.step().await.expect("fighting pass");
        arena.advance_tick();
    }

    assert_eq!(
        toggles(&arena.dispatch_log()),
        vec![(PostureToggle::Protect(Posture::Magic), true)]
    );
    assert_eq!(arena.active_postures(), vec![PostureToggle::Protect(Posture::Magic)]);
}

#[tokio::test]
async fn stationary_idle_cycle_switches_protection_on_third_tick() {
    let arena = arena();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    let id = arena.spawn_opponent(1, Point::new(3, 0));
    let magic = SignalTable::default().magic;
    arena.set_script(
        id,
        vec![magic, SignalCode::IDLE, SignalCode::IDLE, SignalCode::IDLE],
    );

    controller.step().await.expect("magic pass");
    for _ in 0..2 {
        arena.advance_tick();
        controller.step().await.expect("idle pass");
        assert_eq!(controller.summary().defensive, Some(Posture::Magic));
    }
    arena.advance_tick();
    controller.step().await.expect("third idle pass");

    assert_eq!(controller.summary().defensive, Some(Posture::Ranged));
    assert_eq!(
        toggles(&arena.dispatch_log()),
        vec![
            (PostureToggle::Protect(Posture::Magic), true),
            (PostureToggle::Protect(Posture::Magic), false),
            (PostureToggle::Protect(Posture::Ranged), true),
        ]
    );
}

#[tokio::test]
async fn missing_loadout_stops_the_encounter() {
    let arena = arena();
    arena.remove_gear_set(Loadout::Ranged);
    let mut controller = Runtime::builder()
        .config(config(StyleSet::MELEE | StyleSet::RANGED))
        .env(EncounterEnv::from_shared(Arc::new(arena.clone())))
        .build_controller()
        .expect("configuration itself is valid");
    let mut phases = controller.handle().subscribe(Topic::Phase);

    let first = controller.step().await;
    assert!(matches!(
        first,
        Err(RuntimeError::Config(ConfigError::MissingLoadout(Loadout::Ranged)))
    ));
    assert_eq!(controller.state().phase, EncounterPhase::Stopped);
    assert!(matches!(
        controller.step().await,
        Err(RuntimeError::AlreadyStopped)
    ));
    assert!(arena.dispatch_log().is_empty());

    let mut stopped = false;
    while let Ok(event) = phases.try_recv() {
        stopped |= matches!(event.into_inner(), ControllerEvent::Stopped { .. });
    }
    assert!(stopped);
}

#[tokio::test]
async fn full_inventory_is_cleared_by_eating_before_equipping_again() {
    let arena = arena();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    let id = arena.spawn_opponent(1, Point::new(1, 0));
    arena.set_weakness(id, Some(Posture::Ranged));
    arena.fail_next_equip(DispatchError::InventoryFull);
    let food = arena.stock(ConsumableKind::Food);

    controller.step().await.expect("fighting pass");

    let equip = DispatchRecord::EquipLoadout {
        loadout: Loadout::Melee,
        gear_set: "melee gear".into(),
    };
    assert_eq!(
        arena.dispatch_log(),
        vec![
            equip.clone(),
            DispatchRecord::Consume(ConsumableKind::Food),
            equip,
            DispatchRecord::Attack(id),
        ]
    );
    assert_eq!(arena.stock(ConsumableKind::Food), food - 1);
    assert_eq!(controller.summary().loadout, Some(Loadout::Melee));
}

#[tokio::test]
async fn dead_target_is_counted_and_followed_by_a_top_up() {
    let arena = arena();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    let id = arena.spawn_opponent(1, Point::new(1, 0));
    let mut combat = controller.handle().subscribe(Topic::Combat);

    controller.step().await.expect("engaging pass");
    arena.kill(id);
    arena.set_health(60);
    let result = controller.step().await;

    assert!(matches!(result, Err(RuntimeError::NoTarget { .. })));
    let summary = controller.summary();
    assert_eq!(summary.kills, 1);
    assert_eq!(summary.trip_kills, 1);
    assert_eq!(summary.target, None);
    assert!(
        arena
            .dispatch_log()
            .contains(&DispatchRecord::Consume(ConsumableKind::Food))
    );

    let mut lost = None;
    while let Ok(event) = combat.try_recv() {
        if let ControllerEvent::TargetLost { target, killed } = event.into_inner() {
            lost = Some((target, killed));
        }
    }
    assert_eq!(lost, Some((TargetId(1), true)));
}

#[tokio::test]
async fn ranged_loadout_steps_out_of_melee_reach() {
    let arena = arena();
    let mut controller = fighting(config(StyleSet::RANGED), &arena, CountingRandom::default()).await;
    let id = arena.spawn_opponent(1, Point::new(1, 0));
    arena.set_weakness(id, Some(Posture::Melee));

    controller.step().await.expect("equipping pass");
    assert_eq!(arena.equipped(), Some(Loadout::Ranged));
    arena.clear_log();

    arena.set_signal(id, SignalTable::default().ranged);
    controller.step().await.expect("kiting pass");

    assert!(
        arena
            .dispatch_log()
            .contains(&DispatchRecord::MoveTo(Point::new(-2, 0)))
    );
    assert_eq!(arena.agent_position(), Point::new(-2, 0));
}

#[tokio::test]
async fn posture_switch_cue_keeps_an_unchanged_weakness() {
    let arena = arena();
    let rng = CountingRandom::default();
    let mut controller = fighting(config(StyleSet::all()), &arena, rng.clone()).await;
    let id = arena.spawn_opponent(1, Point::new(3, 0));
    arena.set_weakness(id, Some(Posture::Ranged));

    controller.step().await.expect("equipping pass");
    assert_eq!(rng.draws(), 1);
    let equipped = arena.equipped();

    arena.set_signal(id, SignalTable::default().posture_switch);
    arena.advance_tick();
    controller.step().await.expect("cue pass");

    assert_eq!(rng.draws(), 1);
    assert_eq!(equips(&arena.dispatch_log()), 1);
    assert_eq!(arena.equipped(), equipped);
    assert_eq!(controller.state().observed_weakness, Some(Posture::Ranged));
}

#[tokio::test]
async fn telegraphed_impact_is_avoided_when_evading() {
    let arena = arena();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    let id = arena.spawn_opponent(1, Point::new(3, 3));
    arena.set_signal(id, SignalTable::default().area_effect);
    arena.push_telegraph(Telegraph::new(Point::new(1, 0), Tick(5)));

    controller.step().await.expect("evading pass");

    assert_eq!(
        arena.dispatch_log(),
        vec![DispatchRecord::MoveTo(Point::new(2, 0))]
    );
}

#[tokio::test]
async fn expired_telegraph_is_ignored() {
    let arena = arena();
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    arena.advance_tick();
    let id = arena.spawn_opponent(1, Point::new(3, 3));
    arena.set_signal(id, SignalTable::default().area_effect);
    arena.push_telegraph(Telegraph::new(Point::new(1, 0), Tick(0)));

    controller.step().await.expect("evading pass");

    assert_eq!(
        arena.dispatch_log(),
        vec![DispatchRecord::MoveTo(Point::new(1, 0))]
    );
}

#[tokio::test]
async fn boxed_in_agent_takes_the_hit_and_keeps_fighting() {
    let arena = arena();
    for (dx, dy) in SEARCH_OFFSETS {
        arena.block(AREA.offset(dx, dy));
    }
    let mut controller =
        fighting(config(StyleSet::MELEE | StyleSet::RANGED), &arena, CountingRandom::default())
            .await;
    let id = arena.spawn_opponent(1, Point::new(3, 3));
    arena.set_signal(id, SignalTable::default().area_effect);
    let mut notice_events = controller.handle().subscribe(Topic::Notice);

    controller.step().await.expect("first pass");
    controller.step().await.expect("second pass");

    assert_eq!(arena.dispatch_log(), vec![DispatchRecord::Attack(id)]);
    assert_eq!(arena.agent_position(), AREA);
    let boxed_in = notices(&mut notice_events)
        .into_iter()
        .filter(|message| message.contains("no safe tile"))
        .count();
    assert_eq!(boxed_in, 1);
}

#[tokio::test]
async fn idle_encounter_area_sends_the_agent_travelling_again() {
    let arena = arena();
    let config = config(StyleSet::MELEE | StyleSet::RANGED);
    let limit = config.out_of_combat_ticks;
    let mut controller = fighting(config, &arena, CountingRandom::default()).await;
    let mut notice_events = controller.handle().subscribe(Topic::Notice);

    for pass in 1..limit {
        let result = controller.step().await;
        assert!(
            matches!(result, Err(RuntimeError::NoTarget { .. })),
            "pass {pass}"
        );
        assert_eq!(controller.state().counters.out_of_combat_ticks, pass);
        arena.advance_tick();
    }
    controller.step().await.expect("giving up on the area");

    assert_eq!(controller.state().phase, EncounterPhase::Traveling);
    assert_eq!(controller.state().counters.out_of_combat_ticks, 0);
    assert!(
        notices(&mut notice_events)
            .iter()
            .any(|message| message.contains("nothing left to fight"))
    );
}

#[tokio::test]
async fn rejected_attacks_force_reacquisition_at_the_limit() {
    let arena = arena();
    let config = config(StyleSet::MELEE | StyleSet::RANGED);
    let limit = config.failed_attack_limit;
    let mut controller = fighting(config, &arena, CountingRandom::default()).await;
    let id = arena.spawn_opponent(1, Point::new(1, 0));
    arena.set_weakness(id, Some(Posture::Ranged));
    arena.set_attacks_rejected(true);

    for _ in 0..limit {
        controller.step().await.expect("rejections are absorbed");
    }
    assert_eq!(controller.state().counters.failed_attacks, limit);

    controller.step().await.expect("forced pass");

    assert_eq!(controller.state().counters.failed_attacks, 1);
    assert_eq!(controller.state().target, Some(id));
    let attacks = arena
        .dispatch_log()
        .into_iter()
        .filter(|record| *record == DispatchRecord::Attack(id))
        .count();
    assert_eq!(attacks, limit as usize + 1);
}

#[tokio::test]
async fn missing_weakness_forces_reacquisition_at_the_limit() {
    let arena = arena();
    let config = config(StyleSet::MELEE | StyleSet::RANGED);
    let limit = config.weakness_miss_limit;
    let mut controller = fighting(config, &arena, CountingRandom::default()).await;
    let id = arena.spawn_opponent(1, Point::new(1, 0));

    for _ in 0..limit {
        controller.step().await.expect("fighting pass");
        arena.advance_tick();
    }
    assert_eq!(controller.state().counters.weakness_misses, limit);

    controller.step().await.expect("forced pass");

    assert_eq!(controller.state().counters.weakness_misses, 1);
    assert_eq!(controller.state().target, Some(id));
    assert_eq!(equips(&arena.dispatch_log()), 0);
}

#[tokio::test]
async fn offensive_posture_follows_the_equipped_loadout() {
    let arena = arena();
    let config = EncounterConfig {
        offensive_postures: true,
        ..config(StyleSet::MELEE | StyleSet::RANGED)
    };
    let mut controller = fighting(config, &arena, CountingRandom::default()).await;
    let id = arena.spawn_opponent(1, Point::new(3, 0));
    arena.set_weakness(id, Some(Posture::Ranged));

    controller.step().await.expect("melee pass");
    assert_eq!(controller.summary().offensive, Some(Loadout::Melee));

    arena.set_weakness(id, Some(Posture::Melee));
    arena.advance_tick();
    controller.step().await.expect("ranged pass");

    assert_eq!(arena.equipped(), Some(Loadout::Ranged));
    assert_eq!(controller.summary().offensive, Some(Loadout::Ranged));
    assert_eq!(
        toggles(&arena.dispatch_log()),
        vec![
            (PostureToggle::Boost(Loadout::Melee), true),
            (PostureToggle::Boost(Loadout::Melee), false),
            (PostureToggle::Boost(Loadout::Ranged), true),
        ]
    );
    assert_eq!(arena.active_postures(), vec![PostureToggle::Boost(Loadout::Ranged)]);
}
