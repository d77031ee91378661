//! The Fighting pass: acquisition, resources, prediction, posture, evasion,
//! style and engagement, in that order.
use tracing::{debug, info};

use encounter_core::policy::resource;
use encounter_core::{
    Acquisition, AttackType, ConfigError, ConsumableKind, DispatchError, EncounterPhase,
    HazardSet, Loadout, Point, Posture, ResourcePlan, SignalCode, SignalObservation, Target,
    TargetId, Tick, Vitals, choose_counter, find_safe_tile, kite_step, select_defensive,
    select_offensive, select_target,
};

use super::EncounterController;
use crate::api::{Result, RuntimeError};
use crate::events::ControllerEvent;

impl EncounterController {
    pub(super) async fn fight(&mut self) -> Result<()> {
        let tick = self.env.world.current_tick();
        let fresh_tick = self.state.last_world_tick != Some(tick);
        self.state.last_world_tick = Some(tick);

        let agent_position = self.env.agent.position();
        self.state.trail.record(agent_position);
        for telegraph in self.env.telegraphs.poll_telegraphs() {
            self.state.telegraphs.push(telegraph, tick);
        }
        self.state.telegraphs.prune(tick);

        if fresh_tick {
            self.track_combat();
        }
        let idle_too_long =
            self.state.counters.out_of_combat_ticks >= self.config.out_of_combat_ticks;
        let force = idle_too_long || self.failures_exceeded();
        if force {
            debug!(target: "encounter::targeting", "Forcing re-acquisition");
            self.state.counters = Default::default();
        }

        let target = self.acquire(agent_position, force).await?;

        if self.manage_resources().await? {
            return Ok(());
        }

        let Some(target) = target else {
            if idle_too_long {
                self.notices
                    .notify("nothing left to fight here, heading back to the encounter area");
                self.set_phase(EncounterPhase::Traveling);
                return Ok(());
            }
            return Err(RuntimeError::NoTarget {
                name: self.config.opponent_name.clone(),
            });
        };

        let id = target.id;
        let target_position = self.env.world.target_position(id).unwrap_or(target.position);
        let code = self.env.world.signal_code(id).unwrap_or(target.signal);
        let attack = self.predictor.classify(
            &mut self.state.history,
            SignalObservation {
                target: id,
                code,
                tick,
                position: target_position,
            },
            self.state.postures.defensive(),
        );
        if attack != AttackType::None {
            debug!(target: "encounter::predictor", %id, %code, %attack, "Classified");
        }
        if let Some(switch) = select_defensive(attack, &self.state.postures, |toggle| {
            self.env.agent.is_posture_active(toggle)
        }) {
            let switched = self.apply_switch(switch).await;
            self.absorb(switched)?;
        }

        if attack == AttackType::AreaEffect
            && self.evade(agent_position, target_position, tick).await?
        {
            return Ok(());
        }

        if self.kite_due(code, agent_position, target_position) {
            let kited = self.kite(agent_position, target_position).await;
            self.absorb(kited)?;
        }

        let styled = self.select_style(id, fresh_tick).await;
        self.absorb(styled)?;

        if let Some(switch) = select_offensive(
            self.state.loadout,
            self.config.offensive_postures,
            &self.state.postures,
            |toggle| self.env.agent.is_posture_active(toggle),
        ) {
            let switched = self.apply_switch(switch).await;
            self.absorb(switched)?;
        }

        let engaged = self.engage(id).await;
        self.absorb(engaged)
    }

    fn track_combat(&mut self) {
        let counters = &mut self.state.counters;
        if self.env.agent.is_in_combat() {
            counters.out_of_combat_ticks = 0;
        } else {
            counters.out_of_combat_ticks += 1;
        }
    }

    fn failures_exceeded(&self) -> bool {
        let counters = &self.state.counters;
        counters.failed_attacks >= self.config.failed_attack_limit
            || counters.weakness_misses >= self.config.weakness_miss_limit
    }

    /// Validates the current target against the live world or picks a new one.
    async fn acquire(&mut self, agent_position: Point, force: bool) -> Result<Option<Target>> {
        self.account_for_kill().await;

        let engaged = self.env.agent.engaged_with();
        if let (Some(current), Some(engaged)) = (self.state.target, engaged)
            && current != engaged
        {
            self.notices
                .notify(format!("agent is fighting {engaged}, dropping {current}"));
            self.drop_target(false);
        }

        let candidates = self.env.world.find_opponents(&self.config.opponent_name);
        let acquisition = Acquisition {
            current: self.state.target,
            agent_engaged: engaged,
            agent_position,
            force,
        };
        let selected = select_target(&candidates, acquisition, |from, to| {
            self.env.world.distance(from, to)
        });

        let Some((target, rule)) = selected else {
            self.drop_target(false);
            return Ok(None);
        };
        if self.state.target != Some(target.id) {
            self.drop_target(false);
            self.state.target = Some(target.id);
            info!(target: "encounter::targeting", opponent = %target.id, %rule, "Target acquired");
            self.events.publish(ControllerEvent::TargetAcquired {
                target: target.id,
                rule,
            });
        }
        Ok(Some(target))
    }

    /// Counts the current target as killed once it is no longer alive and
    /// tops up health and resource.
    async fn account_for_kill(&mut self) {
        let Some(current) = self.state.target else {
            return;
        };
        if self.env.world.is_alive(current) {
            return;
        }
        self.state.kills += 1;
        self.state.trip_kills += 1;
        info!(
            target: "encounter::targeting",
            opponent = %current,
            kills = self.state.kills,
            trip_kills = self.state.trip_kills,
            "Target killed"
        );
        self.drop_target(true);

        let vitals = Vitals::read(self.env.agent.as_ref());
        let items = resource::top_up(&vitals, self.config.post_kill_eat_pct, &self.config.thresholds);
        for kind in items {
            if let Err(error) = self.consume(kind).await {
                self.report(&error);
            }
        }
    }

    pub(super) fn drop_target(&mut self, killed: bool) {
        if let Some(target) = self.state.target {
            self.events
                .publish(ControllerEvent::TargetLost { target, killed });
        }
        self.state.clear_target();
    }

    /// Consumes what the vitals call for. Returns `true` after a retreat.
    async fn manage_resources(&mut self) -> Result<bool> {
        let vitals = Vitals::read(self.env.agent.as_ref());
        match resource::plan(&vitals, &self.config.thresholds) {
            ResourcePlan::Retreat(cause) => {
                self.retreat(cause).await?;
                Ok(true)
            }
            ResourcePlan::Consume(items) => {
                for kind in items {
                    let consumed = self.consume(kind).await;
                    self.absorb(consumed)?;
                }
                Ok(false)
            }
        }
    }

    /// Dodges an area attack. Returns `true` when the agent moved, which ends
    /// the pass.
    async fn evade(&mut self, agent: Point, target: Point, tick: Tick) -> Result<bool> {
        let hazards = HazardSet::new()
            .with_tiles(self.config.static_hazards.iter().copied())
            .with_tiles(self.state.trail.positions().iter().copied())
            .with_tile(target)
            .with_tiles(self.state.telegraphs.active(tick));
        let outcome = find_safe_tile(agent, &hazards, |tile| self.env.world.is_walkable(tile));

        let Some(tile) = outcome.safe_tile else {
            self.notices
                .notify(format!("no safe tile next to {agent}, taking the hit"));
            return Ok(false);
        };
        let moved = self.dispatch("evade", self.env.actions.move_to(tile)).await;
        if let Err(error) = moved {
            self.absorb(Err(error))?;
            return Ok(false);
        }
        self.state.telegraphs.consume();
        info!(
            target: "encounter::evasion",
            from = %agent,
            to = %tile,
            examined = outcome.examined,
            hazards = hazards.len(),
            "Dodged area attack"
        );
        self.events.publish(ControllerEvent::Evaded {
            from: agent,
            to: tile,
        });
        Ok(true)
    }

    fn kite_due(&self, code: SignalCode, agent: Point, target: Point) -> bool {
        let signals = &self.config.signals;
        matches!(self.state.loadout, Some(Loadout::Ranged | Loadout::Magic))
            && code != SignalCode::IDLE
            && code != signals.melee
            && code != signals.area_effect
            && self.state.postures.defensive() != Some(Posture::Melee)
            && agent.distance_to(target).is_some_and(|distance| distance <= 1)
    }

    async fn kite(&mut self, agent: Point, target: Point) -> Result<()> {
        let Some(tile) = kite_step(agent, target, |tile| self.env.world.is_walkable(tile)) else {
            return Ok(());
        };
        self.dispatch("kite", self.env.actions.move_to(tile)).await?;
        debug!(target: "encounter::evasion", from = %agent, to = %tile, "Stepped out of melee reach");
        self.events.publish(ControllerEvent::Kited {
            from: agent,
            to: tile,
        });
        Ok(())
    }

    /// Re-evaluates the loadout when the weakness signal changed.
    async fn select_style(&mut self, target: TargetId, fresh_tick: bool) -> Result<()> {
        let Some(weakness) = self.env.world.weakness(target) else {
            if fresh_tick {
                self.state.counters.weakness_misses += 1;
            }
            return Ok(());
        };
        self.state.counters.weakness_misses = 0;
        if self.state.observed_weakness == Some(weakness) {
            return Ok(());
        }

        let Some(loadout) =
            choose_counter(weakness, self.config.enabled_styles, self.rng.as_mut())
        else {
            self.state.observed_weakness = Some(weakness);
            self.notices.notify(format!(
                "no enabled style counters a {weakness} weakness, keeping the current loadout"
            ));
            return Ok(());
        };
        if self.state.loadout != Some(loadout) {
            self.equip(loadout, weakness).await?;
        }
        self.state.observed_weakness = Some(weakness);
        Ok(())
    }

    /// Equips `loadout`; a full inventory is cleared by eating once.
    async fn equip(&mut self, loadout: Loadout, weakness: Posture) -> Result<()> {
        let gear = self
            .env
            .loadouts
            .gear_set(loadout)
            .ok_or(ConfigError::MissingLoadout(loadout))?;
        let first = self
            .dispatch("equip loadout", self.env.actions.equip_loadout(loadout, &gear))
            .await;
        match first {
            Err(RuntimeError::Dispatch {
                source: DispatchError::InventoryFull,
                ..
            }) => {
                self.notices
                    .notify(format!("inventory full while equipping {loadout}, eating first"));
                self.consume(ConsumableKind::Food).await?;
                self.dispatch("equip loadout", self.env.actions.equip_loadout(loadout, &gear))
                    .await?;
            }
            other => other?,
        }

        self.state.loadout = Some(loadout);
        info!(target: "encounter::style", %loadout, %weakness, gear = %gear, "Loadout equipped");
        self.events
            .publish(ControllerEvent::LoadoutEquipped { loadout, weakness });
        Ok(())
    }

    async fn engage(&mut self, target: TargetId) -> Result<()> {
        if self.env.agent.engaged_with() == Some(target) {
            self.state.counters.failed_attacks = 0;
            return Ok(());
        }
        let attacked = self.dispatch("attack", self.env.actions.attack(target)).await;
        match attacked {
            Ok(()) => {
                self.state.counters.failed_attacks = 0;
                Ok(())
            }
            Err(error) => {
                self.state.counters.failed_attacks += 1;
                Err(error)
            }
        }
    }
}
