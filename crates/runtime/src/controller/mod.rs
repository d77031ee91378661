//! The encounter controller: owns [`EncounterState`] and runs one decision
//! pass at a time.
//!
//! Each pass reads a fresh snapshot through the query collaborators, asks the
//! pure stages in `encounter-core` for decisions, dispatches them with a
//! bounded timeout and commits state only once a dispatch succeeded. Stages
//! absorb their own recoverable failures; only configuration-fatal errors
//! leave a pass and stop the encounter.
mod fighting;
mod preparing;
mod retreat;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info};

use encounter_core::{
    ConfigError, ConsumableKind, DispatchError, EncounterConfig, EncounterPhase, EncounterState,
    Loadout, MechanicPredictor, Point, Posture, PostureSwitch, PostureToggle, RandomSource,
    TargetId,
};

use crate::api::{ControlFlags, ControllerHandle, DispatchResult, Result, RuntimeError};
use crate::env::EncounterEnv;
use crate::events::{ControllerEvent, EventBus, NoticeLog};

/// Observable digest of the encounter, published after every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSummary {
    pub phase: EncounterPhase,
    pub target: Option<TargetId>,
    pub loadout: Option<Loadout>,
    pub defensive: Option<Posture>,
    pub offensive: Option<Loadout>,
    pub kills: u32,
    pub trip_kills: u32,
}

impl EncounterSummary {
    fn of(state: &EncounterState) -> Self {
        Self {
            phase: state.phase,
            target: state.target,
            loadout: state.loadout,
            defensive: state.postures.defensive(),
            offensive: state.postures.offensive(),
            kills: state.kills,
            trip_kills: state.trip_kills,
        }
    }
}

pub struct EncounterController {
    config: EncounterConfig,
    env: EncounterEnv,
    state: EncounterState,
    predictor: MechanicPredictor,
    rng: Box<dyn RandomSource>,
    notices: NoticeLog,
    events: EventBus,
    flags: Arc<ControlFlags>,
    summary: watch::Sender<EncounterSummary>,
}

impl EncounterController {
    pub(crate) fn new(
        config: EncounterConfig,
        env: EncounterEnv,
        rng: Box<dyn RandomSource>,
        events: EventBus,
    ) -> Self {
        let (summary, _) = watch::channel(EncounterSummary::default());
        Self {
            predictor: MechanicPredictor::new(config.signals),
            config,
            env,
            state: EncounterState::default(),
            rng,
            notices: NoticeLog::new(events.clone()),
            events,
            flags: Arc::new(ControlFlags::default()),
            summary,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle::new(
            Arc::clone(&self.flags),
            self.events.clone(),
            self.summary.subscribe(),
        )
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn state(&self) -> &EncounterState {
        &self.state
    }

    pub fn summary(&self) -> EncounterSummary {
        EncounterSummary::of(&self.state)
    }

    pub(crate) fn flags(&self) -> &Arc<ControlFlags> {
        &self.flags
    }

    /// Runs a single decision pass.
    ///
    /// A fatal error moves the encounter to [`EncounterPhase::Stopped`] before
    /// it is returned; every later call fails with
    /// [`RuntimeError::AlreadyStopped`].
    pub async fn step(&mut self) -> Result<()> {
        if self.state.phase.is_stopped() {
            return Err(RuntimeError::AlreadyStopped);
        }
        let result = self.pass().await;
        if let Err(error) = &result
            && error.is_fatal()
        {
            self.stop(error);
        }
        self.publish_summary();
        result
    }

    /// Releases held postures and restores every owned value to its initial
    /// state. Safe to call repeatedly.
    pub async fn shutdown(&mut self) {
        self.release_postures().await;
        self.state.reset();
        self.notices.reset();
        self.flags.set_paused(false);
        self.publish_summary();
        info!(target: "encounter::controller", "Encounter state reset");
    }

    /// Reports a recoverable error once per distinct message.
    pub(crate) fn report(&mut self, error: &RuntimeError) {
        self.notices.report(error);
    }

    async fn pass(&mut self) -> Result<()> {
        self.preflight()?;
        match self.state.phase {
            EncounterPhase::Preparing(step) => self.prepare(step).await,
            EncounterPhase::Traveling => self.travel().await,
            EncounterPhase::Fighting => self.fight().await,
            EncounterPhase::Stopped => Err(RuntimeError::AlreadyStopped),
        }
    }

    /// Checks the references the encounter cannot run without.
    fn preflight(&self) -> Result<()> {
        self.config.validate()?;
        if let Some(loadout) = self
            .config
            .enabled_styles
            .loadouts()
            .find(|&loadout| self.env.loadouts.gear_set(loadout).is_none())
        {
            return Err(ConfigError::MissingLoadout(loadout).into());
        }
        if self.env.loadouts.trip_setup().is_none() {
            return Err(ConfigError::MissingTripSetup.into());
        }
        Ok(())
    }

    fn stop(&mut self, error: &RuntimeError) {
        error!(target: "encounter::controller", error = %error, "Encounter stopped");
        self.notices.report(error);
        self.set_phase(EncounterPhase::Stopped);
        self.events.publish(ControllerEvent::Stopped {
            reason: error.to_string(),
        });
    }

    fn set_phase(&mut self, to: EncounterPhase) {
        let from = self.state.phase;
        if from == to {
            return;
        }
        self.state.phase = to;
        info!(target: "encounter::controller", %from, %to, "Phase changed");
        self.events.publish(ControllerEvent::PhaseChanged { from, to });
    }

    fn publish_summary(&self) {
        let next = EncounterSummary::of(&self.state);
        self.summary.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Logs a recoverable stage failure and carries on; fatal errors propagate.
    fn absorb(&mut self, result: Result<()>) -> Result<()> {
        match result {
            Err(error) if !error.is_fatal() => {
                self.notices.report(&error);
                Ok(())
            }
            other => other,
        }
    }

    /// Awaits a dispatch, bounded by the configured action timeout.
    async fn dispatch<T>(
        &self,
        action: &'static str,
        call: impl Future<Output = DispatchResult<T>>,
    ) -> Result<T> {
        let limit = self.config.action_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(|source| RuntimeError::dispatch(action, source)),
            Err(_) => Err(RuntimeError::dispatch(action, DispatchError::Timeout(limit))),
        }
    }

    /// Polls `ready` until it holds or `limit` expires.
    async fn wait_until(
        &self,
        condition: &'static str,
        limit: Duration,
        ready: impl Fn() -> bool,
    ) -> Result<()> {
        let poll = self.config.wait_poll();
        let waited = tokio::time::timeout(limit, async {
            while !ready() {
                tokio::time::sleep(poll).await;
            }
        })
        .await;
        waited.map_err(|_| RuntimeError::WaitTimeout {
            condition,
            after: limit,
        })
    }

    /// Agent is strictly within the arrival radius of `point`.
    fn is_near(&self, point: Point) -> bool {
        self.env
            .world
            .distance(self.env.agent.position(), point)
            .is_some_and(|distance| distance < self.config.arrival_radius)
    }

    async fn consume(&mut self, kind: ConsumableKind) -> Result<()> {
        self.dispatch("consume item", self.env.actions.consume_item(kind))
            .await?;
        debug!(target: "encounter::resources", item = %kind, "Consumed");
        self.events.publish(ControllerEvent::ItemConsumed { kind });
        Ok(())
    }

    /// Turns `switch.off` off (when the agent still has it on), then
    /// `switch.on` on, and records the result.
    async fn apply_switch(&mut self, switch: PostureSwitch) -> Result<()> {
        if let Some(off) = switch.off {
            if self.env.agent.is_posture_active(off) {
                self.dispatch("posture off", self.env.actions.toggle_posture(off, false))
                    .await?;
            }
            self.state.postures.release(off);
        }
        self.dispatch("posture on", self.env.actions.toggle_posture(switch.on, true))
            .await?;
        self.state.postures.engage(switch.on);
        debug!(
            target: "encounter::posture",
            off = ?switch.off,
            on = %switch.on,
            "Posture switched"
        );
        self.events.publish(ControllerEvent::PostureSwitched {
            off: switch.off,
            on: switch.on,
        });
        Ok(())
    }

    /// Turns off every posture the agent reports as active.
    pub(crate) async fn release_postures(&mut self) {
        let mut released = false;
        for toggle in PostureToggle::ALL {
            if !self.env.agent.is_posture_active(toggle) {
                continue;
            }
            let result = self
                .dispatch("posture off", self.env.actions.toggle_posture(toggle, false))
                .await;
            match result {
                Ok(()) => released = true,
                Err(error) => self.report(&error),
            }
        }
        self.state.postures.clear();
        if released {
            self.events.publish(ControllerEvent::PosturesReleased);
        }
    }
}
