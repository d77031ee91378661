//! Banking and travel between trips.
use tracing::{debug, info};

use encounter_core::{BankingStep, ConsumableKind, DispatchError, EncounterPhase, FailureCounters};

use super::EncounterController;
use crate::api::{Result, RuntimeError};

impl EncounterController {
    pub(super) async fn prepare(&mut self, step: BankingStep) -> Result<()> {
        match step {
            BankingStep::AtBank => self.at_bank().await,
            BankingStep::LoadingLoadout => self.load_trip().await,
        }
    }

    async fn at_bank(&mut self) -> Result<()> {
        if self.env.loadouts.trip_setup_matches() {
            debug!(target: "encounter::banking", "Trip setup already carried");
            self.set_phase(EncounterPhase::Traveling);
            return Ok(());
        }
        self.dispatch("open bank", self.env.loadouts.open_bank())
            .await?;
        self.set_phase(EncounterPhase::Preparing(BankingStep::LoadingLoadout));
        Ok(())
    }

    async fn load_trip(&mut self) -> Result<()> {
        let limit = self.config.action_timeout();
        match tokio::time::timeout(limit, self.env.loadouts.load_trip_setup()).await {
            Ok(loaded) => loaded?,
            Err(_) => {
                return Err(RuntimeError::dispatch(
                    "load trip setup",
                    DispatchError::Timeout(limit),
                ));
            }
        }
        let setup = self.env.loadouts.trip_setup().unwrap_or_default();
        info!(target: "encounter::banking", %setup, "Trip setup loaded");

        self.top_up_health().await;
        self.dispatch("close bank", self.env.loadouts.close_bank())
            .await?;
        self.set_phase(EncounterPhase::Traveling);
        Ok(())
    }

    /// Eats until health reaches the top-up target, a bounded number of times.
    async fn top_up_health(&mut self) {
        let target = self.config.top_up_health_pct;
        for _ in 0..self.config.top_up_attempts {
            if self.env.agent.health_percent() >= target
                || !self.env.agent.has_consumable(ConsumableKind::Food)
            {
                break;
            }
            if let Err(error) = self.consume(ConsumableKind::Food).await {
                self.report(&error);
                break;
            }
        }

        let agent = &self.env.agent;
        if agent.resource_percent() <= self.config.thresholds.restock_resource_pct
            && agent.has_consumable(ConsumableKind::ResourceRestore)
            && let Err(error) = self.consume(ConsumableKind::ResourceRestore).await
        {
            self.report(&error);
        }
    }

    pub(super) async fn travel(&mut self) -> Result<()> {
        let area = self.config.encounter_area;
        if !self.is_near(area) {
            let arrived = self
                .dispatch("travel", self.env.actions.travel_to(area))
                .await?;
            if !arrived && !self.is_near(area) {
                debug!(target: "encounter::travel", %area, "Still on the way");
                return Ok(());
            }
        }
        self.state.counters = FailureCounters::default();
        self.state.last_world_tick = None;
        self.set_phase(EncounterPhase::Fighting);
        Ok(())
    }
}
