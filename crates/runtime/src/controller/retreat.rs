//! Retreat: the designed exit when resources run out.
use tracing::warn;

use encounter_core::{EncounterPhase, RetreatCause};

use super::EncounterController;
use crate::api::Result;
use crate::events::ControllerEvent;

impl EncounterController {
    /// Abandons the encounter and returns to [`EncounterPhase::INITIAL`].
    ///
    /// The phase transition happens even when the escape fails or the safe
    /// location is not reached in time; that failure is returned afterwards
    /// as a recoverable error.
    pub(super) async fn retreat(&mut self, cause: RetreatCause) -> Result<()> {
        warn!(
            target: "encounter::retreat",
            %cause,
            health = self.env.agent.health_percent(),
            resource = self.env.agent.resource_percent(),
            "Retreating"
        );
        self.drop_target(false);
        self.state.trip_kills = 0;
        self.flags.set_paused(true);

        let escaped = self.escape().await;

        self.release_postures().await;
        self.state.telegraphs.consume();
        self.state.trail.clear();
        self.flags.set_paused(false);
        self.set_phase(EncounterPhase::INITIAL);
        self.events.publish(ControllerEvent::Retreated { cause });
        escaped
    }

    async fn escape(&mut self) -> Result<()> {
        self.dispatch("escape", self.env.actions.escape_to_safety())
            .await?;
        let safe = self.config.safe_location;
        self.wait_until("safe location", self.config.retreat_timeout(), || {
            self.is_near(safe)
        })
        .await
    }
}
