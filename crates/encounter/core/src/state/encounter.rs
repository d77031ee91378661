use std::fmt;

use super::common::{TargetId, Tick};
use super::history::MechanicHistory;
use super::posture::PostureState;
use super::style::{Loadout, Posture};
use super::tracking::{PositionTrail, TelegraphLog};

/// Step inside the banking sub-phase of [`EncounterPhase::Preparing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BankingStep {
    #[default]
    AtBank,
    LoadingLoadout,
}

/// Top-level phase of the encounter state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncounterPhase {
    Preparing(BankingStep),
    Traveling,
    Fighting,
    /// Terminal: reached on a configuration-fatal error, never left.
    Stopped,
}

impl EncounterPhase {
    pub const INITIAL: Self = Self::Preparing(BankingStep::AtBank);

    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl Default for EncounterPhase {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for EncounterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparing(BankingStep::AtBank) => f.write_str("preparing (at bank)"),
            Self::Preparing(BankingStep::LoadingLoadout) => {
                f.write_str("preparing (loading loadout)")
            }
            Self::Traveling => f.write_str("traveling"),
            Self::Fighting => f.write_str("fighting"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// Consecutive-failure counters that force a target re-acquisition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FailureCounters {
    pub failed_attacks: u32,
    pub weakness_misses: u32,
    pub out_of_combat_ticks: u32,
}

/// Everything the scheduler owns about the running encounter.
///
/// Mutated only between stage decisions of a single pass; stages receive it
/// by reference and never keep it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncounterState {
    pub phase: EncounterPhase,
    /// Identity of the current opponent. Its snapshot is re-read every pass.
    pub target: Option<TargetId>,
    pub postures: PostureState,
    pub loadout: Option<Loadout>,
    /// Weakness signal the current loadout was chosen for.
    pub observed_weakness: Option<Posture>,
    pub history: MechanicHistory,
    pub trail: PositionTrail,
    pub telegraphs: TelegraphLog,
    pub counters: FailureCounters,
    pub kills: u32,
    pub trip_kills: u32,
    /// World tick seen by the previous Fighting pass.
    pub last_world_tick: Option<Tick>,
}

impl EncounterState {
    /// Forgets the current target and every per-target memory.
    pub fn clear_target(&mut self) {
        self.target = None;
        self.observed_weakness = None;
        self.history.reset();
        self.counters = FailureCounters::default();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Posture, PostureToggle};

    #[test]
    fn reset_restores_initial_values() {
        let mut state = EncounterState {
            phase: EncounterPhase::Fighting,
            target: Some(TargetId(4)),
            kills: 3,
            ..EncounterState::default()
        };
        state
            .postures
            .engage(PostureToggle::Protect(Posture::Melee));

        state.reset();
        assert_eq!(state, EncounterState::default());
        assert_eq!(state.phase, EncounterPhase::INITIAL);
        state.reset();
        assert_eq!(state, EncounterState::default());
    }

    #[test]
    fn clear_target_keeps_kill_counts() {
        let mut state = EncounterState {
            target: Some(TargetId(1)),
            observed_weakness: Some(Posture::Magic),
            kills: 2,
            trip_kills: 1,
            ..EncounterState::default()
        };
        state.counters.failed_attacks = 5;

        state.clear_target();
        assert_eq!(state.target, None);
        assert_eq!(state.observed_weakness, None);
        assert_eq!(state.counters, FailureCounters::default());
        assert_eq!((state.kills, state.trip_kills), (2, 1));
    }
}
