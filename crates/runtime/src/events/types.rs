use serde::{Deserialize, Serialize};

use encounter_core::{
    ConsumableKind, EncounterPhase, Loadout, Point, Posture, PostureToggle, RetreatCause,
    SelectionRule, TargetId,
};

use super::bus::Topic;

/// Everything the controller reports while it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControllerEvent {
    PhaseChanged {
        from: EncounterPhase,
        to: EncounterPhase,
    },
    TargetAcquired {
        target: TargetId,
        rule: SelectionRule,
    },
    TargetLost {
        target: TargetId,
        killed: bool,
    },
    PostureSwitched {
        off: Option<PostureToggle>,
        on: PostureToggle,
    },
    PosturesReleased,
    LoadoutEquipped {
        loadout: Loadout,
        weakness: Posture,
    },
    ItemConsumed {
        kind: ConsumableKind,
    },
    /// Dodged an area attack.
    Evaded {
        from: Point,
        to: Point,
    },
    /// Stepped out of melee reach while fighting at range.
    Kited {
        from: Point,
        to: Point,
    },
    Retreated {
        cause: RetreatCause,
    },
    Notice {
        message: String,
    },
    /// Terminal: the encounter hit a fatal error.
    Stopped {
        reason: String,
    },
}

impl ControllerEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::PhaseChanged { .. } | Self::Retreated { .. } | Self::Stopped { .. } => {
                Topic::Phase
            }
            Self::Notice { .. } => Topic::Notice,
            Self::TargetAcquired { .. }
            | Self::TargetLost { .. }
            | Self::PostureSwitched { .. }
            | Self::PosturesReleased
            | Self::LoadoutEquipped { .. }
            | Self::ItemConsumed { .. }
            | Self::Evaded { .. }
            | Self::Kited { .. } => Topic::Combat,
        }
    }
}
