//! Mechanic predictor: classifies an opponent's signal into an attack type.
//!
//! Primary attack codes map directly. Idle or neutral codes fall back to a
//! movement/repeat heuristic: any movement implies a melee follow-up, while a
//! stationary opponent that repeats the same code for exactly three world
//! ticks is about to alternate between its two ranged styles.

use crate::state::{MechanicHistory, Point, Posture, SignalCode, SignalTable, TargetId, Tick};

/// Classified incoming mechanic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AttackType {
    Melee,
    Ranged,
    Magic,
    AreaEffect,
    /// The opponent is changing its own protection.
    PostureSwitchCue,
    #[default]
    None,
}

impl AttackType {
    /// Defensive posture that mitigates this attack, if any.
    pub const fn required_posture(self) -> Option<Posture> {
        match self {
            AttackType::Melee => Some(Posture::Melee),
            AttackType::Ranged => Some(Posture::Ranged),
            AttackType::Magic => Some(Posture::Magic),
            AttackType::AreaEffect | AttackType::PostureSwitchCue | AttackType::None => None,
        }
    }
}

/// Opponent signal observed during one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalObservation {
    pub target: TargetId,
    pub code: SignalCode,
    pub tick: Tick,
    pub position: Point,
}

/// Repeat count at which a stationary opponent alternates ranged styles.
pub const CYCLE_LENGTH: u32 = 3;

/// Stateless classifier; all memory lives in [`MechanicHistory`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MechanicPredictor {
    signals: SignalTable,
}

impl MechanicPredictor {
    pub fn new(signals: SignalTable) -> Self {
        Self { signals }
    }

    /// Classifies `observation`, updating `history` along the way.
    ///
    /// `active` is the defensive posture currently held; it is only read.
    pub fn classify(
        &self,
        history: &mut MechanicHistory,
        observation: SignalObservation,
        active: Option<Posture>,
    ) -> AttackType {
        let tracked = history.observe(
            observation.target,
            observation.code,
            observation.tick,
            observation.position,
        );

        let code = observation.code;
        let table = &self.signals;
        if code == table.magic {
            return AttackType::Magic;
        }
        if code == table.ranged {
            return AttackType::Ranged;
        }
        if code == table.melee {
            return AttackType::Melee;
        }
        if code == table.area_effect {
            return AttackType::AreaEffect;
        }
        if code == table.posture_switch {
            return AttackType::PostureSwitchCue;
        }

        if active == Some(Posture::Melee) {
            return AttackType::None;
        }
        match tracked.moved {
            Some(distance) if distance > 0 => AttackType::Melee,
            Some(_) if tracked.repeat_count == CYCLE_LENGTH => match active {
                Some(Posture::Magic) => AttackType::Ranged,
                Some(Posture::Ranged) => AttackType::Magic,
                _ => AttackType::None,
            },
            _ => AttackType::None,
        }
    }
}
