//! Opponent snapshots and the signal codes they emit.
use std::fmt;

use super::common::{Point, TargetId};
use super::style::Posture;

/// Raw, low-level cue emitted by an opponent (an animation id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalCode(pub i32);

impl SignalCode {
    /// Emitted while the opponent is not animating.
    pub const IDLE: Self = Self(-1);
}

impl fmt::Display for SignalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signal codes that carry meaning for the current opponent kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalTable {
    pub posture_switch: SignalCode,
    pub magic: SignalCode,
    pub melee: SignalCode,
    pub ranged: SignalCode,
    pub area_effect: SignalCode,
}

impl Default for SignalTable {
    fn default() -> Self {
        Self {
            posture_switch: SignalCode(7224),
            magic: SignalCode(7225),
            melee: SignalCode(7226),
            ranged: SignalCode(7227),
            area_effect: SignalCode(7228),
        }
    }
}

/// Snapshot of one opponent instance, taken from a live world query.
///
/// Targets are never carried across ticks by value: the controller keeps only
/// the [`TargetId`] and re-reads this snapshot every pass.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    pub id: TargetId,
    pub alive: bool,
    pub position: Point,
    /// Posture the opponent currently protects with, when readable.
    pub weakness: Option<Posture>,
    pub signal: SignalCode,
    /// The opponent is currently attacking the agent.
    pub targeting_agent: bool,
    /// The opponent is engaged with someone (the agent or anybody else).
    pub engaged: bool,
}

impl Target {
    pub fn new(id: TargetId, position: Point) -> Self {
        Self {
            id,
            alive: true,
            position,
            weakness: None,
            signal: SignalCode::IDLE,
            targeting_agent: false,
            engaged: false,
        }
    }
}
