//! Read-only collaborator interfaces the controller observes the world through.
//!
//! Implementations wrap an environment the controller does not own. Every
//! query is a fresh read; the controller takes one snapshot at the start of a
//! pass and re-reads after any blocking wait.
mod rng;

pub use rng::{RandomSource, SeededRandom};

use crate::state::{Point, Posture, PostureToggle, SignalCode, Target, TargetId, Telegraph, Tick};

/// Inventory item categories the controller consumes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ConsumableKind {
    /// Restores health.
    Food,
    /// Restores the posture resource.
    ResourceRestore,
    /// Boosts melee stats.
    CombatBoost,
    /// Boosts ranged stats.
    RangedBoost,
}

/// Stats whose temporary boost the controller keeps topped up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BoostedStat {
    Combat,
    Ranged,
}

impl BoostedStat {
    /// The consumable that refreshes this boost.
    pub const fn refreshed_by(self) -> ConsumableKind {
        match self {
            BoostedStat::Combat => ConsumableKind::CombatBoost,
            BoostedStat::Ranged => ConsumableKind::RangedBoost,
        }
    }
}

/// Queries about the world and the opponents in it.
pub trait WorldQuery: Send + Sync {
    /// Current world tick.
    fn current_tick(&self) -> Tick;

    /// Live opponent instances whose name matches `name_filter`.
    fn find_opponents(&self, name_filter: &str) -> Vec<Target>;

    fn is_alive(&self, target: TargetId) -> bool;

    fn target_position(&self, target: TargetId) -> Option<Point>;

    fn signal_code(&self, target: TargetId) -> Option<SignalCode>;

    /// Posture the opponent currently protects with, when readable.
    fn weakness(&self, target: TargetId) -> Option<Posture>;

    /// Path distance between two tiles; `None` when unreachable.
    fn distance(&self, from: Point, to: Point) -> Option<u32>;

    fn is_walkable(&self, tile: Point) -> bool;
}

/// Queries about the agent the controller pilots.
pub trait AgentQuery: Send + Sync {
    fn health_percent(&self) -> u8;

    fn resource_percent(&self) -> u8;

    /// Remaining boost of `stat` above its base level, in percent.
    fn boosted_stat_percent(&self, stat: BoostedStat) -> u8;

    fn position(&self) -> Point;

    fn is_moving(&self) -> bool;

    fn is_in_combat(&self) -> bool;

    /// Opponent the agent is currently attacking, if any.
    fn engaged_with(&self) -> Option<TargetId>;

    fn has_consumable(&self, kind: ConsumableKind) -> bool;

    fn is_posture_active(&self, toggle: PostureToggle) -> bool;
}

/// Source of externally reported area-attack impact points.
pub trait TelegraphFeed: Send + Sync {
    /// Telegraphs reported since the previous poll. Stale entries are pruned
    /// by the caller.
    fn poll_telegraphs(&self) -> Vec<Telegraph>;
}
