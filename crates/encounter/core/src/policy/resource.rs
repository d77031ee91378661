//! Resource consumption and the retreat decision.
use arrayvec::ArrayVec;

use crate::config::ThresholdConfig;
use crate::env::{AgentQuery, BoostedStat, ConsumableKind};

/// Agent vitals read once at the start of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vitals {
    pub health_pct: u8,
    pub resource_pct: u8,
    pub combat_boost_pct: u8,
    pub ranged_boost_pct: u8,
    pub has_food: bool,
    pub has_restore: bool,
    pub has_combat_boost: bool,
    pub has_ranged_boost: bool,
}

impl Vitals {
    pub fn read(agent: &dyn AgentQuery) -> Self {
        Self {
            health_pct: agent.health_percent(),
            resource_pct: agent.resource_percent(),
            combat_boost_pct: agent.boosted_stat_percent(BoostedStat::Combat),
            ranged_boost_pct: agent.boosted_stat_percent(BoostedStat::Ranged),
            has_food: agent.has_consumable(ConsumableKind::Food),
            has_restore: agent.has_consumable(ConsumableKind::ResourceRestore),
            has_combat_boost: agent.has_consumable(ConsumableKind::CombatBoost),
            has_ranged_boost: agent.has_consumable(ConsumableKind::RangedBoost),
        }
    }

    fn boost(&self, stat: BoostedStat) -> (u8, bool) {
        match stat {
            BoostedStat::Combat => (self.combat_boost_pct, self.has_combat_boost),
            BoostedStat::Ranged => (self.ranged_boost_pct, self.has_ranged_boost),
        }
    }
}

/// Why the agent has to leave the encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum RetreatCause {
    /// Out of food with health at or under the retreat threshold.
    NoFood,
    /// Out of restores with the resource under its hard floor.
    ResourceDepleted,
}

/// Decision of the resource manager for one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourcePlan {
    /// Abandon the encounter; the rest of the pass is skipped.
    Retreat(RetreatCause),
    /// Items to consume, fire-and-continue. May be empty.
    Consume(ArrayVec<ConsumableKind, 4>),
}

impl ResourcePlan {
    pub fn is_retreat(&self) -> bool {
        matches!(self, Self::Retreat(_))
    }
}

pub fn retreat_cause(vitals: &Vitals, thresholds: &ThresholdConfig) -> Option<RetreatCause> {
    if !vitals.has_food && vitals.health_pct <= thresholds.retreat_health_pct {
        return Some(RetreatCause::NoFood);
    }
    if !vitals.has_restore && vitals.resource_pct < thresholds.resource_floor_pct {
        return Some(RetreatCause::ResourceDepleted);
    }
    None
}

pub fn plan(vitals: &Vitals, thresholds: &ThresholdConfig) -> ResourcePlan {
    if let Some(cause) = retreat_cause(vitals, thresholds) {
        return ResourcePlan::Retreat(cause);
    }

    let mut items = ArrayVec::new();
    if vitals.has_food && vitals.health_pct <= thresholds.eat_health_pct {
        items.push(ConsumableKind::Food);
    }
    if vitals.has_restore && vitals.resource_pct <= thresholds.restock_resource_pct {
        items.push(ConsumableKind::ResourceRestore);
    }
    for stat in [BoostedStat::Combat, BoostedStat::Ranged] {
        let (percent, available) = vitals.boost(stat);
        if available && percent < thresholds.boost_refresh_pct {
            items.push(stat.refreshed_by());
        }
    }
    ResourcePlan::Consume(items)
}

/// Top-up after a kill or while banking: eat under `eat_pct`, restore at the
/// restock threshold. Never retreats.
pub fn top_up(vitals: &Vitals, eat_pct: u8, thresholds: &ThresholdConfig) -> ArrayVec<ConsumableKind, 2> {
    let mut items = ArrayVec::new();
    if vitals.has_food && vitals.health_pct < eat_pct {
        items.push(ConsumableKind::Food);
    }
    if vitals.has_restore && vitals.resource_pct <= thresholds.restock_resource_pct {
        items.push(ConsumableKind::ResourceRestore);
    }
    items
}
