//! Encounter configuration and tunable thresholds.
//!
//! Configuration is immutable for the lifetime of an encounter. It is
//! validated once before the controller starts; a validation failure is
//! configuration-fatal.
use std::time::Duration;

use crate::error::ConfigError;
use crate::state::{Point, SignalTable, StyleSet};

/// Health and resource thresholds, all expressed in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThresholdConfig {
    /// Eat when health is at or below this.
    pub eat_health_pct: u8,
    /// Drink a resource restore when resource is at or below this.
    pub restock_resource_pct: u8,
    /// Retreat when health is at or below this and no food remains.
    pub retreat_health_pct: u8,
    /// Refresh a boost when the boosted stat falls under this.
    pub boost_refresh_pct: u8,
    /// Retreat when resource falls under this and no restore remains.
    pub resource_floor_pct: u8,
}

impl ThresholdConfig {
    pub const DEFAULT_EAT_HEALTH_PCT: u8 = 50;
    pub const DEFAULT_RESTOCK_RESOURCE_PCT: u8 = 20;
    pub const DEFAULT_RETREAT_HEALTH_PCT: u8 = 30;
    pub const DEFAULT_BOOST_REFRESH_PCT: u8 = 5;
    pub const DEFAULT_RESOURCE_FLOOR_PCT: u8 = 10;

    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("eat_health_pct", self.eat_health_pct),
            ("restock_resource_pct", self.restock_resource_pct),
            ("retreat_health_pct", self.retreat_health_pct),
            ("boost_refresh_pct", self.boost_refresh_pct),
            ("resource_floor_pct", self.resource_floor_pct),
        ];
        if let Some((name, value)) = named.into_iter().find(|(_, value)| *value > 100) {
            return Err(ConfigError::InvalidThreshold { name, value });
        }
        if self.retreat_health_pct > self.eat_health_pct {
            return Err(ConfigError::RetreatAboveEat {
                retreat: self.retreat_health_pct,
                eat: self.eat_health_pct,
            });
        }
        Ok(())
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            eat_health_pct: Self::DEFAULT_EAT_HEALTH_PCT,
            restock_resource_pct: Self::DEFAULT_RESTOCK_RESOURCE_PCT,
            retreat_health_pct: Self::DEFAULT_RETREAT_HEALTH_PCT,
            boost_refresh_pct: Self::DEFAULT_BOOST_REFRESH_PCT,
            resource_floor_pct: Self::DEFAULT_RESOURCE_FLOOR_PCT,
        }
    }
}

/// Per-encounter configuration read by every stage.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncounterConfig {
    /// Name filter passed to the opponent query.
    pub opponent_name: String,
    /// Tile the agent travels to before fighting.
    pub encounter_area: Point,
    /// The agent has arrived when strictly closer than this to the area.
    pub arrival_radius: u32,
    /// Tile the emergency escape lands on.
    pub safe_location: Point,
    /// Tiles that are always dangerous during an area attack.
    pub static_hazards: Vec<Point>,
    pub enabled_styles: StyleSet,
    /// Keep the offensive posture matching the equipped loadout.
    pub offensive_postures: bool,
    pub signals: SignalTable,
    pub thresholds: ThresholdConfig,

    pub tick_period_ms: u64,
    /// Upper bound for any single dispatched action.
    pub action_timeout_ms: u64,
    /// Upper bound for reaching the safe location after an escape.
    pub retreat_timeout_ms: u64,
    /// Poll interval of bounded wait-for-condition loops.
    pub wait_poll_ms: u64,

    /// World ticks out of combat before a forced re-acquisition.
    pub out_of_combat_ticks: u32,
    /// Consecutive failed attacks before a forced re-acquisition.
    pub failed_attack_limit: u32,
    /// Consecutive unreadable weakness signals before a forced re-acquisition.
    pub weakness_miss_limit: u32,

    /// Health the banking top-up tries to reach before travelling.
    pub top_up_health_pct: u8,
    pub top_up_attempts: u32,
    /// Health under which the agent eats right after a kill.
    pub post_kill_eat_pct: u8,

    /// Seed for the style tie-break; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl EncounterConfig {
    pub const DEFAULT_OPPONENT_NAME: &'static str = "Demonic gorilla";
    pub const DEFAULT_ENCOUNTER_AREA: Point = Point::new(2100, 5643);
    pub const DEFAULT_SAFE_LOCATION: Point = Point::new(2465, 3494);
    pub const DEFAULT_ARRIVAL_RADIUS: u32 = 5;
    pub const DEFAULT_TICK_PERIOD_MS: u64 = 50;
    pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;
    pub const DEFAULT_RETREAT_TIMEOUT_MS: u64 = 5_000;
    pub const DEFAULT_WAIT_POLL_MS: u64 = 100;
    pub const DEFAULT_OUT_OF_COMBAT_TICKS: u32 = 10;
    pub const DEFAULT_FAILED_ATTACK_LIMIT: u32 = 7;
    pub const DEFAULT_WEAKNESS_MISS_LIMIT: u32 = 3;
    pub const DEFAULT_TOP_UP_HEALTH_PCT: u8 = 70;
    pub const DEFAULT_TOP_UP_ATTEMPTS: u32 = 5;
    pub const DEFAULT_POST_KILL_EAT_PCT: u8 = 80;

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn retreat_timeout(&self) -> Duration {
        Duration::from_millis(self.retreat_timeout_ms)
    }

    pub fn wait_poll(&self) -> Duration {
        Duration::from_millis(self.wait_poll_ms)
    }

    /// Checks everything that can be checked without the environment.
    ///
    /// Whether each enabled style has a loadout behind it is verified by the
    /// runtime against the loadout provider.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.opponent_name.trim().is_empty() {
            return Err(ConfigError::MissingOpponentName);
        }
        if self.enabled_styles.is_empty() {
            return Err(ConfigError::NoEnabledStyles);
        }
        for (name, value) in [
            ("tick_period_ms", self.tick_period_ms),
            ("action_timeout_ms", self.action_timeout_ms),
            ("retreat_timeout_ms", self.retreat_timeout_ms),
            ("wait_poll_ms", self.wait_poll_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { name });
            }
        }
        for (name, value) in [
            ("top_up_health_pct", self.top_up_health_pct),
            ("post_kill_eat_pct", self.post_kill_eat_pct),
        ] {
            if value > 100 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        self.thresholds.validate()
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            opponent_name: Self::DEFAULT_OPPONENT_NAME.to_string(),
            encounter_area: Self::DEFAULT_ENCOUNTER_AREA,
            arrival_radius: Self::DEFAULT_ARRIVAL_RADIUS,
            safe_location: Self::DEFAULT_SAFE_LOCATION,
            static_hazards: Vec::new(),
            enabled_styles: StyleSet::MELEE | StyleSet::RANGED,
            offensive_postures: false,
            signals: SignalTable::default(),
            thresholds: ThresholdConfig::default(),
            tick_period_ms: Self::DEFAULT_TICK_PERIOD_MS,
            action_timeout_ms: Self::DEFAULT_ACTION_TIMEOUT_MS,
            retreat_timeout_ms: Self::DEFAULT_RETREAT_TIMEOUT_MS,
            wait_poll_ms: Self::DEFAULT_WAIT_POLL_MS,
            out_of_combat_ticks: Self::DEFAULT_OUT_OF_COMBAT_TICKS,
            failed_attack_limit: Self::DEFAULT_FAILED_ATTACK_LIMIT,
            weakness_miss_limit: Self::DEFAULT_WEAKNESS_MISS_LIMIT,
            top_up_health_pct: Self::DEFAULT_TOP_UP_HEALTH_PCT,
            top_up_attempts: Self::DEFAULT_TOP_UP_ATTEMPTS,
            post_kill_eat_pct: Self::DEFAULT_POST_KILL_EAT_PCT,
            rng_seed: None,
        }
    }
}
