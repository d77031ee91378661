//! Common error infrastructure for encounter-core.
//!
//! Errors fall into two buckets: recoverable conditions that are logged and
//! retried on the next pass, and configuration-fatal conditions that stop the
//! encounter. Resource exhaustion is not an error at all; it is handled as a
//! designed retreat.

use std::time::Duration;

use crate::state::Loadout;

/// Severity level of an error, used to decide between retry and stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Logged once and retried on the next pass.
    ///
    /// Examples: missing target, rejected action, expired wait
    Recoverable,

    /// The encounter cannot continue without operator intervention.
    ///
    /// Examples: required loadout not configured, empty enabled-style set
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Invalid or incomplete encounter configuration. Always fatal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no combat style is enabled")]
    NoEnabledStyles,

    #[error("the {0} style is enabled but no {0} loadout is configured")]
    MissingLoadout(Loadout),

    #[error("no trip setup is configured for banking")]
    MissingTripSetup,

    #[error("threshold {name} must be within 0..=100 (got {value})")]
    InvalidThreshold { name: &'static str, value: u8 },

    #[error("retreat health {retreat}% must not exceed eat health {eat}%")]
    RetreatAboveEat { retreat: u8, eat: u8 },

    #[error("opponent name filter is empty")]
    MissingOpponentName,

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },
}

/// Failure reported by an action dispatch collaborator. Always recoverable.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("action rejected: {0}")]
    Rejected(String),

    #[error("inventory is full")]
    InventoryFull,

    #[error("action did not complete within {0:?}")]
    Timeout(Duration),

    #[error("action interface unavailable")]
    Unavailable,
}

/// Failure reported by the loadout provider.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadoutError {
    #[error("gear set for {0} is not configured")]
    Missing(Loadout),

    #[error("trip setup could not be loaded: {0}")]
    LoadFailed(String),

    #[error("inventory is full")]
    InventoryFull,
}

impl LoadoutError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InventoryFull => ErrorSeverity::Recoverable,
            Self::Missing(_) | Self::LoadFailed(_) => ErrorSeverity::Fatal,
        }
    }
}
