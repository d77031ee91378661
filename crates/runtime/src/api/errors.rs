//! Unified error types surfaced by the runtime API.
//!
//! Every failure carries an [`ErrorSeverity`]: recoverable errors end the
//! current pass and are retried on the next one, fatal errors stop the
//! encounter.
use std::time::Duration;

use thiserror::Error;

use encounter_core::{ConfigError, DispatchError, ErrorSeverity, LoadoutError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{action} failed: {source}")]
    Dispatch {
        action: &'static str,
        #[source]
        source: DispatchError,
    },

    #[error(transparent)]
    Loadout(#[from] LoadoutError),

    #[error("no {name} found nearby")]
    NoTarget { name: String },

    #[error("gave up waiting for {condition} after {after:?}")]
    WaitTimeout {
        condition: &'static str,
        after: Duration,
    },

    #[error("runtime requires an encounter environment before building")]
    MissingEnvironment,

    #[error("scheduler task join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("encounter already stopped")]
    AlreadyStopped,
}

impl RuntimeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config(_) | Self::MissingEnvironment | Self::WorkerJoin(_) | Self::AlreadyStopped => {
                ErrorSeverity::Fatal
            }
            Self::Loadout(error) => error.severity(),
            Self::Dispatch { .. } | Self::NoTarget { .. } | Self::WaitTimeout { .. } => {
                ErrorSeverity::Recoverable
            }
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity().is_fatal()
    }

    pub(crate) fn dispatch(action: &'static str, source: DispatchError) -> Self {
        Self::Dispatch { action, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encounter_core::Loadout;

    #[test]
    fn severity_follows_the_taxonomy() {
        assert!(RuntimeError::from(ConfigError::NoEnabledStyles).is_fatal());
        assert!(RuntimeError::from(LoadoutError::Missing(Loadout::Magic)).is_fatal());
        assert!(!RuntimeError::from(LoadoutError::InventoryFull).is_fatal());
        assert!(!RuntimeError::dispatch("attack", DispatchError::Unavailable).is_fatal());
        assert!(
            !RuntimeError::NoTarget {
                name: "gorilla".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn dispatch_message_names_the_action() {
        let error = RuntimeError::dispatch("equip", DispatchError::InventoryFull);
        assert_eq!(error.to_string(), "equip failed: inventory is full");
    }
}
