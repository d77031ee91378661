//! Encounter data model.
//!
//! [`EncounterState`] is the single owner of everything the controller
//! remembers between passes. Opponent snapshots ([`Target`]) are transient and
//! rebuilt from the world every pass; only their identity is stored.
mod common;
mod encounter;
mod history;
mod posture;
mod style;
mod target;
mod tracking;

pub use common::{Point, TargetId, Tick};
pub use encounter::{BankingStep, EncounterPhase, EncounterState, FailureCounters};
pub use history::{HISTORY_LEN, MechanicHistory, Observation};
pub use posture::{PostureState, PostureSwitch};
pub use style::{Loadout, Posture, PostureToggle, StyleSet};
pub use target::{SignalCode, SignalTable, Target};
pub use tracking::{PositionTrail, TRAIL_LEN, Telegraph, TelegraphLog};
