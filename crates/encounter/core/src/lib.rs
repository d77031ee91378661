//! Deterministic encounter logic shared by the runtime and tooling.
//!
//! `encounter-core` defines the data model of a running encounter, the
//! read-only query interfaces the controller observes the world through, and
//! every per-pass decision stage as a pure function. Nothing in this crate
//! performs I/O or waits; the runtime crate dispatches the decisions.
pub mod config;
pub mod env;
pub mod error;
pub mod policy;
pub mod state;

pub use config::{EncounterConfig, ThresholdConfig};
pub use env::{
    AgentQuery, BoostedStat, ConsumableKind, RandomSource, SeededRandom, TelegraphFeed, WorldQuery,
};
pub use error::{ConfigError, DispatchError, ErrorSeverity, LoadoutError};
pub use policy::{
    Acquisition, AttackType, EvasionOutcome, HazardSet, MechanicPredictor, ResourcePlan,
    RetreatCause, SelectionRule, SignalObservation, Vitals, choose_counter, find_safe_tile,
    kite_step, select_defensive, select_offensive, select_target,
};
pub use state::{
    BankingStep, EncounterPhase, EncounterState, FailureCounters, Loadout, MechanicHistory, Point,
    PositionTrail, Posture, PostureState, PostureSwitch, PostureToggle, SignalCode, SignalTable,
    StyleSet, Target, TargetId, Telegraph, TelegraphLog, Tick,
};
