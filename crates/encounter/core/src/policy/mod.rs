//! Decision stages of a Fighting pass.
//!
//! Every stage is a pure function of the pass snapshot and the
//! [`EncounterState`](crate::state::EncounterState). Stages return decisions;
//! the runtime dispatches them and commits the resulting state.
pub mod hazard;
pub mod posture;
pub mod predictor;
pub mod resource;
pub mod style;
pub mod target;

pub use hazard::{EvasionOutcome, HazardSet, KITE_DISTANCE, SEARCH_OFFSETS, find_safe_tile, kite_step};
pub use posture::{select_defensive, select_offensive};
pub use predictor::{AttackType, CYCLE_LENGTH, MechanicPredictor, SignalObservation};
pub use resource::{ResourcePlan, RetreatCause, Vitals};
pub use style::choose_counter;
pub use target::{Acquisition, SelectionRule, select_target};
