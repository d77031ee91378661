//! Async shell around the deterministic encounter logic.
//!
//! This crate wires the collaborator traits, the controller and the scheduler
//! task into a cohesive runtime API. Consumers embed [`Runtime`] to run an
//! encounter, subscribe to events, and stop it through [`ControllerHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`controller`] runs one decision pass at a time
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`sandbox`] is an in-memory world for dry runs and tests
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod controller;
pub mod env;
pub mod events;
pub mod runtime;
pub mod sandbox;

mod workers;

pub use api::{
    ActionDispatch, ControllerHandle, DispatchResult, LoadoutProvider, Result, RuntimeError,
};
pub use controller::{EncounterController, EncounterSummary};
pub use env::EncounterEnv;
pub use events::{ControllerEvent, Event, EventBus, NoticeLog, Topic};
pub use runtime::{Runtime, RuntimeBuilder};
pub use sandbox::{Arena, ArenaSetup, DispatchRecord};
