//! In-memory arena implementing every collaborator.
//!
//! The arena is deterministic: nothing happens until a dispatch mutates it or
//! [`Arena::advance_tick`] moves the world forward. It backs the client's dry
//! run and the integration tests.
mod arena;

pub use arena::{Arena, ArenaSetup, DispatchRecord};
