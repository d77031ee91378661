//! Public runtime API surface.
//!
//! Gathers the types consumers of the runtime crate interact with: the error
//! taxonomy, the collaborator traits they implement, and the handle they use
//! to observe or stop an encounter.

pub mod errors;
pub mod handle;
pub mod providers;

pub use errors::{Result, RuntimeError};
pub use handle::ControllerHandle;
pub use providers::{ActionDispatch, DispatchResult, LoadoutProvider};

pub(crate) use handle::ControlFlags;
