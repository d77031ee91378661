//! Asynchronous collaborators that act on the environment.
//!
//! Queries are synchronous and live in `encounter-core`; everything that
//! changes the world goes through these traits so the runtime can bound each
//! call with a timeout.
use async_trait::async_trait;

use encounter_core::{ConsumableKind, DispatchError, Loadout, LoadoutError, Point, PostureToggle, TargetId};

pub type DispatchResult<T = ()> = std::result::Result<T, DispatchError>;

/// Side effects the controller issues against the environment.
#[async_trait]
pub trait ActionDispatch: Send + Sync {
    async fn toggle_posture(&self, toggle: PostureToggle, on: bool) -> DispatchResult;

    /// Equips the concrete gear set resolved for `loadout`.
    async fn equip_loadout(&self, loadout: Loadout, gear_set: &str) -> DispatchResult;

    /// Fast re-path to an adjacent tile.
    async fn move_to(&self, tile: Point) -> DispatchResult;

    async fn consume_item(&self, kind: ConsumableKind) -> DispatchResult;

    /// Emergency teleport towards the configured safe location.
    async fn escape_to_safety(&self) -> DispatchResult;

    async fn attack(&self, target: TargetId) -> DispatchResult;

    /// Walks towards `destination`. Returns `true` once it has been reached.
    async fn travel_to(&self, destination: Point) -> DispatchResult<bool>;
}

/// Resolves loadouts to gear and prepares the agent between trips.
#[async_trait]
pub trait LoadoutProvider: Send + Sync {
    /// Name of the gear set bound to `loadout`, if one is configured.
    fn gear_set(&self, loadout: Loadout) -> Option<String>;

    /// Name of the inventory/equipment setup loaded before each trip.
    fn trip_setup(&self) -> Option<String>;

    /// The agent already carries the trip setup.
    fn trip_setup_matches(&self) -> bool;

    async fn open_bank(&self) -> DispatchResult;

    async fn load_trip_setup(&self) -> std::result::Result<(), LoadoutError>;

    async fn close_bank(&self) -> DispatchResult;
}
