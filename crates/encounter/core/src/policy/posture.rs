//! Posture selection.
//!
//! Both selectors are pure: they compare the wanted posture with what the
//! [`PostureState`] records and what the agent reports as live, and return the
//! switch to dispatch. The runtime commits the switch only after the toggles
//! succeed, so a failed toggle is simply re-selected on the next pass.
use super::predictor::AttackType;
use crate::state::{Loadout, PostureState, PostureSwitch, PostureToggle};

/// Switch needed to protect against `attack`, if any.
///
/// `is_active` reports whether the agent already has a toggle turned on; a
/// posture that is live is never turned on again.
pub fn select_defensive(
    attack: AttackType,
    state: &PostureState,
    is_active: impl Fn(PostureToggle) -> bool,
) -> Option<PostureSwitch> {
    let posture = attack.required_posture()?;
    select(PostureToggle::Protect(posture), state, is_active)
}

/// Switch that keeps the offensive posture matching the equipped `loadout`.
pub fn select_offensive(
    loadout: Option<Loadout>,
    enabled: bool,
    state: &PostureState,
    is_active: impl Fn(PostureToggle) -> bool,
) -> Option<PostureSwitch> {
    if !enabled {
        return None;
    }
    select(PostureToggle::Boost(loadout?), state, is_active)
}

fn select(
    wanted: PostureToggle,
    state: &PostureState,
    is_active: impl Fn(PostureToggle) -> bool,
) -> Option<PostureSwitch> {
    if state.holds(wanted) || is_active(wanted) {
        return None;
    }
    Some(state.switch_to(wanted))
}
