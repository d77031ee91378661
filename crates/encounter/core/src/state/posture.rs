//! Defensive and offensive posture bookkeeping.
use super::style::{Loadout, Posture, PostureToggle};

/// A single posture change: turn `off` (when something is on) then turn `on`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostureSwitch {
    pub off: Option<PostureToggle>,
    pub on: PostureToggle,
}

/// Currently active defensive and offensive postures.
///
/// Fields are only reachable through the explicit release/engage operations so
/// that toggling stays idempotent: the runtime never turns off a posture this
/// state does not hold, and never turns on one it already holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostureState {
    defensive: Option<Posture>,
    offensive: Option<Loadout>,
}

impl PostureState {
    pub fn defensive(&self) -> Option<Posture> {
        self.defensive
    }

    pub fn offensive(&self) -> Option<Loadout> {
        self.offensive
    }

    pub fn holds(&self, toggle: PostureToggle) -> bool {
        match toggle {
            PostureToggle::Protect(posture) => self.defensive == Some(posture),
            PostureToggle::Boost(loadout) => self.offensive == Some(loadout),
        }
    }

    /// Builds the switch that replaces whatever occupies the slot of `on`.
    pub fn switch_to(&self, on: PostureToggle) -> PostureSwitch {
        let off = match on {
            PostureToggle::Protect(_) => self.defensive.map(PostureToggle::Protect),
            PostureToggle::Boost(_) => self.offensive.map(PostureToggle::Boost),
        };
        PostureSwitch { off, on }
    }

    /// Records that `toggle` was turned off. No-op when it was not held.
    pub fn release(&mut self, toggle: PostureToggle) {
        match toggle {
            PostureToggle::Protect(posture) if self.defensive == Some(posture) => {
                self.defensive = None
            }
            PostureToggle::Boost(loadout) if self.offensive == Some(loadout) => {
                self.offensive = None
            }
            _ => {}
        }
    }

    /// Records that `toggle` was turned on, replacing its slot.
    pub fn engage(&mut self, toggle: PostureToggle) {
        match toggle {
            PostureToggle::Protect(posture) => self.defensive = Some(posture),
            PostureToggle::Boost(loadout) => self.offensive = Some(loadout),
        }
    }

    /// Everything currently held, in the order it should be turned off.
    pub fn active(&self) -> impl Iterator<Item = PostureToggle> {
        self.defensive
            .map(PostureToggle::Protect)
            .into_iter()
            .chain(self.offensive.map(PostureToggle::Boost))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
