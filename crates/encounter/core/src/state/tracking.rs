//! Positional bookkeeping that feeds the hazard set.
use arrayvec::ArrayVec;

use super::common::{Point, Tick};

/// Number of recent agent positions treated as hazardous.
pub const TRAIL_LEN: usize = 2;

/// Last positions the agent was observed on, newest last.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionTrail {
    positions: ArrayVec<Point, TRAIL_LEN>,
}

impl PositionTrail {
    /// Records `position` unless it repeats the newest entry.
    pub fn record(&mut self, position: Point) {
        if self.positions.last() == Some(&position) {
            return;
        }
        if self.positions.is_full() {
            self.positions.remove(0);
        }
        self.positions.push(position);
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

/// Externally reported impact point with the tick after which it is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Telegraph {
    pub position: Point,
    pub expires_at: Tick,
}

impl Telegraph {
    pub fn new(position: Point, expires_at: Tick) -> Self {
        Self {
            position,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: Tick) -> bool {
        now > self.expires_at
    }
}

/// Pending telegraphs, pruned by expiry and consumed by an evasion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelegraphLog {
    entries: Vec<Telegraph>,
}

impl TelegraphLog {
    /// Adds a telegraph unless it is already stale at `now`.
    pub fn push(&mut self, telegraph: Telegraph, now: Tick) {
        if !telegraph.is_expired(now) {
            self.entries.push(telegraph);
        }
    }

    pub fn prune(&mut self, now: Tick) {
        self.entries.retain(|telegraph| !telegraph.is_expired(now));
    }

    /// Impact points still live at `now`.
    pub fn active(&self, now: Tick) -> impl Iterator<Item = Point> + '_ {
        self.entries
            .iter()
            .filter(move |telegraph| !telegraph.is_expired(now))
            .map(|telegraph| telegraph.position)
    }

    /// Drops every pending telegraph after it has been acted on.
    pub fn consume(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
