//! Hazard set construction and the bounded safe-tile search.
use std::collections::HashSet;

use crate::state::Point;

/// Candidate offsets examined around the agent, in search order.
pub const SEARCH_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (2, 0),
    (-1, 0),
    (-2, 0),
    (0, 1),
    (0, 2),
    (0, -1),
    (0, -2),
];

/// Tiles considered dangerous for the current tick window.
///
/// Built fresh for every evasion and dropped afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HazardSet {
    tiles: HashSet<Point>,
}

impl HazardSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiles(mut self, tiles: impl IntoIterator<Item = Point>) -> Self {
        self.tiles.extend(tiles);
        self
    }

    pub fn with_tile(mut self, tile: Point) -> Self {
        self.tiles.insert(tile);
        self
    }

    pub fn contains(&self, tile: Point) -> bool {
        self.tiles.contains(&tile)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Result of one safe-tile search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvasionOutcome {
    pub safe_tile: Option<Point>,
    /// Number of candidates checked; never more than [`SEARCH_OFFSETS`].
    pub examined: usize,
}

/// Returns the first walkable candidate around `origin` that is not hazardous.
pub fn find_safe_tile(
    origin: Point,
    hazards: &HazardSet,
    is_walkable: impl Fn(Point) -> bool,
) -> EvasionOutcome {
    let mut examined = 0;
    for (dx, dy) in SEARCH_OFFSETS {
        examined += 1;
        let candidate = origin.offset(dx, dy);
        if !hazards.contains(candidate) && is_walkable(candidate) {
            return EvasionOutcome {
                safe_tile: Some(candidate),
                examined,
            };
        }
    }
    EvasionOutcome {
        safe_tile: None,
        examined,
    }
}

/// Distance the agent steps back when kiting.
pub const KITE_DISTANCE: i32 = 2;

/// Tile two steps directly away from `target`, falling back to the axis moves.
///
/// Never returns the agent's or the target's own tile.
pub fn kite_step(
    agent: Point,
    target: Point,
    is_walkable: impl Fn(Point) -> bool,
) -> Option<Point> {
    let away = (
        (agent.x - target.x).signum() * KITE_DISTANCE,
        (agent.y - target.y).signum() * KITE_DISTANCE,
    );
    let fallbacks = [
        (KITE_DISTANCE, 0),
        (-KITE_DISTANCE, 0),
        (0, KITE_DISTANCE),
        (0, -KITE_DISTANCE),
    ];
    std::iter::once(away)
        .chain(fallbacks)
        .filter(|&offset| offset != (0, 0))
        .map(|(dx, dy)| agent.offset(dx, dy))
        .find(|&tile| tile != agent && tile != target && is_walkable(tile))
}
