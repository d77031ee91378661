//! Target acquisition among live opponent candidates.
use crate::state::{Point, Target, TargetId};

/// Which selection rule produced the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SelectionRule {
    /// The current target is still alive.
    KeepCurrent,
    /// The agent is attacking this opponent.
    AgentEngaged,
    /// This opponent is attacking the agent.
    TargetingAgent,
    /// Nobody is fighting this opponent.
    Unengaged,
    /// Nearest reachable candidate by path distance.
    Nearest,
}

/// Inputs of one acquisition round.
#[derive(Clone, Copy, Debug)]
pub struct Acquisition {
    pub current: Option<TargetId>,
    pub agent_engaged: Option<TargetId>,
    pub agent_position: Point,
    /// Skip [`SelectionRule::KeepCurrent`].
    pub force: bool,
}

/// Picks the target for this pass from a fresh list of `candidates`.
///
/// Dead candidates and candidates without a path are ignored. `distance`
/// measures the path distance from the agent to a tile.
pub fn select_target(
    candidates: &[Target],
    acquisition: Acquisition,
    distance: impl Fn(Point, Point) -> Option<u32>,
) -> Option<(Target, SelectionRule)> {
    let from = acquisition.agent_position;
    let reachable: Vec<(&Target, u32)> = candidates
        .iter()
        .filter(|candidate| candidate.alive)
        .filter_map(|candidate| distance(from, candidate.position).map(|d| (candidate, d)))
        .collect();

    let by_id = |id: TargetId| reachable.iter().find(|(candidate, _)| candidate.id == id);

    if !acquisition.force
        && let Some(current) = acquisition.current
        && let Some((target, _)) = by_id(current)
    {
        return Some(((*target).clone(), SelectionRule::KeepCurrent));
    }
    if let Some(engaged) = acquisition.agent_engaged
        && let Some((target, _)) = by_id(engaged)
    {
        return Some(((*target).clone(), SelectionRule::AgentEngaged));
    }

    let nearest = |filter: &dyn Fn(&Target) -> bool| {
        reachable
            .iter()
            .filter(|(candidate, _)| filter(candidate))
            .min_by_key(|(candidate, d)| (*d, candidate.id.0))
            .map(|(candidate, _)| (*candidate).clone())
    };

    if let Some(target) = nearest(&|candidate| candidate.targeting_agent) {
        return Some((target, SelectionRule::TargetingAgent));
    }
    if let Some(target) = nearest(&|candidate| !candidate.engaged) {
        return Some((target, SelectionRule::Unengaged));
    }
    nearest(&|_| true).map(|target| (target, SelectionRule::Nearest))
}
