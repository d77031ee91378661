//! Short-term memory of an opponent's signals used to disambiguate cycles.
use arrayvec::ArrayVec;

use super::common::{Point, TargetId, Tick};
use super::target::SignalCode;

/// Number of signal codes kept in the ring.
pub const HISTORY_LEN: usize = 8;

/// What changed after feeding one observation into the history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    /// Consecutive world ticks the current code has been seen.
    pub repeat_count: u32,
    /// Tile distance the opponent moved since the previous pass, when known.
    pub moved: Option<u32>,
}

/// Ring of recent signal codes plus the same-signal repeat counter.
///
/// The counter advances at most once per world tick; passes that land on a
/// tick already counted only refresh the movement baseline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MechanicHistory {
    target: Option<TargetId>,
    codes: ArrayVec<SignalCode, HISTORY_LEN>,
    repeat_count: u32,
    last_tick: Option<Tick>,
    last_position: Option<Point>,
}

impl MechanicHistory {
    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    /// Signal codes from oldest to newest.
    pub fn codes(&self) -> &[SignalCode] {
        &self.codes
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feeds the opponent's current signal and position into the history.
    ///
    /// A different `target` than the one being tracked wipes the history first.
    pub fn observe(
        &mut self,
        target: TargetId,
        code: SignalCode,
        tick: Tick,
        position: Point,
    ) -> Observation {
        if self.target != Some(target) {
            self.reset();
            self.target = Some(target);
        }

        if self.last_tick != Some(tick) {
            let repeated = self.codes.last() == Some(&code);
            self.repeat_count = if repeated { self.repeat_count + 1 } else { 1 };
            if self.codes.is_full() {
                self.codes.remove(0);
            }
            self.codes.push(code);
            self.last_tick = Some(tick);
        }

        let moved = self
            .last_position
            .and_then(|previous| previous.distance_to(position));
        self.last_position = Some(position);

        Observation {
            repeat_count: self.repeat_count,
            moved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: SignalCode = SignalCode::IDLE;

    #[test]
    fn repeat_counter_advances_once_per_tick() {
        let mut history = MechanicHistory::default();
        let id = TargetId(1);
        let here = Point::new(5, 5);

        assert_eq!(history.observe(id, IDLE, Tick(1), here).repeat_count, 1);
        assert_eq!(history.observe(id, IDLE, Tick(1), here).repeat_count, 1);
        assert_eq!(history.observe(id, IDLE, Tick(2), here).repeat_count, 2);
        assert_eq!(history.observe(id, SignalCode(7), Tick(3), here).repeat_count, 1);
    }

    #[test]
    fn movement_is_measured_between_passes() {
        let mut history = MechanicHistory::default();
        let id = TargetId(1);

        assert_eq!(history.observe(id, IDLE, Tick(1), Point::new(0, 0)).moved, None);
        assert_eq!(history.observe(id, IDLE, Tick(2), Point::new(0, 2)).moved, Some(2));
        assert_eq!(history.observe(id, IDLE, Tick(3), Point::new(0, 2)).moved, Some(0));
    }

    #[test]
    fn new_target_resets_history() {
        let mut history = MechanicHistory::default();
        history.observe(TargetId(1), IDLE, Tick(1), Point::ORIGIN);
        history.observe(TargetId(1), IDLE, Tick(2), Point::ORIGIN);

        let observation = history.observe(TargetId(2), IDLE, Tick(3), Point::ORIGIN);
        assert_eq!(observation.repeat_count, 1);
        assert_eq!(observation.moved, None);
        assert_eq!(history.codes().len(), 1);
    }

    #[test]
    fn ring_keeps_the_newest_codes() {
        let mut history = MechanicHistory::default();
        for tick in 0..(HISTORY_LEN as u64 + 3) {
            history.observe(TargetId(1), SignalCode(tick as i32), Tick(tick), Point::ORIGIN);
        }
        assert_eq!(history.codes().len(), HISTORY_LEN);
        assert_eq!(history.codes()[0], SignalCode(3));
    }
}
