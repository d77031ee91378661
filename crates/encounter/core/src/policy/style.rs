//! Counter-loadout selection.
use crate::env::RandomSource;
use crate::state::{Loadout, Posture, StyleSet};

/// Counter loadout for `weakness` under the `enabled` styles.
///
/// A single enabled candidate is returned without touching `rng`; two enabled
/// candidates are split with a fair coin. `None` means neither candidate is
/// enabled and the current loadout should be kept.
pub fn choose_counter(
    weakness: Posture,
    enabled: StyleSet,
    rng: &mut dyn RandomSource,
) -> Option<Loadout> {
    let [first, second] = Loadout::counters(weakness);
    match (enabled.allows(first), enabled.allows(second)) {
        (true, true) => Some(if rng.coin_flip() { first } else { second }),
        (true, false) => Some(first),
        (false, true) => Some(second),
        (false, false) => None,
    }
}
