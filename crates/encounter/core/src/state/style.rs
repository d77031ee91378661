//! Combat style vocabulary: defensive postures, offensive loadouts, and the
//! enabled-style set supplied by configuration.

use std::fmt;

use bitflags::bitflags;

/// Defensive posture mitigating one incoming attack style.
///
/// The same vocabulary describes an opponent's *weakness signal*: the posture
/// the opponent currently holds tells which style it is protected against.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Posture {
    Magic,
    Ranged,
    Melee,
}

/// Offensive equipment configuration. The controller only holds the enum; the
/// concrete gear set behind it is resolved by the loadout provider.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Loadout {
    Melee,
    Ranged,
    Magic,
}

impl Loadout {
    /// The two loadouts that bypass an opponent protecting against `weakness`,
    /// in tie-break order (the first wins a coin flip that lands heads).
    pub const fn counters(weakness: Posture) -> [Loadout; 2] {
        match weakness {
            Posture::Ranged => [Loadout::Melee, Loadout::Magic],
            Posture::Magic => [Loadout::Ranged, Loadout::Melee],
            Posture::Melee => [Loadout::Ranged, Loadout::Magic],
        }
    }

    pub const fn as_flag(self) -> StyleSet {
        match self {
            Loadout::Melee => StyleSet::MELEE,
            Loadout::Ranged => StyleSet::RANGED,
            Loadout::Magic => StyleSet::MAGIC,
        }
    }
}

/// A posture slot that can be toggled through the status interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PostureToggle {
    /// Defensive protection against one style.
    Protect(Posture),
    /// Offensive boost for the equipped loadout.
    Boost(Loadout),
}

impl PostureToggle {
    /// Every toggle the status interface exposes, defensive first.
    pub const ALL: [PostureToggle; 6] = [
        PostureToggle::Protect(Posture::Magic),
        PostureToggle::Protect(Posture::Ranged),
        PostureToggle::Protect(Posture::Melee),
        PostureToggle::Boost(Loadout::Melee),
        PostureToggle::Boost(Loadout::Ranged),
        PostureToggle::Boost(Loadout::Magic),
    ];
}

impl fmt::Display for PostureToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostureToggle::Protect(posture) => write!(f, "protect_{posture}"),
            PostureToggle::Boost(loadout) => write!(f, "boost_{loadout}"),
        }
    }
}

bitflags! {
    /// Subset of loadouts the agent is allowed to fight with.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StyleSet: u8 {
        const MELEE  = 1 << 0;
        const RANGED = 1 << 1;
        const MAGIC  = 1 << 2;
    }
}

impl StyleSet {
    pub fn allows(self, loadout: Loadout) -> bool {
        self.contains(loadout.as_flag())
    }

    /// Enabled loadouts in declaration order.
    pub fn loadouts(self) -> impl Iterator<Item = Loadout> {
        use strum::IntoEnumIterator;
        Loadout::iter().filter(move |loadout| self.allows(*loadout))
    }

    /// Parses a comma separated list such as `"melee, ranged"`.
    pub fn parse_list(list: &str) -> Result<Self, strum::ParseError> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .try_fold(StyleSet::empty(), |set, item| {
                item.parse::<Loadout>().map(|loadout| set | loadout.as_flag())
            })
    }
}

impl FromIterator<Loadout> for StyleSet {
    fn from_iter<I: IntoIterator<Item = Loadout>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StyleSet::empty(), |set, loadout| set | loadout.as_flag())
    }
}
