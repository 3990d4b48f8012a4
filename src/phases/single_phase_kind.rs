//! # Single Phase Kinds
//!
//! Each conductor phase has two separate numbers:
//! - `id`: a stable ordinal used when phases are stored or exchanged
//! - `mask_index`: the bit slot used in phase sets and traced phase storage
//!
//! X and Y are secondary phase names that share the A and B slots, so a set
//! holding X also reports A. NONE and INVALID occupy no slot at all.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SinglePhaseKind {
    None,
    A,
    B,
    C,
    N,
    X,
    Y,
    Invalid,
}

const BY_ID: [SinglePhaseKind; 8] = [
    SinglePhaseKind::None,
    SinglePhaseKind::A,
    SinglePhaseKind::B,
    SinglePhaseKind::C,
    SinglePhaseKind::N,
    SinglePhaseKind::X,
    SinglePhaseKind::Y,
    SinglePhaseKind::Invalid,
];

impl SinglePhaseKind {
    /// Stable ordinal of the phase.
    pub const fn id(self) -> u8 {
        match self {
            Self::None => 0,
            Self::A => 1,
            Self::B => 2,
            Self::C => 3,
            Self::N => 4,
            Self::X => 5,
            Self::Y => 6,
            Self::Invalid => 7,
        }
    }

    /// Lookup by ordinal. Unknown ordinals map to `Invalid`.
    pub fn from_id(id: u8) -> Self {
        BY_ID.get(id as usize).copied().unwrap_or(Self::Invalid)
    }

    /// Bit slot of the phase, `None` for NONE and INVALID.
    pub const fn mask_index(self) -> Option<usize> {
        match self {
            Self::A | Self::X => Some(0),
            Self::B | Self::Y => Some(1),
            Self::C => Some(2),
            Self::N => Some(3),
            Self::None | Self::Invalid => None,
        }
    }

    pub const fn bit_mask(self) -> u8 {
        match self.mask_index() {
            Some(index) => 1 << index,
            None => 0,
        }
    }

    /// Whether the phase can be used as a nominal conductor phase.
    pub const fn is_conductor(self) -> bool {
        self.mask_index().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_ids_round_trip_through_lookup() {
        for phase in SinglePhaseKind::iter() {
            assert_eq!(SinglePhaseKind::from_id(phase.id()), phase);
        }
        assert_eq!(SinglePhaseKind::from_id(42), SinglePhaseKind::Invalid);
    }

    #[test]
    fn test_bit_masks_unique_except_secondary_aliases() {
        let conductors: Vec<_> = SinglePhaseKind::iter().filter(|p| p.is_conductor()).collect();
        for (i, a) in conductors.iter().enumerate() {
            for b in &conductors[i + 1..] {
                let aliased = matches!(
                    (a, b),
                    (SinglePhaseKind::A, SinglePhaseKind::X) | (SinglePhaseKind::B, SinglePhaseKind::Y)
                );
                assert_eq!(a.bit_mask() == b.bit_mask(), aliased, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_none_and_invalid_have_no_slot() {
        assert_eq!(SinglePhaseKind::None.bit_mask(), 0);
        assert_eq!(SinglePhaseKind::Invalid.bit_mask(), 0);
        assert_eq!(SinglePhaseKind::N.mask_index(), Some(3));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("X".parse::<SinglePhaseKind>().unwrap(), SinglePhaseKind::X);
        assert_eq!(SinglePhaseKind::Invalid.to_string(), "INVALID");
    }
}
