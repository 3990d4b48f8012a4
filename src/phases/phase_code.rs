use super::SinglePhaseKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Named combination of single phases carried by a terminal.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PhaseCode {
    None,
    A,
    B,
    C,
    N,
    AB,
    AC,
    AN,
    BC,
    BN,
    CN,
    ABC,
    ABN,
    ACN,
    BCN,
    ABCN,
    X,
    XN,
    XY,
    XYN,
    Y,
    YN,
}

impl PhaseCode {
    pub fn single_phases(self) -> &'static [SinglePhaseKind] {
        use SinglePhaseKind::{A, B, C, N, X, Y};
        match self {
            Self::None => &[],
            Self::A => &[A],
            Self::B => &[B],
            Self::C => &[C],
            Self::N => &[N],
            Self::AB => &[A, B],
            Self::AC => &[A, C],
            Self::AN => &[A, N],
            Self::BC => &[B, C],
            Self::BN => &[B, N],
            Self::CN => &[C, N],
            Self::ABC => &[A, B, C],
            Self::ABN => &[A, B, N],
            Self::ACN => &[A, C, N],
            Self::BCN => &[B, C, N],
            Self::ABCN => &[A, B, C, N],
            Self::X => &[X],
            Self::XN => &[X, N],
            Self::XY => &[X, Y],
            Self::XYN => &[X, Y, N],
            Self::Y => &[Y],
            Self::YN => &[Y, N],
        }
    }

    pub fn num_phases(self) -> usize {
        self.single_phases().len()
    }

    pub fn bit_mask(self) -> u8 {
        self.single_phases().iter().fold(0, |mask, p| mask | p.bit_mask())
    }

    pub fn phase_set(self) -> PhaseSet {
        PhaseSet(self.bit_mask())
    }

    pub fn contains(self, phase: SinglePhaseKind) -> bool {
        self.single_phases().contains(&phase)
    }
}

/// Bit set over the four phase slots.
///
/// Secondary phases fold onto their primary slot, so iterating a set built
/// from `XY` yields A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhaseSet(u8);

impl PhaseSet {
    pub const EMPTY: PhaseSet = PhaseSet(0);
    pub const ALL: PhaseSet = PhaseSet(0b1111);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub fn from_phases<I>(phases: I) -> Self
    where
        I: IntoIterator<Item = SinglePhaseKind>,
    {
        Self(phases.into_iter().fold(0, |mask, p| mask | p.bit_mask()))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, phase: SinglePhaseKind) -> bool {
        let mask = phase.bit_mask();
        mask != 0 && self.0 & mask == mask
    }

    pub fn insert(&mut self, phase: SinglePhaseKind) {
        self.0 |= phase.bit_mask();
    }

    pub fn remove(&mut self, phase: SinglePhaseKind) {
        self.0 &= !phase.bit_mask();
    }

    pub fn union(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 | other.0)
    }

    pub fn intersection(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 & other.0)
    }

    pub fn difference(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Primary phases present in the set, in slot order.
    pub fn iter(self) -> impl Iterator<Item = SinglePhaseKind> {
        [SinglePhaseKind::A, SinglePhaseKind::B, SinglePhaseKind::C, SinglePhaseKind::N]
            .into_iter()
            .filter(move |p| self.contains(*p))
    }
}

impl From<PhaseCode> for PhaseSet {
    fn from(code: PhaseCode) -> Self {
        code.phase_set()
    }
}

impl fmt::Display for PhaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        for phase in self.iter() {
            write!(f, "{phase}")?;
        }
        Ok(())
    }
}
