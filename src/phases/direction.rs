use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use strum_macros::{Display, EnumIter, EnumString};

/// Direction of energy flow through a terminal phase, stored in two bits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PhaseDirection {
    #[default]
    None,
    In,
    Out,
    Both,
}

impl PhaseDirection {
    pub const fn value(self) -> u8 {
        match self {
            Self::None => 0,
            Self::In => 1,
            Self::Out => 2,
            Self::Both => 3,
        }
    }

    pub const fn from_value(value: u8) -> Self {
        match value & 0b11 {
            1 => Self::In,
            2 => Self::Out,
            3 => Self::Both,
            _ => Self::None,
        }
    }

    /// BOTH contains every direction except NONE; anything else only
    /// contains itself.
    pub fn has(self, other: PhaseDirection) -> bool {
        if self == Self::Both {
            other != Self::None
        } else {
            self == other
        }
    }
}

impl Add for PhaseDirection {
    type Output = PhaseDirection;

    fn add(self, rhs: PhaseDirection) -> PhaseDirection {
        PhaseDirection::from_value(self.value() | rhs.value())
    }
}

impl Sub for PhaseDirection {
    type Output = PhaseDirection;

    fn sub(self, rhs: PhaseDirection) -> PhaseDirection {
        PhaseDirection::from_value(self.value() & !rhs.value())
    }
}
