//! # Traced Phases
//!
//! Compact record of the phases energized through a terminal. Every nominal
//! phase slot (A/X, B/Y, C, N) holds one byte per network state:
//!
//! ```text
//!  bit  7 6 | 5 4       | 3 2 1 0
//!      ---  | direction | phase id
//! ```
//!
//! Normal and current states are kept in separate words so one can be traced
//! without disturbing the other.

use super::{PhaseDirection, SinglePhaseKind};
use crate::error::PhaseError;

const PHASE_BITS: u32 = 0x0f;
const DIRECTION_SHIFT: u32 = 4;
const SLOT_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracedPhases {
    normal: u32,
    current: u32,
}

impl TracedPhases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normal_phase(&self, nominal: SinglePhaseKind) -> SinglePhaseKind {
        phase_of(self.normal, nominal)
    }

    pub fn current_phase(&self, nominal: SinglePhaseKind) -> SinglePhaseKind {
        phase_of(self.current, nominal)
    }

    pub fn normal_direction(&self, nominal: SinglePhaseKind) -> PhaseDirection {
        direction_of(self.normal, nominal)
    }

    pub fn current_direction(&self, nominal: SinglePhaseKind) -> PhaseDirection {
        direction_of(self.current, nominal)
    }

    pub fn add_normal(
        &mut self,
        phase: SinglePhaseKind,
        direction: PhaseDirection,
        nominal: SinglePhaseKind,
    ) -> Result<bool, PhaseError> {
        add(&mut self.normal, phase, direction, nominal)
    }

    pub fn add_current(
        &mut self,
        phase: SinglePhaseKind,
        direction: PhaseDirection,
        nominal: SinglePhaseKind,
    ) -> Result<bool, PhaseError> {
        add(&mut self.current, phase, direction, nominal)
    }

    pub fn set_normal(
        &mut self,
        phase: SinglePhaseKind,
        direction: PhaseDirection,
        nominal: SinglePhaseKind,
    ) -> Result<bool, PhaseError> {
        set(&mut self.normal, phase, direction, nominal)
    }

    pub fn set_current(
        &mut self,
        phase: SinglePhaseKind,
        direction: PhaseDirection,
        nominal: SinglePhaseKind,
    ) -> Result<bool, PhaseError> {
        set(&mut self.current, phase, direction, nominal)
    }

    pub fn remove_normal(
        &mut self,
        phase: SinglePhaseKind,
        direction: Option<PhaseDirection>,
        nominal: SinglePhaseKind,
    ) -> Result<bool, PhaseError> {
        remove(&mut self.normal, phase, direction, nominal)
    }

    pub fn remove_current(
        &mut self,
        phase: SinglePhaseKind,
        direction: Option<PhaseDirection>,
        nominal: SinglePhaseKind,
    ) -> Result<bool, PhaseError> {
        remove(&mut self.current, phase, direction, nominal)
    }

    pub fn clear_normal(&mut self) {
        self.normal = 0;
    }

    pub fn clear_current(&mut self) {
        self.current = 0;
    }
}

fn shift_for(nominal: SinglePhaseKind) -> Result<u32, PhaseError> {
    nominal
        .mask_index()
        .map(|index| (index * SLOT_WIDTH) as u32)
        .ok_or(PhaseError::InvalidNominalPhase(nominal))
}

fn slot(word: u32, nominal: SinglePhaseKind) -> Option<(SinglePhaseKind, PhaseDirection)> {
    let shift = shift_for(nominal).ok()?;
    let byte = (word >> shift) & 0xff;
    let direction = PhaseDirection::from_value((byte >> DIRECTION_SHIFT) as u8);
    if direction == PhaseDirection::None {
        return None;
    }
    Some((SinglePhaseKind::from_id((byte & PHASE_BITS) as u8), direction))
}

fn write_slot(word: &mut u32, shift: u32, phase: SinglePhaseKind, direction: PhaseDirection) {
    let byte = if direction == PhaseDirection::None || phase == SinglePhaseKind::None {
        0
    } else {
        (phase.id() as u32 & PHASE_BITS) | ((direction.value() as u32) << DIRECTION_SHIFT)
    };
    *word = (*word & !(0xff << shift)) | (byte << shift);
}

fn phase_of(word: u32, nominal: SinglePhaseKind) -> SinglePhaseKind {
    slot(word, nominal).map(|(phase, _)| phase).unwrap_or(SinglePhaseKind::None)
}

fn direction_of(word: u32, nominal: SinglePhaseKind) -> PhaseDirection {
    slot(word, nominal).map(|(_, direction)| direction).unwrap_or_default()
}

fn add(
    word: &mut u32,
    phase: SinglePhaseKind,
    direction: PhaseDirection,
    nominal: SinglePhaseKind,
) -> Result<bool, PhaseError> {
    let shift = shift_for(nominal)?;
    if phase == SinglePhaseKind::None || direction == PhaseDirection::None {
        return Ok(false);
    }

    match slot(*word, nominal) {
        None => {
            write_slot(word, shift, phase, direction);
            Ok(true)
        }
        Some((existing, _)) if existing != phase => Err(PhaseError::CrossingPhases {
            nominal,
            existing,
            attempted: phase,
        }),
        Some((_, existing)) if existing.has(direction) => Ok(false),
        Some((_, existing)) => {
            write_slot(word, shift, phase, existing + direction);
            Ok(true)
        }
    }
}

fn set(
    word: &mut u32,
    phase: SinglePhaseKind,
    direction: PhaseDirection,
    nominal: SinglePhaseKind,
) -> Result<bool, PhaseError> {
    let shift = shift_for(nominal)?;
    let before = *word;
    write_slot(word, shift, phase, direction);
    Ok(before != *word)
}

fn remove(
    word: &mut u32,
    phase: SinglePhaseKind,
    direction: Option<PhaseDirection>,
    nominal: SinglePhaseKind,
) -> Result<bool, PhaseError> {
    let shift = shift_for(nominal)?;
    let Some((existing_phase, existing_direction)) = slot(*word, nominal) else {
        return Ok(false);
    };
    if existing_phase != phase {
        return Ok(false);
    }

    let remaining = match direction {
        Some(direction) => existing_direction - direction,
        None => PhaseDirection::None,
    };
    if remaining == existing_direction {
        return Ok(false);
    }
    write_slot(word, shift, phase, remaining);
    Ok(true)
}
