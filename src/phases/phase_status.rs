use super::{PhaseDirection, SinglePhaseKind};
use crate::error::PhaseError;
use crate::model::Terminal;
use std::sync::Arc;

/// View of one nominal phase of a terminal in a single network state.
pub trait PhaseStatus: Send + Sync {
    /// The traced phase, `NONE` when nothing has been traced.
    fn phase(&self) -> SinglePhaseKind;

    fn direction(&self) -> PhaseDirection;

    /// Merges a direction into the traced phase. Returns `Ok(false)` when the
    /// phase already carries the direction.
    fn add(&self, phase: SinglePhaseKind, direction: PhaseDirection) -> Result<bool, PhaseError>;

    fn set(&self, phase: SinglePhaseKind, direction: PhaseDirection) -> Result<bool, PhaseError>;

    /// Removes a direction, or the whole phase when `direction` is `None`.
    fn remove(&self, phase: SinglePhaseKind, direction: Option<PhaseDirection>) -> Result<bool, PhaseError>;
}

pub struct NormalPhases {
    terminal: Arc<Terminal>,
    nominal: SinglePhaseKind,
}

impl NormalPhases {
    pub fn new(terminal: Arc<Terminal>, nominal: SinglePhaseKind) -> Self {
        Self { terminal, nominal }
    }
}

impl PhaseStatus for NormalPhases {
    fn phase(&self) -> SinglePhaseKind {
        self.terminal.traced_phases().normal_phase(self.nominal)
    }

    fn direction(&self) -> PhaseDirection {
        self.terminal.traced_phases().normal_direction(self.nominal)
    }

    fn add(&self, phase: SinglePhaseKind, direction: PhaseDirection) -> Result<bool, PhaseError> {
        self.terminal.traced_phases().add_normal(phase, direction, self.nominal)
    }

    fn set(&self, phase: SinglePhaseKind, direction: PhaseDirection) -> Result<bool, PhaseError> {
        self.terminal.traced_phases().set_normal(phase, direction, self.nominal)
    }

    fn remove(&self, phase: SinglePhaseKind, direction: Option<PhaseDirection>) -> Result<bool, PhaseError> {
        self.terminal.traced_phases().remove_normal(phase, direction, self.nominal)
    }
}

pub struct CurrentPhases {
    terminal: Arc<Terminal>,
    nominal: SinglePhaseKind,
}

impl CurrentPhases {
    pub fn new(terminal: Arc<Terminal>, nominal: SinglePhaseKind) -> Self {
        Self { terminal, nominal }
    }
}

impl PhaseStatus for CurrentPhases {
    fn phase(&self) -> SinglePhaseKind {
        self.terminal.traced_phases().current_phase(self.nominal)
    }

    fn direction(&self) -> PhaseDirection {
        self.terminal.traced_phases().current_direction(self.nominal)
    }

    fn add(&self, phase: SinglePhaseKind, direction: PhaseDirection) -> Result<bool, PhaseError> {
        self.terminal.traced_phases().add_current(phase, direction, self.nominal)
    }

    fn set(&self, phase: SinglePhaseKind, direction: PhaseDirection) -> Result<bool, PhaseError> {
        self.terminal.traced_phases().set_current(phase, direction, self.nominal)
    }

    fn remove(&self, phase: SinglePhaseKind, direction: Option<PhaseDirection>) -> Result<bool, PhaseError> {
        self.terminal.traced_phases().remove_current(phase, direction, self.nominal)
    }
}
