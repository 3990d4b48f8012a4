use crate::error::{TracingError, TracingResult};
use crate::model::{ConductingEquipment, Terminal};
use crate::phases::PhaseSet;
use std::fmt;
use std::sync::Arc;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StepType {
    /// Matches both internal and external steps.
    All,
    /// Between two terminals of the same equipment.
    Internal,
    /// Across a connectivity node onto other equipment.
    External,
}

impl StepType {
    pub fn matches(self, other: StepType) -> bool {
        self == StepType::All || self == other
    }
}

/// Hop from one terminal to another, carrying the phases being traced.
#[derive(Clone)]
pub struct StepPath {
    pub from_terminal: Arc<Terminal>,
    pub to_terminal: Arc<Terminal>,
    pub phases: PhaseSet,
}

impl StepPath {
    pub fn new(from_terminal: Arc<Terminal>, to_terminal: Arc<Terminal>, phases: PhaseSet) -> Self {
        Self {
            from_terminal,
            to_terminal,
            phases,
        }
    }

    pub fn from_equipment(&self) -> TracingResult<Arc<ConductingEquipment>> {
        equipment_of(&self.from_terminal)
    }

    pub fn to_equipment(&self) -> TracingResult<Arc<ConductingEquipment>> {
        equipment_of(&self.to_terminal)
    }

    /// Start paths, where both ends are the same terminal, count as internal.
    pub fn traced_internally(&self) -> bool {
        if self.from_terminal == self.to_terminal {
            return true;
        }
        match (
            self.from_terminal.conducting_equipment(),
            self.to_terminal.conducting_equipment(),
        ) {
            (Some(from), Some(to)) => from == to,
            _ => false,
        }
    }

    pub fn traced_externally(&self) -> bool {
        !self.traced_internally()
    }
}

fn equipment_of(terminal: &Terminal) -> TracingResult<Arc<ConductingEquipment>> {
    terminal
        .conducting_equipment()
        .ok_or_else(|| TracingError::MissingEquipment(terminal.mrid().to_string()))
}

impl fmt::Debug for StepPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]",
            self.from_terminal.mrid(),
            self.to_terminal.mrid(),
            self.phases
        )
    }
}

/// Item type of a network trace.
#[derive(Clone)]
pub struct NetworkTraceStep<D> {
    pub path: StepPath,
    /// Terminals stepped onto since the start item.
    pub num_terminal_steps: usize,
    /// Equipment stepped onto since the start item. Internal steps stay on
    /// the same equipment and do not count.
    pub num_equipment_steps: usize,
    pub data: D,
}

impl<D> NetworkTraceStep<D> {
    pub fn start(terminal: Arc<Terminal>, phases: PhaseSet, data: D) -> Self {
        Self {
            path: StepPath::new(terminal.clone(), terminal, phases),
            num_terminal_steps: 0,
            num_equipment_steps: 0,
            data,
        }
    }

    pub fn step_type(&self) -> StepType {
        if self.path.traced_internally() {
            StepType::Internal
        } else {
            StepType::External
        }
    }

    pub fn next_num_terminal_steps(&self) -> usize {
        self.num_terminal_steps + 1
    }

    pub fn next_num_equipment_steps(&self, next_path: &StepPath) -> usize {
        if next_path.traced_externally() {
            self.num_equipment_steps + 1
        } else {
            self.num_equipment_steps
        }
    }

    pub fn next(&self, path: StepPath, data: D) -> Self {
        Self {
            num_terminal_steps: self.next_num_terminal_steps(),
            num_equipment_steps: self.next_num_equipment_steps(&path),
            path,
            data,
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for NetworkTraceStep<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkTraceStep")
            .field("path", &self.path)
            .field("num_terminal_steps", &self.num_terminal_steps)
            .field("num_equipment_steps", &self.num_equipment_steps)
            .field("data", &self.data)
            .finish()
    }
}
