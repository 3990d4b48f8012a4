//! # Phase Removal
//!
//! Undoes phase energization in one network state. Removal floods away from
//! a terminal regardless of switch positions: the terminals connected to it
//! are cleared, then the walk moves on through the equipment they belong to.

use super::set_phases::nominal_phases;
use super::{PhaseSet, PhaseStatus, PhaseStep, SinglePhaseKind};
use crate::error::TracingError;
use crate::model::{NetworkService, Terminal};
use crate::network_trace::{NetworkState, NetworkStateOperators};
use crate::traversal::{FnQueueNext, StepAction, StepContext, Traversal};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RemovePhases {
    state: &'static dyn NetworkStateOperators,
}

impl RemovePhases {
    pub fn new(state: &'static dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Clears every traced phase of the chosen state, leaving the other
    /// state untouched.
    pub fn remove_all(&self, network: &NetworkService) {
        let mut cleared = 0;
        for terminal in network.equipment().flat_map(|equipment| equipment.terminals()) {
            let mut traced = terminal.traced_phases();
            match self.state.state() {
                NetworkState::Normal => traced.clear_normal(),
                NetworkState::Current => traced.clear_current(),
            }
            cleared += 1;
        }
        info!(state = %self.state.state(), terminals = cleared, "traced phases removed");
    }

    /// Removes traced phases from `terminal` and everything connected to it.
    /// Defaults to all of the terminal's nominal phases.
    pub async fn run(&self, terminal: Arc<Terminal>, phases: Option<PhaseSet>) -> Result<()> {
        let nominal = terminal.phases().phase_set();
        let phases = phases.map_or(nominal, |phases| phases.intersection(nominal));
        if phases.is_empty() {
            return Ok(());
        }

        let mut traversal = Traversal::new(
            format!("remove phases from {}", terminal.mrid()),
            FnQueueNext::new(|step: &PhaseStep, _: &StepContext| Ok(through_connected_equipment(step))),
        );
        traversal.add_step_action(Ebb { state: self.state });
        traversal
            .run_from(
                [PhaseStep {
                    terminal,
                    from: None,
                    phases,
                }],
                false,
            )
            .await?;

        debug!(
            trace = traversal.name(),
            state = %self.state.state(),
            steps = traversal.stats().steps,
            "phases removed"
        );
        Ok(())
    }
}

fn through_connected_equipment(step: &PhaseStep) -> Vec<PhaseStep> {
    let mut next = Vec::new();
    for connected in step.terminal.connected_terminals() {
        let phases = step.phases.intersection(connected.phases().phase_set());
        if phases.is_empty() {
            continue;
        }
        for other in connected.other_terminals() {
            let phases = phases.intersection(other.phases().phase_set());
            if !phases.is_empty() {
                next.push(PhaseStep {
                    terminal: other,
                    from: Some(connected.clone()),
                    phases,
                });
            }
        }
    }
    next
}

struct Ebb {
    state: &'static dyn NetworkStateOperators,
}

impl Ebb {
    fn clear(&self, terminal: &Arc<Terminal>, phases: PhaseSet) -> Result<()> {
        for nominal in nominal_phases(terminal, phases) {
            let status = self.state.phase_status(terminal, nominal);
            let phase = status.phase();
            if phase == SinglePhaseKind::None {
                continue;
            }
            status
                .remove(phase, None)
                .map_err(TracingError::from)
                .with_context(|| format!("removing {phase} from {}", terminal.mrid()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl StepAction<PhaseStep> for Ebb {
    async fn apply(&self, step: &PhaseStep, _context: &StepContext) -> Result<()> {
        self.clear(&step.terminal, step.phases)?;
        for connected in step.terminal.connected_terminals() {
            let phases = step.phases.intersection(connected.phases().phase_set());
            self.clear(&connected, phases)?;
        }
        Ok(())
    }
}
