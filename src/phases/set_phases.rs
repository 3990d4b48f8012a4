//! # Phase Energization
//!
//! Pushes phases out from the feeder head terminals and records the direction
//! of flow on every terminal reached:
//! - the head terminal gets OUT on each of its nominal phases
//! - a terminal reached across a connectivity node gets IN, with the phase
//!   identity of the terminal it was reached from
//! - the other terminals of that equipment get OUT on every phase that is not
//!   open
//!
//! The walk is a branching traversal. Each branch keeps its own record of
//! visited terminals, so a loop fed from both ends is walked from both ends
//! and its terminals end up with BOTH.

use super::{PhaseDirection, PhaseSet, SinglePhaseKind};
use crate::error::TracingError;
use crate::model::{ConductingEquipment, NetworkService, Terminal};
use crate::network_trace::NetworkStateOperators;
use crate::traversal::{QueueNext, StepAction, StepContext, Traversal};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A terminal being energized on a set of phases.
#[derive(Clone)]
pub struct PhaseStep {
    pub terminal: Arc<Terminal>,
    /// Terminal the phases arrived from, `None` for a head terminal.
    pub from: Option<Arc<Terminal>>,
    pub phases: PhaseSet,
}

impl PartialEq for PhaseStep {
    fn eq(&self, other: &Self) -> bool {
        self.terminal == other.terminal && self.phases == other.phases
    }
}

impl Eq for PhaseStep {}

impl Hash for PhaseStep {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.terminal.hash(state);
        self.phases.hash(state);
    }
}

pub struct SetPhases {
    state: &'static dyn NetworkStateOperators,
}

impl SetPhases {
    pub fn new(state: &'static dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Energizes from the head terminal of every feeder in the network.
    /// A network without any feeder head is an error.
    pub async fn run(&self, network: &NetworkService) -> Result<()> {
        let heads = network.feeder_head_terminals();
        if heads.is_empty() {
            return Err(TracingError::NoStartTerminals.into());
        }
        self.run_from_terminals(heads).await
    }

    /// Like [`SetPhases::run`], but a network without feeder heads is only
    /// warned about. Returns whether any phases were applied.
    pub async fn run_if_fed(&self, network: &NetworkService) -> Result<bool> {
        let heads = network.feeder_head_terminals();
        if heads.is_empty() {
            warn!(state = %self.state.state(), "no feeder head terminals, phases not applied");
            return Ok(false);
        }
        self.run_from_terminals(heads).await?;
        Ok(true)
    }

    pub async fn run_from_terminals(&self, terminals: Vec<Arc<Terminal>>) -> Result<()> {
        info!(state = %self.state.state(), start_terminals = terminals.len(), "applying phases");

        for terminal in terminals {
            let mut traversal = Traversal::new(
                format!("set phases from {}", terminal.mrid()),
                PhaseFlow { state: self.state },
            )
            .branching();
            traversal.add_step_action(ApplyPhases { state: self.state });

            let phases = terminal.phases().phase_set();
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
                steps = traversal.stats().steps,
                branches = traversal.stats().branches,
                "phases applied"
            );
        }
        Ok(())
    }
}

fn equipment_of(terminal: &Terminal) -> Result<Arc<ConductingEquipment>, TracingError> {
    terminal
        .conducting_equipment()
        .ok_or_else(|| TracingError::MissingEquipment(terminal.mrid().to_string()))
}

pub(crate) fn nominal_phases(terminal: &Terminal, phases: PhaseSet) -> impl Iterator<Item = SinglePhaseKind> + '_ {
    terminal
        .phases()
        .single_phases()
        .iter()
        .copied()
        .filter(move |nominal| phases.contains(*nominal))
}

struct ApplyPhases {
    state: &'static dyn NetworkStateOperators,
}

impl ApplyPhases {
    fn add(
        &self,
        terminal: &Arc<Terminal>,
        nominal: SinglePhaseKind,
        phase: SinglePhaseKind,
        direction: PhaseDirection,
    ) -> Result<()> {
        self.state
            .phase_status(terminal, nominal)
            .add(phase, direction)
            .map_err(TracingError::from)
            .with_context(|| format!("applying {direction} {phase} to {}", terminal.mrid()))?;
        Ok(())
    }
}

#[async_trait]
impl StepAction<PhaseStep> for ApplyPhases {
    async fn apply(&self, step: &PhaseStep, _context: &StepContext) -> Result<()> {
        let Some(from) = &step.from else {
            for nominal in nominal_phases(&step.terminal, step.phases) {
                self.add(&step.terminal, nominal, nominal, PhaseDirection::Out)?;
            }
            return Ok(());
        };

        for nominal in nominal_phases(&step.terminal, step.phases) {
            let phase = self.state.phase_status(from, nominal).phase();
            if phase != SinglePhaseKind::None {
                self.add(&step.terminal, nominal, phase, PhaseDirection::In)?;
            }
        }

        let equipment = equipment_of(&step.terminal)?;
        for other in step.terminal.other_terminals() {
            for nominal in nominal_phases(&other, step.phases) {
                if self.state.is_open(&equipment, Some(nominal)) {
                    continue;
                }
                let phase = self.state.phase_status(&step.terminal, nominal).phase();
                if phase != SinglePhaseKind::None {
                    self.add(&other, nominal, phase, PhaseDirection::Out)?;
                }
            }
        }
        Ok(())
    }
}

struct PhaseFlow {
    state: &'static dyn NetworkStateOperators,
}

impl PhaseFlow {
    fn flowing_phases(&self, equipment: &ConductingEquipment, phases: PhaseSet) -> PhaseSet {
        PhaseSet::from_phases(phases.iter().filter(|phase| !self.state.is_open(equipment, Some(*phase))))
    }
}

#[async_trait]
impl QueueNext<PhaseStep> for PhaseFlow {
    async fn next_items(&self, step: &PhaseStep, _context: &StepContext) -> Result<Vec<PhaseStep>> {
        let outgoing: Vec<(Arc<Terminal>, PhaseSet)> = match step.from {
            None => vec![(step.terminal.clone(), step.phases)],
            Some(_) => {
                let equipment = equipment_of(&step.terminal)?;
                let flowing = self.flowing_phases(&equipment, step.phases);
                step.terminal
                    .other_terminals()
                    .into_iter()
                    .map(|other| {
                        let phases = flowing.intersection(other.phases().phase_set());
                        (other, phases)
                    })
                    .collect()
            }
        };

        let mut next = Vec::new();
        for (source, phases) in outgoing {
            if phases.is_empty() {
                continue;
            }
            for connected in source.connected_terminals() {
                let equipment = equipment_of(&connected)?;
                if !self.state.is_in_service(&equipment) {
                    continue;
                }
                let phases = phases.intersection(connected.phases().phase_set());
                if !phases.is_empty() {
                    next.push(PhaseStep {
                        terminal: connected,
                        from: Some(source.clone()),
                        phases,
                    });
                }
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhaseError;
    use crate::model::{EquipmentBuilder, EquipmentKind, Feeder};
    use crate::network_trace::{CURRENT, NORMAL};
    use crate::phases::PhaseCode;

    fn direction(network: &NetworkService, terminal: &str, nominal: SinglePhaseKind) -> PhaseDirection {
        NORMAL
            .phase_status(&network.get_terminal(terminal).unwrap(), nominal)
            .direction()
    }

    /// src - line1 - sw(open on C) - load
    fn radial() -> NetworkService {
        let mut network = NetworkService::new();
        let src = network
            .create(EquipmentBuilder::new("src", EquipmentKind::EnergySource).terminal(PhaseCode::ABC))
            .unwrap();
        let line1 = network
            .create(EquipmentBuilder::new("line1", EquipmentKind::AcLineSegment).terminals(2, PhaseCode::ABC))
            .unwrap();
        let sw = network
            .create(
                EquipmentBuilder::new("sw", EquipmentKind::Breaker)
                    .terminals(2, PhaseCode::ABC)
                    .normally_open(PhaseCode::C),
            )
            .unwrap();
        let load = network
            .create(EquipmentBuilder::new("load", EquipmentKind::EnergyConsumer).terminal(PhaseCode::ABC))
            .unwrap();
        network.connect_terminals(&src.terminals()[0], &line1.terminals()[0]);
        network.connect_terminals(&line1.terminals()[1], &sw.terminals()[0]);
        network.connect_terminals(&sw.terminals()[1], &load.terminals()[0]);
        network.add_feeder(Feeder::new("f1", Some(src.terminals()[0].clone())));
        network
    }

    #[tokio::test]
    async fn test_radial_directions() {
        let network = radial();
        SetPhases::new(&NORMAL).run(&network).await.unwrap();

        assert_eq!(direction(&network, "src-t1", SinglePhaseKind::A), PhaseDirection::Out);
        assert_eq!(direction(&network, "line1-t1", SinglePhaseKind::A), PhaseDirection::In);
        assert_eq!(direction(&network, "line1-t2", SinglePhaseKind::A), PhaseDirection::Out);
        assert_eq!(direction(&network, "sw-t1", SinglePhaseKind::C), PhaseDirection::In);
        assert_eq!(direction(&network, "sw-t2", SinglePhaseKind::C), PhaseDirection::None);
        assert_eq!(direction(&network, "load-t1", SinglePhaseKind::B), PhaseDirection::In);
        assert_eq!(direction(&network, "load-t1", SinglePhaseKind::C), PhaseDirection::None);

        let load_t1 = network.get_terminal("load-t1").unwrap();
        assert_eq!(NORMAL.phase_status(&load_t1, SinglePhaseKind::A).phase(), SinglePhaseKind::A);
        assert_eq!(CURRENT.phase_status(&load_t1, SinglePhaseKind::A).direction(), PhaseDirection::None);
    }

    #[tokio::test]
    async fn test_loop_fed_from_both_ends() {
        let mut network = NetworkService::new();
        let src = network
            .create(EquipmentBuilder::new("src", EquipmentKind::EnergySource).terminal(PhaseCode::AB))
            .unwrap();
        let mut line = |mrid: &str| {
            network
                .create(EquipmentBuilder::new(mrid, EquipmentKind::AcLineSegment).terminals(2, PhaseCode::AB))
                .unwrap()
        };
        let a = line("a");
        let b = line("b");
        let c = line("c");
        network.connect(&src.terminals()[0], "n0");
        network.connect(&a.terminals()[0], "n0");
        network.connect(&b.terminals()[0], "n0");
        network.connect(&a.terminals()[1], "n1");
        network.connect(&c.terminals()[0], "n1");
        network.connect(&b.terminals()[1], "n2");
        network.connect(&c.terminals()[1], "n2");

        SetPhases::new(&NORMAL)
            .run_from_terminals(vec![src.terminals()[0].clone()])
            .await
            .unwrap();

        assert_eq!(direction(&network, "src-t1", SinglePhaseKind::A), PhaseDirection::Out);
        for terminal in ["a-t1", "a-t2", "b-t1", "b-t2", "c-t1", "c-t2"] {
            assert_eq!(direction(&network, terminal, SinglePhaseKind::B), PhaseDirection::Both, "{terminal}");
        }
    }

    #[tokio::test]
    async fn test_crossing_phases_reported() {
        let network = radial();
        let load_t1 = network.get_terminal("load-t1").unwrap();
        NORMAL
            .phase_status(&load_t1, SinglePhaseKind::A)
            .set(SinglePhaseKind::B, PhaseDirection::In)
            .unwrap();

        let err = SetPhases::new(&NORMAL).run(&network).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TracingError>(),
            Some(TracingError::Phase(PhaseError::CrossingPhases { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unfed_network_is_skipped_when_asked() {
        let mut network = radial();
        assert!(SetPhases::new(&NORMAL).run_if_fed(&network).await.unwrap());

        let mut unfed = NetworkService::new();
        unfed.add_feeder(Feeder::new("headless", None));
        assert!(!SetPhases::new(&CURRENT).run_if_fed(&unfed).await.unwrap());
        assert!(SetPhases::new(&CURRENT).run(&unfed).await.is_err());

        network.add_feeder(Feeder::new("headless", None));
        assert_eq!(network.feeder_head_terminals().len(), 1);
    }

    #[tokio::test]
    async fn test_no_feeders_is_an_error() {
        let network = NetworkService::new();
        let err = SetPhases::new(&CURRENT).run(&network).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TracingError>(),
            Some(TracingError::NoStartTerminals)
        ));
    }
}
