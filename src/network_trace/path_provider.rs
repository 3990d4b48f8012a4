use super::{NetworkStateOperators, NetworkTraceStep, StepPath};
use crate::error::TracingResult;
use crate::model::{EquipmentKind, Terminal};
use crate::traversal::{QueueNext, StepContext, TraceItem};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Works out the paths leaving a step.
///
/// Steps alternate: after arriving on a terminal from outside, the trace
/// moves internally to the equipment's other terminals; after an internal
/// step (or from a start terminal) it moves externally across the
/// connectivity node. Busbar sections act as the hub of their node.
#[derive(Debug, Clone, Copy)]
pub struct NetworkTracePathProvider {
    state: &'static dyn NetworkStateOperators,
}

impl NetworkTracePathProvider {
    pub fn new(state: &'static dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    pub fn next_paths(&self, path: &StepPath) -> TracingResult<Vec<StepPath>> {
        let to_equipment = path.to_equipment()?;

        let candidates: Vec<Arc<Terminal>> = if path.traced_internally() {
            self.next_external_terminals(&path.to_terminal)
        } else if to_equipment.kind() == EquipmentKind::BusbarSection {
            path.to_terminal
                .connected_terminals()
                .into_iter()
                .filter(|terminal| *terminal != path.from_terminal && !is_busbar(terminal))
                .collect()
        } else {
            path.to_terminal.other_terminals()
        };

        let mut paths = Vec::with_capacity(candidates.len());
        for terminal in candidates {
            let phases = path.phases.intersection(terminal.phases().phase_set());
            if phases.is_empty() {
                continue;
            }
            let next = StepPath::new(path.to_terminal.clone(), terminal, phases);
            let equipment = next.to_equipment()?;
            if self.state.is_in_service(&equipment) {
                paths.push(next);
            }
        }
        Ok(paths)
    }

    fn next_external_terminals(&self, terminal: &Arc<Terminal>) -> Vec<Arc<Terminal>> {
        let connected = terminal.connected_terminals();
        if is_busbar(terminal) {
            return connected;
        }

        let busbars: Vec<Arc<Terminal>> = connected.iter().filter(|t| is_busbar(t)).cloned().collect();
        if busbars.is_empty() {
            connected
        } else {
            busbars
        }
    }
}

fn is_busbar(terminal: &Terminal) -> bool {
    terminal
        .conducting_equipment()
        .is_some_and(|equipment| equipment.kind() == EquipmentKind::BusbarSection)
}

/// Computes the user data carried by the next step.
pub trait ComputeData<D>: Send + Sync {
    fn compute_next(&self, current: &NetworkTraceStep<D>, context: &StepContext, next_path: &StepPath) -> D;
}

/// Carries no data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoData;

impl ComputeData<()> for NoData {
    fn compute_next(&self, _current: &NetworkTraceStep<()>, _context: &StepContext, _next_path: &StepPath) {}
}

pub struct FnComputeData<F>(F);

impl<F> FnComputeData<F> {
    pub fn new<D>(f: F) -> Self
    where
        F: Fn(&NetworkTraceStep<D>, &StepContext, &StepPath) -> D + Send + Sync,
    {
        Self(f)
    }
}

impl<D, F> ComputeData<D> for FnComputeData<F>
where
    F: Fn(&NetworkTraceStep<D>, &StepContext, &StepPath) -> D + Send + Sync,
{
    fn compute_next(&self, current: &NetworkTraceStep<D>, context: &StepContext, next_path: &StepPath) -> D {
        (self.0)(current, context, next_path)
    }
}

pub struct NetworkTraceQueueNext<D> {
    paths: NetworkTracePathProvider,
    compute_data: Arc<dyn ComputeData<D>>,
}

impl<D> NetworkTraceQueueNext<D> {
    pub fn new(state: &'static dyn NetworkStateOperators, compute_data: impl ComputeData<D> + 'static) -> Self {
        Self {
            paths: NetworkTracePathProvider::new(state),
            compute_data: Arc::new(compute_data),
        }
    }
}

#[async_trait]
impl<D: TraceItem> QueueNext<NetworkTraceStep<D>> for NetworkTraceQueueNext<D> {
    async fn next_items(
        &self,
        item: &NetworkTraceStep<D>,
        context: &StepContext,
    ) -> Result<Vec<NetworkTraceStep<D>>> {
        let steps = self
            .paths
            .next_paths(&item.path)?
            .into_iter()
            .map(|path| {
                let data = self.compute_data.compute_next(item, context, &path);
                item.next(path, data)
            })
            .collect();
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EquipmentBuilder, NetworkService};
    use crate::network_trace::{CURRENT, NORMAL};
    use crate::phases::PhaseCode;

    fn mrids(paths: &[StepPath]) -> Vec<String> {
        paths.iter().map(|p| p.to_terminal.mrid().to_string()).collect()
    }

    #[test]
    fn test_alternates_external_and_internal() {
        let mut network = NetworkService::new();
        let a = network
            .create(EquipmentBuilder::new("a", EquipmentKind::AcLineSegment).terminals(2, PhaseCode::ABC))
            .unwrap();
        let b = network
            .create(EquipmentBuilder::new("b", EquipmentKind::AcLineSegment).terminals(2, PhaseCode::ABC))
            .unwrap();
        network.connect_terminals(&a.terminals()[1], &b.terminals()[0]);
        let provider = NetworkTracePathProvider::new(&NORMAL);
        let abc = PhaseCode::ABC.phase_set();

        let start = StepPath::new(a.terminals()[1].clone(), a.terminals()[1].clone(), abc);
        let external = provider.next_paths(&start).unwrap();
        assert_eq!(mrids(&external), vec!["b-t1"]);

        let internal = provider.next_paths(&external[0]).unwrap();
        assert_eq!(mrids(&internal), vec!["b-t2"]);
        assert!(internal[0].traced_internally());
    }

    #[test]
    fn test_phases_narrow_and_empty_paths_dropped() {
        let mut network = NetworkService::new();
        let a = network
            .create(EquipmentBuilder::new("a", EquipmentKind::Junction).terminal(PhaseCode::ABC))
            .unwrap();
        let b = network
            .create(EquipmentBuilder::new("b", EquipmentKind::Junction).terminal(PhaseCode::AN))
            .unwrap();
        let c = network
            .create(EquipmentBuilder::new("c", EquipmentKind::Junction).terminal(PhaseCode::N))
            .unwrap();
        network.connect(&a.terminals()[0], "n1");
        network.connect(&b.terminals()[0], "n1");
        network.connect(&c.terminals()[0], "n1");

        let start = StepPath::new(a.terminals()[0].clone(), a.terminals()[0].clone(), PhaseCode::ABC.phase_set());
        let paths = NetworkTracePathProvider::new(&NORMAL).next_paths(&start).unwrap();
        assert_eq!(mrids(&paths), vec!["b-t1"]);
        assert_eq!(paths[0].phases, PhaseCode::A.phase_set());
    }

    #[test]
    fn test_out_of_service_equipment_skipped() {
        let mut network = NetworkService::new();
        let a = network
            .create(EquipmentBuilder::new("a", EquipmentKind::Junction).terminal(PhaseCode::A))
            .unwrap();
        let b = network
            .create(
                EquipmentBuilder::new("b", EquipmentKind::Junction)
                    .terminal(PhaseCode::A)
                    .in_service(true, false),
            )
            .unwrap();
        network.connect_terminals(&a.terminals()[0], &b.terminals()[0]);
        let start = StepPath::new(a.terminals()[0].clone(), a.terminals()[0].clone(), PhaseCode::A.phase_set());

        assert_eq!(NetworkTracePathProvider::new(&NORMAL).next_paths(&start).unwrap().len(), 1);
        assert!(NetworkTracePathProvider::new(&CURRENT).next_paths(&start).unwrap().is_empty());
    }

    #[test]
    fn test_busbar_is_hub_of_its_node() {
        let mut network = NetworkService::new();
        let bus = network
            .create(EquipmentBuilder::new("bus", EquipmentKind::BusbarSection).terminal(PhaseCode::ABC))
            .unwrap();
        let feeder_a = network
            .create(EquipmentBuilder::new("fa", EquipmentKind::Breaker).terminals(2, PhaseCode::ABC))
            .unwrap();
        let feeder_b = network
            .create(EquipmentBuilder::new("fb", EquipmentKind::Breaker).terminals(2, PhaseCode::ABC))
            .unwrap();
        for terminal in [&bus.terminals()[0], &feeder_a.terminals()[0], &feeder_b.terminals()[0]] {
            network.connect(terminal, "bus-node");
        }
        let provider = NetworkTracePathProvider::new(&NORMAL);
        let abc = PhaseCode::ABC.phase_set();

        // Leaving fa-t1 goes only onto the busbar.
        let start = StepPath::new(feeder_a.terminals()[1].clone(), feeder_a.terminals()[0].clone(), abc);
        let onto_bus = provider.next_paths(&start).unwrap();
        assert_eq!(mrids(&onto_bus), vec!["bus-t1"]);

        // From the busbar, every other terminal except the one we came from.
        let off_bus = provider.next_paths(&onto_bus[0]).unwrap();
        assert_eq!(mrids(&off_bus), vec!["fb-t1"]);
        assert!(off_bus[0].traced_externally());
    }
}
