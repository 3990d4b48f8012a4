use crate::model::ConductingEquipment;
use crate::network_trace::NetworkStateOperators;
use crate::phases::PhaseDirection;
use crate::traversal::{FnQueueNext, SearchType, StepContext, Traversal};
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

pub const MAX_LIMITED_STEPS: usize = 100;

/// Equipment reached a number of equipment hops from the start.
#[derive(Debug, Clone)]
pub struct EquipmentStep {
    pub equipment: Arc<ConductingEquipment>,
    pub step: usize,
}

impl PartialEq for EquipmentStep {
    fn eq(&self, other: &Self) -> bool {
        self.equipment == other.equipment
    }
}

impl Eq for EquipmentStep {}

impl Hash for EquipmentStep {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.equipment.hash(state);
    }
}

/// Finds the equipment within a few hops of a set of starting equipment.
///
/// Open equipment is reported but never passed through, except when it is
/// one of the starting equipment. With a direction, the trace only leaves
/// equipment through terminals whose traced flow is exactly that direction.
pub struct LimitedConnectedEquipmentTrace {
    state: &'static dyn NetworkStateOperators,
}

impl LimitedConnectedEquipmentTrace {
    pub fn new(state: &'static dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Returns the fewest hops to each piece of equipment reached, keyed by
    /// mRID. `maximum_steps` is clamped to `1..=MAX_LIMITED_STEPS`.
    pub async fn run(
        &self,
        starting_equipment: &[Arc<ConductingEquipment>],
        maximum_steps: usize,
        direction: Option<PhaseDirection>,
    ) -> Result<BTreeMap<String, usize>> {
        let maximum_steps = maximum_steps.clamp(1, MAX_LIMITED_STEPS);
        let state = self.state;

        let mut traversal = Traversal::new(
            "limited connected equipment",
            FnQueueNext::new(move |current: &EquipmentStep, _: &StepContext| {
                if current.step > 0 && state.is_open(&current.equipment, None) {
                    return Ok(Vec::new());
                }
                Ok(current
                    .equipment
                    .terminals()
                    .iter()
                    .filter(|terminal| direction.map_or(true, |d| state.terminal_direction(terminal) == d))
                    .flat_map(|terminal| terminal.connected_terminals())
                    .filter_map(|terminal| terminal.conducting_equipment())
                    .filter(|equipment| state.is_in_service(equipment))
                    .map(|equipment| EquipmentStep {
                        equipment,
                        step: current.step + 1,
                    })
                    .collect())
            }),
        )
        .with_search_type(SearchType::Breadth);

        let reached = Arc::new(Mutex::new(BTreeMap::new()));
        let sink = reached.clone();
        traversal.add_stop_fn(move |item: &EquipmentStep, _| item.step >= maximum_steps);
        traversal.add_step_fn(move |item: &EquipmentStep, _| {
            sink.lock()
                .entry(item.equipment.mrid().to_string())
                .and_modify(|step: &mut usize| *step = (*step).min(item.step))
                .or_insert(item.step);
            Ok(())
        });

        let starts = starting_equipment.iter().map(|equipment| EquipmentStep {
            equipment: equipment.clone(),
            step: 0,
        });
        traversal.run_from(starts, false).await?;

        let reached = std::mem::take(&mut *reached.lock());
        debug!(
            starts = starting_equipment.len(),
            maximum_steps,
            reached = reached.len(),
            "limited connected equipment traced"
        );
        Ok(reached)
    }
}
