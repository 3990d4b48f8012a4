use super::{
    ComputeData, EquipmentKindCounter, NetworkStateOperators, NetworkTraceQueueNext, NetworkTraceStep,
    NetworkTraceTracker, NoData, StepType, StepTypeQueueCondition, StepTypeStopCondition,
};
use crate::model::{ConductingEquipment, EquipmentKind, Terminal};
use crate::phases::PhaseSet;
use crate::traversal::{
    ActionGate, QueueCondition, SearchType, StepAction, StepContext, StopCondition, TraceItem, Traversal,
    TraversalStats,
};
use anyhow::Result;
use std::sync::Arc;

/// Which steps the step actions and stop conditions see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkTraceActionType {
    /// Start items and steps arriving on new equipment.
    #[default]
    FirstStepOnEquipment,
    AllSteps,
}

struct ActionTypeGate(NetworkTraceActionType);

impl<D: TraceItem> ActionGate<NetworkTraceStep<D>> for ActionTypeGate {
    fn can_action(&self, item: &NetworkTraceStep<D>, context: &StepContext) -> bool {
        match self.0 {
            NetworkTraceActionType::AllSteps => true,
            NetworkTraceActionType::FirstStepOnEquipment => {
                context.is_start_item || item.path.traced_externally()
            }
        }
    }
}

/// Terminal-level trace over the network, in one network state.
pub struct NetworkTrace<D> {
    traversal: Traversal<NetworkTraceStep<D>>,
    state: &'static dyn NetworkStateOperators,
    action_type: NetworkTraceActionType,
}

impl<D: TraceItem> NetworkTrace<D> {
    pub fn new(
        name: impl Into<String>,
        state: &'static dyn NetworkStateOperators,
        action_type: NetworkTraceActionType,
        compute_data: impl ComputeData<D> + 'static,
    ) -> Self {
        let mut traversal = Traversal::with_tracker(
            name,
            NetworkTraceQueueNext::new(state, compute_data),
            NetworkTraceTracker::new(),
        );
        traversal.set_action_gate(ActionTypeGate(action_type));
        Self {
            traversal,
            state,
            action_type,
        }
    }

    pub fn branching(mut self) -> Self {
        self.traversal = self.traversal.branching();
        self
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.traversal = self.traversal.with_search_type(search_type);
        self
    }

    pub fn state(&self) -> &'static dyn NetworkStateOperators {
        self.state
    }

    pub fn action_type(&self) -> NetworkTraceActionType {
        self.action_type
    }

    pub fn stats(&self) -> TraversalStats {
        self.traversal.stats()
    }

    /// Starts from a terminal on all of its nominal phases.
    pub fn add_start_item(&mut self, terminal: Arc<Terminal>, data: D) -> &mut Self {
        let phases = terminal.phases().phase_set();
        self.add_start_item_on_phases(terminal, phases, data)
    }

    pub fn add_start_item_on_phases(&mut self, terminal: Arc<Terminal>, phases: PhaseSet, data: D) -> &mut Self {
        self.traversal
            .add_start_item(NetworkTraceStep::start(terminal, phases, data));
        self
    }

    /// Starts from every terminal of the equipment.
    pub fn add_start_equipment(&mut self, equipment: &ConductingEquipment, data: D) -> &mut Self {
        for terminal in equipment.terminals() {
            self.add_start_item(terminal.clone(), data.clone());
        }
        self
    }

    pub fn add_step_action(&mut self, action: impl StepAction<NetworkTraceStep<D>> + 'static) -> &mut Self {
        self.traversal.add_step_action(action);
        self
    }

    pub fn add_step_fn<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(&NetworkTraceStep<D>, &StepContext) -> Result<()> + Send + Sync + 'static,
    {
        self.traversal.add_step_fn(action);
        self
    }

    pub fn add_stop_condition(&mut self, condition: impl StopCondition<NetworkTraceStep<D>> + 'static) -> &mut Self {
        self.traversal.add_stop_condition(condition);
        self
    }

    pub fn add_stop_fn<F>(&mut self, condition: F) -> &mut Self
    where
        F: Fn(&NetworkTraceStep<D>, &StepContext) -> bool + Send + Sync + 'static,
    {
        self.traversal.add_stop_fn(condition);
        self
    }

    pub fn add_stop_condition_for(
        &mut self,
        step_type: StepType,
        condition: impl StopCondition<NetworkTraceStep<D>> + 'static,
    ) -> &mut Self {
        self.add_stop_condition(StepTypeStopCondition::new(step_type, condition))
    }

    pub fn add_queue_condition(&mut self, condition: impl QueueCondition<NetworkTraceStep<D>> + 'static) -> &mut Self {
        self.traversal.add_queue_condition(condition);
        self
    }

    pub fn add_queue_condition_for(
        &mut self,
        step_type: StepType,
        condition: impl QueueCondition<NetworkTraceStep<D>> + 'static,
    ) -> &mut Self {
        self.add_queue_condition(StepTypeQueueCondition::new(step_type, condition))
    }

    pub async fn run(&mut self, can_stop_on_start_item: bool) -> Result<()> {
        self.traversal.run(can_stop_on_start_item).await
    }

    pub async fn run_from(&mut self, terminal: Arc<Terminal>, data: D, can_stop_on_start_item: bool) -> Result<()> {
        self.add_start_item(terminal, data);
        self.run(can_stop_on_start_item).await
    }

    pub async fn run_from_equipment(
        &mut self,
        equipment: &ConductingEquipment,
        data: D,
        can_stop_on_start_item: bool,
    ) -> Result<()> {
        self.add_start_equipment(equipment, data);
        self.run(can_stop_on_start_item).await
    }

    pub fn reset(&mut self) -> &mut Self {
        self.traversal.reset();
        self
    }
}

/// Entry points for building traces.
pub struct Tracing;

impl Tracing {
    pub fn network_trace(state: &'static dyn NetworkStateOperators) -> NetworkTrace<()> {
        NetworkTrace::new("network trace", state, NetworkTraceActionType::default(), NoData)
    }

    pub fn network_trace_with(
        state: &'static dyn NetworkStateOperators,
        action_type: NetworkTraceActionType,
    ) -> NetworkTrace<()> {
        NetworkTrace::new("network trace", state, action_type, NoData)
    }

    pub fn network_trace_branching(state: &'static dyn NetworkStateOperators) -> NetworkTrace<()> {
        NetworkTrace::new("branching network trace", state, NetworkTraceActionType::default(), NoData).branching()
    }

    /// Trace whose step data is the number of `kind` equipment stepped onto,
    /// for use with `Conditions::limit_equipment_type_steps`. Start items
    /// should carry 0.
    pub fn equipment_kind_trace(state: &'static dyn NetworkStateOperators, kind: EquipmentKind) -> NetworkTrace<usize> {
        NetworkTrace::new(
            format!("{kind} counting trace"),
            state,
            NetworkTraceActionType::default(),
            EquipmentKindCounter::new(kind),
        )
    }
}
