use super::{ComputeData, NetworkStateOperators, NetworkTraceStep, StepPath, StepType};
use crate::model::{ConductingEquipment, EquipmentKind};
use crate::phases::{PhaseDirection, SinglePhaseKind};
use crate::traversal::{QueueCondition, StepContext, StopCondition, TraceItem};
use std::sync::Arc;

type OpenTest = Arc<dyn Fn(&ConductingEquipment, Option<SinglePhaseKind>) -> bool + Send + Sync>;

/// Refuses to queue steps onto equipment reported open.
///
/// With a phase, only that phase is tested; otherwise any open phase
/// rejects the step.
#[derive(Clone)]
pub struct OpenSwitchCondition {
    is_open: OpenTest,
    phase: Option<SinglePhaseKind>,
}

impl OpenSwitchCondition {
    pub fn new<F>(is_open: F, phase: Option<SinglePhaseKind>) -> Self
    where
        F: Fn(&ConductingEquipment, Option<SinglePhaseKind>) -> bool + Send + Sync + 'static,
    {
        Self {
            is_open: Arc::new(is_open),
            phase,
        }
    }

    pub fn for_state(state: &'static dyn NetworkStateOperators, phase: Option<SinglePhaseKind>) -> Self {
        Self::new(move |equipment, phase| state.is_open(equipment, phase), phase)
    }
}

impl<D: TraceItem> QueueCondition<NetworkTraceStep<D>> for OpenSwitchCondition {
    fn should_queue(
        &self,
        next: &NetworkTraceStep<D>,
        _next_context: &StepContext,
        _current: &NetworkTraceStep<D>,
        _current_context: &StepContext,
    ) -> bool {
        match next.path.to_equipment() {
            Ok(equipment) => !(self.is_open)(&equipment, self.phase),
            Err(_) => false,
        }
    }
}

/// Stops once the trace has stepped onto `limit` pieces of equipment.
#[derive(Debug, Clone, Copy)]
pub struct EquipmentStepLimitCondition {
    limit: usize,
}

impl EquipmentStepLimitCondition {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl<D: TraceItem> StopCondition<NetworkTraceStep<D>> for EquipmentStepLimitCondition {
    fn should_stop(&self, item: &NetworkTraceStep<D>, _context: &StepContext) -> bool {
        item.num_equipment_steps >= self.limit
    }
}

/// Keeps a trace moving with (or against) the flow recorded by phase
/// energization. `In` walks upstream towards the source, `Out` walks
/// downstream away from it.
///
/// Internal steps need the terminal being stepped onto to carry the
/// direction itself. External steps arrive on the far side of a node, so
/// they need the reverse: walking downstream means entering terminals that
/// are fed in.
#[derive(Debug, Clone, Copy)]
pub struct DirectionCondition {
    direction: PhaseDirection,
    state: &'static dyn NetworkStateOperators,
}

impl DirectionCondition {
    pub fn new(direction: PhaseDirection, state: &'static dyn NetworkStateOperators) -> Self {
        Self { direction, state }
    }

    pub fn direction(&self) -> PhaseDirection {
        self.direction
    }
}

fn reverse(direction: PhaseDirection) -> PhaseDirection {
    match direction {
        PhaseDirection::In => PhaseDirection::Out,
        PhaseDirection::Out => PhaseDirection::In,
        other => other,
    }
}

impl<D: TraceItem> QueueCondition<NetworkTraceStep<D>> for DirectionCondition {
    fn should_queue(
        &self,
        next: &NetworkTraceStep<D>,
        _next_context: &StepContext,
        _current: &NetworkTraceStep<D>,
        _current_context: &StepContext,
    ) -> bool {
        let to_direction = self.state.terminal_direction(&next.path.to_terminal);
        if next.path.traced_internally() {
            to_direction.has(self.direction)
        } else {
            to_direction.has(reverse(self.direction))
        }
    }

    fn should_queue_start_item(&self, item: &NetworkTraceStep<D>) -> bool {
        self.state
            .terminal_direction(&item.path.to_terminal)
            .has(self.direction)
    }
}

/// Counts how many pieces of one kind of equipment a trace has stepped onto.
#[derive(Debug, Clone, Copy)]
pub struct EquipmentKindCounter {
    kind: EquipmentKind,
}

impl EquipmentKindCounter {
    pub fn new(kind: EquipmentKind) -> Self {
        Self { kind }
    }
}

impl ComputeData<usize> for EquipmentKindCounter {
    fn compute_next(&self, current: &NetworkTraceStep<usize>, _context: &StepContext, next_path: &StepPath) -> usize {
        let onto_kind = next_path.traced_externally()
            && next_path
                .to_equipment()
                .is_ok_and(|equipment| equipment.kind() == self.kind);
        current.data + usize::from(onto_kind)
    }
}

/// Stops once a trace counting `kind` with [`EquipmentKindCounter`] has
/// stepped onto `limit` of them.
#[derive(Debug, Clone, Copy)]
pub struct EquipmentTypeStepLimitCondition {
    limit: usize,
    kind: EquipmentKind,
}

impl EquipmentTypeStepLimitCondition {
    pub fn new(limit: usize, kind: EquipmentKind) -> Self {
        Self { limit, kind }
    }

    pub fn kind(&self) -> EquipmentKind {
        self.kind
    }

    /// Data producer the trace must carry for this condition to count.
    pub fn counter(&self) -> EquipmentKindCounter {
        EquipmentKindCounter::new(self.kind)
    }
}

impl StopCondition<NetworkTraceStep<usize>> for EquipmentTypeStepLimitCondition {
    fn should_stop(&self, item: &NetworkTraceStep<usize>, _context: &StepContext) -> bool {
        item.data >= self.limit
    }
}

/// Applies the inner queue condition only to steps of the given type; other
/// steps are always queued.
pub struct StepTypeQueueCondition<D> {
    step_type: StepType,
    inner: Arc<dyn QueueCondition<NetworkTraceStep<D>>>,
}

impl<D> StepTypeQueueCondition<D> {
    pub fn new(step_type: StepType, inner: impl QueueCondition<NetworkTraceStep<D>> + 'static) -> Self {
        Self {
            step_type,
            inner: Arc::new(inner),
        }
    }
}

impl<D: TraceItem> QueueCondition<NetworkTraceStep<D>> for StepTypeQueueCondition<D> {
    fn should_queue(
        &self,
        next: &NetworkTraceStep<D>,
        next_context: &StepContext,
        current: &NetworkTraceStep<D>,
        current_context: &StepContext,
    ) -> bool {
        !self.step_type.matches(next.step_type()) || self.inner.should_queue(next, next_context, current, current_context)
    }

    fn should_queue_start_item(&self, item: &NetworkTraceStep<D>) -> bool {
        self.inner.should_queue_start_item(item)
    }
}

/// Applies the inner stop condition only to steps of the given type; other
/// steps never stop.
pub struct StepTypeStopCondition<D> {
    step_type: StepType,
    inner: Arc<dyn StopCondition<NetworkTraceStep<D>>>,
}

impl<D> StepTypeStopCondition<D> {
    pub fn new(step_type: StepType, inner: impl StopCondition<NetworkTraceStep<D>> + 'static) -> Self {
        Self {
            step_type,
            inner: Arc::new(inner),
        }
    }
}

impl<D: TraceItem> StopCondition<NetworkTraceStep<D>> for StepTypeStopCondition<D> {
    fn should_stop(&self, item: &NetworkTraceStep<D>, context: &StepContext) -> bool {
        self.step_type.matches(item.step_type()) && self.inner.should_stop(item, context)
    }
}

/// Shorthands for the common network conditions.
pub struct Conditions;

impl Conditions {
    pub fn stop_at_open(state: &'static dyn NetworkStateOperators) -> OpenSwitchCondition {
        OpenSwitchCondition::for_state(state, None)
    }

    pub fn stop_at_open_phase(state: &'static dyn NetworkStateOperators, phase: SinglePhaseKind) -> OpenSwitchCondition {
        OpenSwitchCondition::for_state(state, Some(phase))
    }

    pub fn limit_equipment_steps(limit: usize) -> EquipmentStepLimitCondition {
        EquipmentStepLimitCondition::new(limit)
    }

    pub fn limit_equipment_type_steps(limit: usize, kind: EquipmentKind) -> EquipmentTypeStepLimitCondition {
        EquipmentTypeStepLimitCondition::new(limit, kind)
    }

    pub fn with_direction(direction: PhaseDirection, state: &'static dyn NetworkStateOperators) -> DirectionCondition {
        DirectionCondition::new(direction, state)
    }

    pub fn upstream(state: &'static dyn NetworkStateOperators) -> DirectionCondition {
        DirectionCondition::new(PhaseDirection::In, state)
    }

    pub fn downstream(state: &'static dyn NetworkStateOperators) -> DirectionCondition {
        DirectionCondition::new(PhaseDirection::Out, state)
    }
}
