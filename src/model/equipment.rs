use super::Terminal;
use crate::phases::{PhaseCode, PhaseSet, SinglePhaseKind};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    EnergySource,
    Breaker,
    Disconnector,
    Fuse,
    Recloser,
    LoadBreakSwitch,
    Jumper,
    AcLineSegment,
    BusbarSection,
    Junction,
    PowerTransformer,
    EnergyConsumer,
}

impl EquipmentKind {
    /// Kinds that carry an open/closed state.
    pub fn is_switch(self) -> bool {
        matches!(
            self,
            Self::Breaker | Self::Disconnector | Self::Fuse | Self::Recloser | Self::LoadBreakSwitch | Self::Jumper
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionPoint {
    /// Longitude
    pub x_position: f64,
    /// Latitude
    pub y_position: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub points: Vec<PositionPoint>,
}

/// A piece of equipment that conducts current between its terminals.
///
/// Switch state and in-service flags are tracked separately for the normal
/// (as designed) and current (as operated) network states. Container
/// membership is a set of container mRIDs, again per state.
pub struct ConductingEquipment {
    mrid: String,
    name: String,
    kind: EquipmentKind,
    terminals: Vec<Arc<Terminal>>,
    normally_in_service: AtomicBool,
    in_service: AtomicBool,
    normal_open: AtomicU8,
    open: AtomicU8,
    containers: RwLock<BTreeSet<String>>,
    current_containers: RwLock<BTreeSet<String>>,
    location: Option<Location>,
}

impl ConductingEquipment {
    pub fn mrid(&self) -> &str {
        &self.mrid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EquipmentKind {
        self.kind
    }

    pub fn terminals(&self) -> &[Arc<Terminal>] {
        &self.terminals
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    /// Terminal by 1-based sequence number.
    pub fn terminal(&self, sequence_number: u32) -> Option<&Arc<Terminal>> {
        self.terminals.iter().find(|t| t.sequence_number() == sequence_number)
    }

    pub fn is_switch(&self) -> bool {
        self.kind.is_switch()
    }

    /// Largest number of phases on any terminal.
    pub fn max_phases(&self) -> usize {
        self.terminals.iter().map(|t| t.phases().num_phases()).max().unwrap_or(0)
    }

    pub fn normally_in_service(&self) -> bool {
        self.normally_in_service.load(Ordering::Acquire)
    }

    pub fn set_normally_in_service(&self, in_service: bool) {
        self.normally_in_service.store(in_service, Ordering::Release);
    }

    pub fn in_service(&self) -> bool {
        self.in_service.load(Ordering::Acquire)
    }

    pub fn set_in_service(&self, in_service: bool) {
        self.in_service.store(in_service, Ordering::Release);
    }

    /// Normal open state. With no phase, reports open if any phase is open.
    /// Equipment that is not a switch is never open.
    pub fn is_normally_open(&self, phase: Option<SinglePhaseKind>) -> bool {
        self.is_switch() && phase_open(self.normal_open_phases(), phase)
    }

    /// Current open state. Same phase rules as [`Self::is_normally_open`].
    pub fn is_open(&self, phase: Option<SinglePhaseKind>) -> bool {
        self.is_switch() && phase_open(self.open_phases(), phase)
    }

    pub fn normal_open_phases(&self) -> PhaseSet {
        PhaseSet::from_bits(self.normal_open.load(Ordering::Acquire))
    }

    pub fn open_phases(&self) -> PhaseSet {
        PhaseSet::from_bits(self.open.load(Ordering::Acquire))
    }

    pub fn set_normally_open(&self, phases: impl Into<PhaseSet>) {
        self.normal_open.store(phases.into().bits(), Ordering::Release);
    }

    pub fn set_open(&self, phases: impl Into<PhaseSet>) {
        self.open.store(phases.into().bits(), Ordering::Release);
    }

    pub fn containers(&self) -> BTreeSet<String> {
        self.containers.read().clone()
    }

    pub fn current_containers(&self) -> BTreeSet<String> {
        self.current_containers.read().clone()
    }

    /// Returns true if the container was not already present.
    pub fn add_container(&self, mrid: &str) -> bool {
        self.containers.write().insert(mrid.to_string())
    }

    pub fn remove_container(&self, mrid: &str) -> bool {
        self.containers.write().remove(mrid)
    }

    pub fn add_current_container(&self, mrid: &str) -> bool {
        self.current_containers.write().insert(mrid.to_string())
    }

    pub fn remove_current_container(&self, mrid: &str) -> bool {
        self.current_containers.write().remove(mrid)
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

fn phase_open(open: PhaseSet, phase: Option<SinglePhaseKind>) -> bool {
    match phase {
        Some(phase) => open.contains(phase),
        None => !open.is_empty(),
    }
}

impl PartialEq for ConductingEquipment {
    fn eq(&self, other: &Self) -> bool {
        self.mrid == other.mrid
    }
}

impl Eq for ConductingEquipment {}

impl Hash for ConductingEquipment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mrid.hash(state);
    }
}

impl fmt::Debug for ConductingEquipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConductingEquipment")
            .field("mrid", &self.mrid)
            .field("kind", &self.kind)
            .field("terminals", &self.terminals)
            .finish()
    }
}

/// Builds equipment together with its terminals.
///
/// Terminals are named `<mrid>-t<n>` and numbered from 1 in the order they
/// are added.
#[derive(Debug, Clone)]
pub struct EquipmentBuilder {
    mrid: String,
    name: Option<String>,
    kind: EquipmentKind,
    terminals: Vec<PhaseCode>,
    normally_in_service: bool,
    in_service: bool,
    normal_open: PhaseSet,
    open: PhaseSet,
    location: Option<Location>,
}

impl EquipmentBuilder {
    pub fn new(mrid: impl Into<String>, kind: EquipmentKind) -> Self {
        Self {
            mrid: mrid.into(),
            name: None,
            kind,
            terminals: Vec::new(),
            normally_in_service: true,
            in_service: true,
            normal_open: PhaseSet::EMPTY,
            open: PhaseSet::EMPTY,
            location: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn terminal(mut self, phases: PhaseCode) -> Self {
        self.terminals.push(phases);
        self
    }

    pub fn terminals(mut self, count: usize, phases: PhaseCode) -> Self {
        self.terminals.extend(std::iter::repeat(phases).take(count));
        self
    }

    pub fn normally_open(mut self, phases: impl Into<PhaseSet>) -> Self {
        self.normal_open = phases.into();
        self
    }

    pub fn currently_open(mut self, phases: impl Into<PhaseSet>) -> Self {
        self.open = phases.into();
        self
    }

    pub fn in_service(mut self, normally: bool, currently: bool) -> Self {
        self.normally_in_service = normally;
        self.in_service = currently;
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn build(self) -> Arc<ConductingEquipment> {
        let Self {
            mrid,
            name,
            kind,
            terminals,
            normally_in_service,
            in_service,
            normal_open,
            open,
            location,
        } = self;

        Arc::new_cyclic(|weak| ConductingEquipment {
            terminals: terminals
                .into_iter()
                .enumerate()
                .map(|(i, phases)| {
                    let sequence_number = i as u32 + 1;
                    Arc::new(Terminal::new(
                        format!("{mrid}-t{sequence_number}"),
                        sequence_number,
                        phases,
                        weak.clone(),
                    ))
                })
                .collect(),
            name: name.unwrap_or_else(|| mrid.clone()),
            mrid,
            kind,
            normally_in_service: AtomicBool::new(normally_in_service),
            in_service: AtomicBool::new(in_service),
            normal_open: AtomicU8::new(normal_open.bits()),
            open: AtomicU8::new(open.bits()),
            containers: RwLock::new(BTreeSet::new()),
            current_containers: RwLock::new(BTreeSet::new()),
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_numbered_terminals() {
        let line = EquipmentBuilder::new("line1", EquipmentKind::AcLineSegment)
            .terminals(2, PhaseCode::ABC)
            .build();

        assert_eq!(line.num_terminals(), 2);
        assert_eq!(line.terminals()[0].mrid(), "line1-t1");
        assert_eq!(line.terminal(2).map(|t| t.mrid()), Some("line1-t2"));
        let owner = line.terminals()[1].conducting_equipment().unwrap();
        assert_eq!(owner.mrid(), "line1");
        assert_eq!(line.name(), "line1");
    }

    #[test]
    fn test_open_state_per_phase() {
        let switch = EquipmentBuilder::new("sw", EquipmentKind::Breaker)
            .terminals(2, PhaseCode::ABC)
            .normally_open(PhaseCode::A)
            .build();

        assert!(switch.is_normally_open(Some(SinglePhaseKind::A)));
        assert!(!switch.is_normally_open(Some(SinglePhaseKind::B)));
        assert!(switch.is_normally_open(None));
        assert!(!switch.is_open(None));

        switch.set_open(PhaseCode::BC);
        assert!(switch.is_open(Some(SinglePhaseKind::C)));
    }

    #[test]
    fn test_non_switch_is_never_open() {
        let line = EquipmentBuilder::new("line", EquipmentKind::AcLineSegment)
            .terminals(2, PhaseCode::A)
            .normally_open(PhaseCode::A)
            .build();
        assert!(!line.is_normally_open(None));
    }

    #[test]
    fn test_container_sets() {
        let source = EquipmentBuilder::new("src", EquipmentKind::EnergySource)
            .terminal(PhaseCode::ABC)
            .build();
        assert!(source.add_container("f1"));
        assert!(!source.add_container("f1"));
        assert!(source.add_current_container("f2"));
        assert_eq!(source.containers().into_iter().collect::<Vec<_>>(), vec!["f1"]);
        assert!(source.remove_current_container("f2"));
        assert!(source.current_containers().is_empty());
    }

    #[test]
    fn test_terminal_loses_equipment_when_dropped() {
        let terminal = {
            let equipment = EquipmentBuilder::new("tmp", EquipmentKind::Junction)
                .terminal(PhaseCode::A)
                .build();
            equipment.terminals()[0].clone()
        };
        assert!(terminal.conducting_equipment().is_none());
        assert!(terminal.other_terminals().is_empty());
    }
}
