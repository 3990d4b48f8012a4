//! # Network State Operators
//!
//! A network can be traced in its normal (as designed) state or its current
//! (as operated) state. The operators hide which set of switch positions,
//! in-service flags, traced phases and container links a trace reads and
//! writes, so the same trace code serves both states.

use crate::model::{ConductingEquipment, Feeder, Terminal};
use crate::phases::{CurrentPhases, NormalPhases, PhaseDirection, PhaseSet, PhaseStatus, SinglePhaseKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

pub trait NetworkStateOperators: Send + Sync + fmt::Debug {
    fn state(&self) -> NetworkState;

    /// With no phase, reports open if any phase is open.
    fn is_open(&self, equipment: &ConductingEquipment, phase: Option<SinglePhaseKind>) -> bool;

    fn set_open(&self, equipment: &ConductingEquipment, phases: PhaseSet);

    fn is_in_service(&self, equipment: &ConductingEquipment) -> bool;

    fn set_in_service(&self, equipment: &ConductingEquipment, in_service: bool);

    fn phase_status(&self, terminal: &Arc<Terminal>, nominal: SinglePhaseKind) -> Box<dyn PhaseStatus>;

    /// Flow through the terminal across all of its nominal phases. A
    /// terminal fed in on one phase and out on another reports BOTH.
    fn terminal_direction(&self, terminal: &Arc<Terminal>) -> PhaseDirection {
        terminal
            .phases()
            .single_phases()
            .iter()
            .fold(PhaseDirection::None, |direction, nominal| {
                direction + self.phase_status(terminal, *nominal).direction()
            })
    }

    fn containers(&self, equipment: &ConductingEquipment) -> BTreeSet<String>;

    fn container_equipment(&self, feeder: &Feeder) -> BTreeSet<String>;

    fn add_equipment_to_container(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool;

    fn add_container_to_equipment(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool;

    fn remove_equipment_from_container(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool;

    fn remove_container_from_equipment(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool;

    /// Links both directions. Returns true if either side changed.
    fn associate_equipment_and_container(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        let added_equipment = self.add_equipment_to_container(equipment, feeder);
        let added_container = self.add_container_to_equipment(equipment, feeder);
        added_equipment || added_container
    }

    fn disassociate_equipment_and_container(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        let removed_equipment = self.remove_equipment_from_container(equipment, feeder);
        let removed_container = self.remove_container_from_equipment(equipment, feeder);
        removed_equipment || removed_container
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalNetworkStateOperators;

#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentNetworkStateOperators;

pub static NORMAL: NormalNetworkStateOperators = NormalNetworkStateOperators;
pub static CURRENT: CurrentNetworkStateOperators = CurrentNetworkStateOperators;

impl NetworkStateOperators for NormalNetworkStateOperators {
    fn state(&self) -> NetworkState {
        NetworkState::Normal
    }

    fn is_open(&self, equipment: &ConductingEquipment, phase: Option<SinglePhaseKind>) -> bool {
        equipment.is_normally_open(phase)
    }

    fn set_open(&self, equipment: &ConductingEquipment, phases: PhaseSet) {
        equipment.set_normally_open(phases);
    }

    fn is_in_service(&self, equipment: &ConductingEquipment) -> bool {
        equipment.normally_in_service()
    }

    fn set_in_service(&self, equipment: &ConductingEquipment, in_service: bool) {
        equipment.set_normally_in_service(in_service);
    }

    fn phase_status(&self, terminal: &Arc<Terminal>, nominal: SinglePhaseKind) -> Box<dyn PhaseStatus> {
        Box::new(NormalPhases::new(terminal.clone(), nominal))
    }

    fn containers(&self, equipment: &ConductingEquipment) -> BTreeSet<String> {
        equipment.containers()
    }

    fn container_equipment(&self, feeder: &Feeder) -> BTreeSet<String> {
        feeder.equipment()
    }

    fn add_equipment_to_container(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        feeder.add_equipment(equipment.mrid())
    }

    fn add_container_to_equipment(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        equipment.add_container(feeder.mrid())
    }

    fn remove_equipment_from_container(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        feeder.remove_equipment(equipment.mrid())
    }

    fn remove_container_from_equipment(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        equipment.remove_container(feeder.mrid())
    }
}

impl NetworkStateOperators for CurrentNetworkStateOperators {
    fn state(&self) -> NetworkState {
        NetworkState::Current
    }

    fn is_open(&self, equipment: &ConductingEquipment, phase: Option<SinglePhaseKind>) -> bool {
        equipment.is_open(phase)
    }

    fn set_open(&self, equipment: &ConductingEquipment, phases: PhaseSet) {
        equipment.set_open(phases);
    }

    fn is_in_service(&self, equipment: &ConductingEquipment) -> bool {
        equipment.in_service()
    }

    fn set_in_service(&self, equipment: &ConductingEquipment, in_service: bool) {
        equipment.set_in_service(in_service);
    }

    fn phase_status(&self, terminal: &Arc<Terminal>, nominal: SinglePhaseKind) -> Box<dyn PhaseStatus> {
        Box::new(CurrentPhases::new(terminal.clone(), nominal))
    }

    fn containers(&self, equipment: &ConductingEquipment) -> BTreeSet<String> {
        equipment.current_containers()
    }

    fn container_equipment(&self, feeder: &Feeder) -> BTreeSet<String> {
        feeder.current_equipment()
    }

    fn add_equipment_to_container(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        feeder.add_current_equipment(equipment.mrid())
    }

    fn add_container_to_equipment(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        equipment.add_current_container(feeder.mrid())
    }

    fn remove_equipment_from_container(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        feeder.remove_current_equipment(equipment.mrid())
    }

    fn remove_container_from_equipment(&self, equipment: &ConductingEquipment, feeder: &Feeder) -> bool {
        equipment.remove_current_container(feeder.mrid())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    Normal,
    Current,
}

impl NetworkState {
    pub fn operators(self) -> &'static dyn NetworkStateOperators {
        match self {
            Self::Normal => &NORMAL,
            Self::Current => &CURRENT,
        }
    }
}
