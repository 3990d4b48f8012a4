use super::{ConductingEquipment, ConnectivityNode};
use crate::phases::{PhaseCode, TracedPhases};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Connection point of a piece of conducting equipment.
///
/// The terminal only holds a weak reference back to its equipment. A terminal
/// whose equipment has been dropped reports no conducting equipment.
pub struct Terminal {
    mrid: String,
    sequence_number: u32,
    phases: PhaseCode,
    equipment: Weak<ConductingEquipment>,
    connectivity_node: RwLock<Option<Arc<ConnectivityNode>>>,
    traced_phases: Mutex<TracedPhases>,
}

impl Terminal {
    pub fn new(
        mrid: impl Into<String>,
        sequence_number: u32,
        phases: PhaseCode,
        equipment: Weak<ConductingEquipment>,
    ) -> Self {
        Self {
            mrid: mrid.into(),
            sequence_number,
            phases,
            equipment,
            connectivity_node: RwLock::new(None),
            traced_phases: Mutex::new(TracedPhases::new()),
        }
    }

    pub fn mrid(&self) -> &str {
        &self.mrid
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn phases(&self) -> PhaseCode {
        self.phases
    }

    pub fn conducting_equipment(&self) -> Option<Arc<ConductingEquipment>> {
        self.equipment.upgrade()
    }

    pub fn connectivity_node(&self) -> Option<Arc<ConnectivityNode>> {
        self.connectivity_node.read().clone()
    }

    pub(crate) fn set_connectivity_node(&self, node: Option<Arc<ConnectivityNode>>) {
        *self.connectivity_node.write() = node;
    }

    pub fn traced_phases(&self) -> MutexGuard<'_, TracedPhases> {
        self.traced_phases.lock()
    }

    /// Other terminals attached to the same connectivity node.
    pub fn connected_terminals(&self) -> Vec<Arc<Terminal>> {
        match self.connectivity_node() {
            Some(node) => node
                .terminals()
                .into_iter()
                .filter(|t| t.mrid != self.mrid)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Other terminals of the owning equipment, in sequence order.
    pub fn other_terminals(&self) -> Vec<Arc<Terminal>> {
        match self.conducting_equipment() {
            Some(equipment) => equipment
                .terminals()
                .iter()
                .filter(|t| t.mrid != self.mrid)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

impl PartialEq for Terminal {
    fn eq(&self, other: &Self) -> bool {
        self.mrid == other.mrid
    }
}

impl Eq for Terminal {}

impl Hash for Terminal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mrid.hash(state);
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("mrid", &self.mrid)
            .field("phases", &self.phases)
            .field("connectivity_node", &self.connectivity_node().map(|n| n.mrid().to_string()))
            .finish()
    }
}
