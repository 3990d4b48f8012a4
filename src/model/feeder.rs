use super::Terminal;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Equipment container energized from a single head terminal.
pub struct Feeder {
    mrid: String,
    name: String,
    normal_head_terminal: Option<Arc<Terminal>>,
    equipment: RwLock<BTreeSet<String>>,
    current_equipment: RwLock<BTreeSet<String>>,
}

impl Feeder {
    pub fn new(mrid: impl Into<String>, normal_head_terminal: Option<Arc<Terminal>>) -> Self {
        let mrid = mrid.into();
        Self {
            name: mrid.clone(),
            mrid,
            normal_head_terminal,
            equipment: RwLock::new(BTreeSet::new()),
            current_equipment: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn mrid(&self) -> &str {
        &self.mrid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normal_head_terminal(&self) -> Option<&Arc<Terminal>> {
        self.normal_head_terminal.as_ref()
    }

    pub fn equipment(&self) -> BTreeSet<String> {
        self.equipment.read().clone()
    }

    pub fn current_equipment(&self) -> BTreeSet<String> {
        self.current_equipment.read().clone()
    }

    pub fn add_equipment(&self, mrid: &str) -> bool {
        self.equipment.write().insert(mrid.to_string())
    }

    pub fn remove_equipment(&self, mrid: &str) -> bool {
        self.equipment.write().remove(mrid)
    }

    pub fn add_current_equipment(&self, mrid: &str) -> bool {
        self.current_equipment.write().insert(mrid.to_string())
    }

    pub fn remove_current_equipment(&self, mrid: &str) -> bool {
        self.current_equipment.write().remove(mrid)
    }

    pub fn clear_equipment(&self) {
        self.equipment.write().clear();
    }

    pub fn clear_current_equipment(&self) {
        self.current_equipment.write().clear();
    }
}

impl fmt::Debug for Feeder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feeder")
            .field("mrid", &self.mrid)
            .field("head", &self.normal_head_terminal.as_ref().map(|t| t.mrid().to_string()))
            .field("equipment", &*self.equipment.read())
            .field("current_equipment", &*self.current_equipment.read())
            .finish()
    }
}
