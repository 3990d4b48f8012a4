use super::Terminal;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// Point where terminals meet with zero impedance between them.
pub struct ConnectivityNode {
    mrid: String,
    terminals: RwLock<Vec<Weak<Terminal>>>,
}

impl ConnectivityNode {
    pub fn new(mrid: impl Into<String>) -> Self {
        Self {
            mrid: mrid.into(),
            terminals: RwLock::new(Vec::new()),
        }
    }

    pub fn mrid(&self) -> &str {
        &self.mrid
    }

    /// Live terminals attached to the node, in attachment order.
    pub fn terminals(&self) -> Vec<Arc<Terminal>> {
        self.terminals.read().iter().filter_map(Weak::upgrade).collect()
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.read().iter().filter(|t| t.strong_count() > 0).count()
    }

    pub(crate) fn add_terminal(&self, terminal: &Arc<Terminal>) {
        let mut terminals = self.terminals.write();
        let already = terminals
            .iter()
            .filter_map(Weak::upgrade)
            .any(|t| t.mrid() == terminal.mrid());
        if !already {
            terminals.push(Arc::downgrade(terminal));
        }
    }

    pub(crate) fn remove_terminal(&self, terminal: &Terminal) {
        self.terminals
            .write()
            .retain(|t| t.upgrade().is_some_and(|t| t.mrid() != terminal.mrid()));
    }
}

impl fmt::Debug for ConnectivityNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terminals: Vec<String> = self.terminals().iter().map(|t| t.mrid().to_string()).collect();
        f.debug_struct("ConnectivityNode")
            .field("mrid", &self.mrid)
            .field("terminals", &terminals)
            .finish()
    }
}
