use super::NetworkTraceStep;
use crate::phases::PhaseSet;
use crate::traversal::{TraceItem, Tracker};
use std::collections::HashSet;

/// Tracks visits by destination terminal and traced phases, so the same
/// terminal can be revisited on a different set of phases.
#[derive(Debug, Clone, Default)]
pub struct NetworkTraceTracker {
    visited: HashSet<(String, PhaseSet)>,
}

impl NetworkTraceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn key<D>(step: &NetworkTraceStep<D>) -> (String, PhaseSet) {
        (step.path.to_terminal.mrid().to_string(), step.path.phases)
    }

    /// Whether the terminal has been visited on any phases.
    pub fn has_visited_terminal(&self, mrid: &str) -> bool {
        self.visited.iter().any(|(terminal, _)| terminal == mrid)
    }
}

impl<D: TraceItem> Tracker<NetworkTraceStep<D>> for NetworkTraceTracker {
    fn has_visited(&self, item: &NetworkTraceStep<D>) -> bool {
        self.visited.contains(&Self::key(item))
    }

    fn visit(&mut self, item: &NetworkTraceStep<D>) -> bool {
        self.visited.insert(Self::key(item))
    }

    fn clear(&mut self) {
        self.visited.clear();
    }

    fn copy(&self) -> Box<dyn Tracker<NetworkTraceStep<D>>> {
        Box::new(self.clone())
    }

    fn len(&self) -> usize {
        self.visited.len()
    }
}
