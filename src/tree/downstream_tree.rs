//! # Downstream Tree
//!
//! Builds a tree of equipment fed from a starting point, following the
//! directions recorded by phase energization. Children are ordered by the
//! number of phases they carry, widest first.

use crate::error::TracingError;
use crate::model::{ConductingEquipment, Terminal};
use crate::network_trace::NetworkStateOperators;
use crate::phases::PhaseDirection;
use crate::traversal::{QueueNext, StepContext, Traversal};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use tracing::debug;

/// One piece of equipment in a downstream tree.
pub struct TreeNode {
    equipment: Arc<ConductingEquipment>,
    /// Dangling for the root.
    parent: Weak<TreeNode>,
    children: RwLock<Vec<Arc<TreeNode>>>,
    /// Phase count of the equipment; wider children sort first.
    sort_weight: usize,
}

impl TreeNode {
    pub fn new(equipment: Arc<ConductingEquipment>, parent: Option<&Arc<TreeNode>>) -> Arc<Self> {
        let sort_weight = equipment.max_phases();
        Arc::new(Self {
            equipment,
            parent: parent.map(Arc::downgrade).unwrap_or_default(),
            children: RwLock::new(Vec::new()),
            sort_weight,
        })
    }

    pub fn equipment(&self) -> &Arc<ConductingEquipment> {
        &self.equipment
    }

    pub fn parent(&self) -> Option<Arc<TreeNode>> {
        self.parent.upgrade()
    }

    pub fn sort_weight(&self) -> usize {
        self.sort_weight
    }

    /// Children, heaviest first. Equal weights keep insertion order.
    pub fn children(&self) -> Vec<Arc<TreeNode>> {
        let mut children = self.children.read().clone();
        children.sort_by_key(|child| Reverse(child.sort_weight));
        children
    }

    pub fn add_child(&self, child: Arc<TreeNode>) {
        self.children.write().push(child);
    }

    /// Number of nodes below this one.
    pub fn descendants(&self) -> usize {
        let mut count = 0;
        let mut pending = self.children();
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children());
        }
        count
    }

    pub fn summary(&self) -> TreeSummary {
        TreeSummary {
            mrid: self.equipment.mrid().to_string(),
            children: self.children().iter().map(|child| child.summary()).collect(),
        }
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        self.equipment == other.equipment
    }
}

impl Eq for TreeNode {}

impl Hash for TreeNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.equipment.hash(state);
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("equipment", &self.equipment.mrid())
            .field("sort_weight", &self.sort_weight)
            .field("children", &self.children.read().len())
            .finish()
    }
}

/// Serializable copy of a tree, children in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSummary {
    pub mrid: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeSummary>,
}

pub struct DownstreamTree {
    state: &'static dyn NetworkStateOperators,
}

impl DownstreamTree {
    pub fn new(state: &'static dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Phases must already be applied in the chosen state.
    pub async fn run(&self, start: Arc<ConductingEquipment>) -> Result<Arc<TreeNode>> {
        let root = TreeNode::new(start, None);
        let weight = |node: &Arc<TreeNode>| node.sort_weight() as i64;

        let mut traversal = Traversal::new(
            format!("downstream tree from {}", root.equipment().mrid()),
            Downstream { state: self.state },
        )
        .with_priority(weight)
        .branching_with_priority(weight);

        traversal.add_step_fn(|node: &Arc<TreeNode>, _| {
            if let Some(parent) = node.parent() {
                parent.add_child(node.clone());
            }
            Ok(())
        });

        traversal.run_from([root.clone()], false).await?;
        debug!(
            root = root.equipment().mrid(),
            nodes = root.descendants() + 1,
            branches = traversal.stats().branches,
            "downstream tree built"
        );
        Ok(root)
    }
}

struct Downstream {
    state: &'static dyn NetworkStateOperators,
}

impl Downstream {
    fn feeds_out(&self, terminal: &Arc<Terminal>, equipment: &ConductingEquipment) -> bool {
        terminal.phases().single_phases().iter().any(|nominal| {
            !self.state.is_open(equipment, Some(*nominal))
                && self
                    .state
                    .phase_status(terminal, *nominal)
                    .direction()
                    .has(PhaseDirection::Out)
        })
    }
}

#[async_trait]
impl QueueNext<Arc<TreeNode>> for Downstream {
    async fn next_items(&self, node: &Arc<TreeNode>, _context: &StepContext) -> Result<Vec<Arc<TreeNode>>> {
        let parent = node.parent();
        let mut next = Vec::new();

        for terminal in node.equipment().terminals() {
            if !self.feeds_out(terminal, node.equipment()) {
                continue;
            }
            for connected in terminal.connected_terminals() {
                let equipment = connected
                    .conducting_equipment()
                    .ok_or_else(|| TracingError::MissingEquipment(connected.mrid().to_string()))?;
                if parent.as_ref().is_some_and(|p| p.equipment() == &equipment) {
                    continue;
                }
                let queued = next.iter().any(|n: &Arc<TreeNode>| n.equipment() == &equipment);
                if queued || !self.state.is_in_service(&equipment) {
                    continue;
                }
                next.push(TreeNode::new(equipment, Some(node)));
            }
        }
        Ok(next)
    }
}
