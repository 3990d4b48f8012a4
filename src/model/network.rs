use super::{ConductingEquipment, ConnectivityNode, EquipmentBuilder, EquipmentKind, Feeder, Location, Terminal};
use crate::error::{TracingError, TracingResult};
use crate::phases::PhaseCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Owns every object of a network and wires terminals to connectivity nodes.
#[derive(Debug, Default)]
pub struct NetworkService {
    equipment: BTreeMap<String, Arc<ConductingEquipment>>,
    terminals: BTreeMap<String, Arc<Terminal>>,
    nodes: BTreeMap<String, Arc<ConnectivityNode>>,
    feeders: BTreeMap<String, Arc<Feeder>>,
    next_node_id: usize,
}

impl NetworkService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_equipment(&mut self, equipment: Arc<ConductingEquipment>) -> TracingResult<Arc<ConductingEquipment>> {
        if self.equipment.contains_key(equipment.mrid()) {
            return Err(TracingError::InvalidNetwork(format!(
                "duplicate equipment mRID {}",
                equipment.mrid()
            )));
        }
        for terminal in equipment.terminals() {
            self.terminals.insert(terminal.mrid().to_string(), terminal.clone());
        }
        self.equipment.insert(equipment.mrid().to_string(), equipment.clone());
        Ok(equipment)
    }

    /// Builds and registers equipment in one go.
    pub fn create(&mut self, builder: EquipmentBuilder) -> TracingResult<Arc<ConductingEquipment>> {
        self.add_equipment(builder.build())
    }

    pub fn add_feeder(&mut self, feeder: Feeder) -> Arc<Feeder> {
        let feeder = Arc::new(feeder);
        self.feeders.insert(feeder.mrid().to_string(), feeder.clone());
        feeder
    }

    /// Attaches the terminal to the named node, creating the node if needed.
    /// The terminal is detached from any node it was on before.
    pub fn connect(&mut self, terminal: &Arc<Terminal>, node_mrid: &str) -> Arc<ConnectivityNode> {
        self.disconnect(terminal);
        let node = self
            .nodes
            .entry(node_mrid.to_string())
            .or_insert_with(|| Arc::new(ConnectivityNode::new(node_mrid)))
            .clone();
        node.add_terminal(terminal);
        terminal.set_connectivity_node(Some(node.clone()));
        node
    }

    /// Puts both terminals on a shared node. When they sit on different
    /// nodes, everything on b's node moves over to a's and b's node is
    /// dropped.
    pub fn connect_terminals(&mut self, a: &Arc<Terminal>, b: &Arc<Terminal>) -> Arc<ConnectivityNode> {
        match (a.connectivity_node(), b.connectivity_node()) {
            (Some(na), Some(nb)) if Arc::ptr_eq(&na, &nb) => na,
            (Some(na), Some(nb)) => {
                for terminal in nb.terminals() {
                    self.connect(&terminal, na.mrid());
                }
                self.nodes.remove(nb.mrid());
                debug!(kept = na.mrid(), merged = nb.mrid(), "connectivity nodes merged");
                na
            }
            (Some(node), None) => self.connect(b, node.mrid()),
            (None, Some(node)) => self.connect(a, node.mrid()),
            (None, None) => {
                self.next_node_id += 1;
                let mrid = format!("cn{}", self.next_node_id);
                self.connect(a, &mrid);
                self.connect(b, &mrid)
            }
        }
    }

    pub fn disconnect(&mut self, terminal: &Terminal) {
        if let Some(node) = terminal.connectivity_node() {
            node.remove_terminal(terminal);
            terminal.set_connectivity_node(None);
        }
    }

    pub fn get_equipment(&self, mrid: &str) -> TracingResult<Arc<ConductingEquipment>> {
        self.equipment
            .get(mrid)
            .cloned()
            .ok_or_else(|| TracingError::UnknownObject(mrid.to_string()))
    }

    pub fn get_terminal(&self, mrid: &str) -> TracingResult<Arc<Terminal>> {
        self.terminals
            .get(mrid)
            .cloned()
            .ok_or_else(|| TracingError::UnknownObject(mrid.to_string()))
    }

    pub fn get_feeder(&self, mrid: &str) -> TracingResult<Arc<Feeder>> {
        self.feeders
            .get(mrid)
            .cloned()
            .ok_or_else(|| TracingError::UnknownObject(mrid.to_string()))
    }

    pub fn equipment(&self) -> impl Iterator<Item = &Arc<ConductingEquipment>> {
        self.equipment.values()
    }

    pub fn feeders(&self) -> impl Iterator<Item = &Arc<Feeder>> {
        self.feeders.values()
    }

    /// Head terminals of every feeder that has one, in feeder mRID order.
    pub fn feeder_head_terminals(&self) -> Vec<Arc<Terminal>> {
        self.feeders
            .values()
            .filter_map(|feeder| feeder.normal_head_terminal().cloned())
            .collect()
    }

    pub fn connectivity_nodes(&self) -> impl Iterator<Item = &Arc<ConnectivityNode>> {
        self.nodes.values()
    }

    pub fn from_description(description: &NetworkDescription) -> TracingResult<Self> {
        let mut network = Self::new();

        for item in &description.equipment {
            let mut builder = EquipmentBuilder::new(&item.mrid, item.kind)
                .in_service(item.normally_in_service, item.in_service);
            if let Some(name) = &item.name {
                builder = builder.name(name);
            }
            for phases in &item.terminals {
                builder = builder.terminal(*phases);
            }
            if let Some(open) = item.normally_open {
                builder = builder.normally_open(open);
            }
            if let Some(open) = item.currently_open.or(item.normally_open) {
                builder = builder.currently_open(open);
            }
            if let Some(location) = &item.location {
                builder = builder.location(location.clone());
            }
            network.create(builder)?;
        }

        for connection in &description.connections {
            for terminal in &connection.terminals {
                let terminal = network.get_terminal(terminal)?;
                network.connect(&terminal, &connection.node);
            }
        }

        for item in &description.feeders {
            let head = network.get_terminal(&item.head_terminal)?;
            let mut feeder = Feeder::new(&item.mrid, Some(head));
            if let Some(name) = &item.name {
                feeder = feeder.with_name(name);
            }
            network.add_feeder(feeder);
        }

        debug!(
            equipment = network.equipment.len(),
            nodes = network.nodes.len(),
            feeders = network.feeders.len(),
            "network loaded"
        );
        Ok(network)
    }

    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let description: NetworkDescription = serde_json::from_str(&raw)?;
        Ok(Self::from_description(&description)?)
    }
}

/// Serialized form of a network, as read by the `cim-trace` binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkDescription {
    #[serde(default)]
    pub equipment: Vec<EquipmentDescription>,
    #[serde(default)]
    pub connections: Vec<ConnectionDescription>,
    #[serde(default)]
    pub feeders: Vec<FeederDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentDescription {
    pub mrid: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: EquipmentKind,
    pub terminals: Vec<PhaseCode>,
    #[serde(default)]
    pub normally_open: Option<PhaseCode>,
    /// Defaults to the normal open state when absent.
    #[serde(default)]
    pub currently_open: Option<PhaseCode>,
    #[serde(default = "default_in_service")]
    pub normally_in_service: bool,
    #[serde(default = "default_in_service")]
    pub in_service: bool,
    #[serde(default)]
    pub location: Option<Location>,
}

fn default_in_service() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub node: String,
    pub terminals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeederDescription {
    pub mrid: String,
    #[serde(default)]
    pub name: Option<String>,
    pub head_terminal: String,
}
