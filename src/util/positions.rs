use crate::model::{ConductingEquipment, PositionPoint};
use crate::traversal::{FnQueueNext, SearchType, Traversal};
use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Location points of one piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentPosition {
    pub mrid: String,
    pub points: Vec<PositionPoint>,
}

/// Walks equipment to equipment through connectivity nodes, ignoring switch
/// state and phases.
pub fn connected_equipment_trace(search_type: SearchType) -> Traversal<Arc<ConductingEquipment>> {
    Traversal::new(
        "connected equipment",
        FnQueueNext::new(|equipment: &Arc<ConductingEquipment>, _| {
            Ok(equipment
                .terminals()
                .iter()
                .flat_map(|terminal| terminal.connected_terminals())
                .filter_map(|terminal| terminal.conducting_equipment())
                .collect())
        }),
    )
    .with_search_type(search_type)
}

/// Collects the location of every piece of equipment connected to `start`,
/// in visiting order. Equipment without a location is skipped.
pub async fn extract_positions(
    start: Arc<ConductingEquipment>,
    search_type: SearchType,
) -> Result<Vec<EquipmentPosition>> {
    let positions = Arc::new(Mutex::new(Vec::new()));
    let sink = positions.clone();

    let mut trace = connected_equipment_trace(search_type);
    trace.add_step_fn(move |equipment: &Arc<ConductingEquipment>, _| {
        if let Some(location) = equipment.location().filter(|l| !l.points.is_empty()) {
            sink.lock().push(EquipmentPosition {
                mrid: equipment.mrid().to_string(),
                points: location.points.clone(),
            });
        }
        Ok(())
    });
    trace.run_from([start], false).await?;

    let positions = std::mem::take(&mut *positions.lock());
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EquipmentBuilder, EquipmentKind, Location, NetworkService};
    use crate::phases::PhaseCode;

    fn point(x: f64, y: f64) -> PositionPoint {
        PositionPoint {
            x_position: x,
            y_position: y,
        }
    }

    fn located(mrid: &str, points: Vec<PositionPoint>) -> EquipmentBuilder {
        EquipmentBuilder::new(mrid, EquipmentKind::AcLineSegment)
            .terminals(2, PhaseCode::ABC)
            .location(Location { points })
    }

    /// a - sw(open) - b - c, where c has no location.
    fn network() -> NetworkService {
        let mut network = NetworkService::new();
        let a = network.create(located("a", vec![point(1.0, 2.0)])).unwrap();
        let sw = network
            .create(
                EquipmentBuilder::new("sw", EquipmentKind::Disconnector)
                    .terminals(2, PhaseCode::ABC)
                    .normally_open(PhaseCode::ABC)
                    .location(Location {
                        points: vec![point(3.0, 4.0)],
                    }),
            )
            .unwrap();
        let b = network
            .create(located("b", vec![point(5.0, 6.0), point(7.0, 8.0)]))
            .unwrap();
        let c = network
            .create(EquipmentBuilder::new("c", EquipmentKind::EnergyConsumer).terminal(PhaseCode::ABC))
            .unwrap();
        network.connect_terminals(&a.terminals()[1], &sw.terminals()[0]);
        network.connect_terminals(&sw.terminals()[1], &b.terminals()[0]);
        network.connect_terminals(&b.terminals()[1], &c.terminals()[0]);
        network
    }

    #[tokio::test]
    async fn test_positions_ignore_switch_state() {
        let network = network();
        let positions = extract_positions(network.get_equipment("a").unwrap(), SearchType::Breadth)
            .await
            .unwrap();

        let mrids: Vec<&str> = positions.iter().map(|p| p.mrid.as_str()).collect();
        assert_eq!(mrids, vec!["a", "sw", "b"]);
        assert_eq!(positions[2].points, vec![point(5.0, 6.0), point(7.0, 8.0)]);
    }

    #[tokio::test]
    async fn test_connected_equipment_trace_visits_each_once() {
        let network = network();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut trace = connected_equipment_trace(SearchType::Depth);
        trace.add_step_fn(move |equipment: &Arc<ConductingEquipment>, _| {
            sink.lock().push(equipment.mrid().to_string());
            Ok(())
        });
        trace
            .run_from([network.get_equipment("c").unwrap()], false)
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec!["c", "b", "sw", "a"]);
    }
}
