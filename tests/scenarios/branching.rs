use super::line_chain;
use cim_network_tracing::model::{EquipmentBuilder, EquipmentKind, NetworkService};
use cim_network_tracing::network_trace::{Conditions, NetworkTrace, Tracing, NORMAL};
use cim_network_tracing::phases::PhaseCode;
use cim_network_tracing::traversal::{FnQueueNext, SearchType, StepContext, Traversal};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

type Graph = Arc<BTreeMap<u32, Vec<u32>>>;

fn graph(edges: &[(u32, u32)]) -> Graph {
    let mut adjacency: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for &(from, to) in edges {
        adjacency.entry(from).or_default().push(to);
        adjacency.entry(to).or_default();
    }
    Arc::new(adjacency)
}

fn traversal(graph: Graph) -> Traversal<u32> {
    Traversal::new(
        "graph",
        FnQueueNext::new(move |node: &u32, _: &StepContext| Ok(graph.get(node).cloned().unwrap_or_default())),
    )
}

fn record(traversal: &mut Traversal<u32>) -> Arc<Mutex<Vec<(u32, usize)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    traversal.add_step_fn(move |node: &u32, context: &StepContext| {
        sink.lock().push((*node, context.branch_depth));
        Ok(())
    });
    seen
}

#[tokio::test]
async fn test_branches_walk_shared_successor_independently() {
    // 0 forks to 1 and 2, both of which lead to 3.
    let diamond = graph(&[(0, 1), (0, 2), (1, 3), (2, 3)]);

    let mut plain = traversal(diamond.clone());
    let plain_seen = record(&mut plain);
    plain.run_from([0], true).await.unwrap();
    assert_eq!(plain_seen.lock().iter().filter(|(node, _)| *node == 3).count(), 1);

    let mut branching = traversal(diamond).branching();
    let branch_seen = record(&mut branching);
    branching.run_from([0], true).await.unwrap();

    let seen = branch_seen.lock();
    assert_eq!(seen.iter().filter(|(node, _)| *node == 3).count(), 2);
    assert!(seen.iter().filter(|(node, _)| *node != 0).all(|(_, depth)| *depth == 1));
    assert_eq!(branching.stats().branches, 2);
}

/// src feeds a three terminal junction whose two outgoing lines meet again
/// at the load.
fn rejoining_lines() -> NetworkService {
    let mut network = NetworkService::new();
    let mut create = |mrid: &str, kind: EquipmentKind, terminals: usize| {
        network
            .create(EquipmentBuilder::new(mrid, kind).terminals(terminals, PhaseCode::ABC))
            .unwrap()
    };
    let src = create("src", EquipmentKind::EnergySource, 1);
    let junction = create("j", EquipmentKind::Junction, 3);
    let a = create("a", EquipmentKind::AcLineSegment, 2);
    let b = create("b", EquipmentKind::AcLineSegment, 2);
    let load = create("load", EquipmentKind::EnergyConsumer, 1);

    network.connect_terminals(&src.terminals()[0], &junction.terminals()[0]);
    network.connect_terminals(&junction.terminals()[1], &a.terminals()[0]);
    network.connect_terminals(&junction.terminals()[2], &b.terminals()[0]);
    network.connect(&a.terminals()[1], "far");
    network.connect(&b.terminals()[1], "far");
    network.connect(&load.terminals()[0], "far");
    network
}

fn record_network(trace: &mut NetworkTrace<()>) -> Arc<Mutex<Vec<(String, usize)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    trace.add_step_fn(move |step, context| {
        sink.lock()
            .push((step.path.to_equipment()?.mrid().to_string(), context.branch_depth));
        Ok(())
    });
    seen
}

#[tokio::test]
async fn test_branching_network_trace_reaches_load_along_each_line() {
    let network = rejoining_lines();
    let start = network.get_terminal("src-t1").unwrap();

    let mut plain = Tracing::network_trace(&NORMAL);
    let plain_seen = record_network(&mut plain);
    plain.run_from(start.clone(), (), false).await.unwrap();
    assert_eq!(plain_seen.lock().iter().filter(|(mrid, _)| mrid == "load").count(), 1);

    let mut branching = Tracing::network_trace_branching(&NORMAL);
    let seen = record_network(&mut branching);
    branching.run_from(start, (), false).await.unwrap();

    let seen = seen.lock();
    assert!(seen.contains(&("src".to_string(), 0)));
    assert!(seen.contains(&("j".to_string(), 0)));
    assert!(seen.iter().filter(|(mrid, _)| mrid == "load").count() >= 2);
    assert!(seen
        .iter()
        .filter(|(mrid, _)| ["a", "b", "load"].contains(&mrid.as_str()))
        .all(|(_, depth)| *depth >= 1));
    assert!(branching.stats().branches >= 2);
}

#[tokio::test]
async fn test_equipment_step_limit_on_chain() {
    let network = line_chain(5);
    let seen = Arc::new(Mutex::new(BTreeSet::new()));
    let sink = seen.clone();

    let mut trace = Tracing::network_trace(&NORMAL);
    trace.add_stop_condition(Conditions::limit_equipment_steps(2));
    trace.add_step_fn(move |step, _| {
        sink.lock().insert(step.path.to_equipment()?.mrid().to_string());
        Ok(())
    });
    trace
        .run_from(network.get_terminal("line0-t2").unwrap(), (), false)
        .await
        .unwrap();

    let expected: BTreeSet<String> = ["line0", "line1", "line2"].iter().map(|s| s.to_string()).collect();
    assert_eq!(*seen.lock(), expected);
}

#[tokio::test]
async fn test_breadth_first_chain_order() {
    let network = line_chain(4);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let mut trace = Tracing::network_trace(&NORMAL).with_search_type(SearchType::Breadth);
    trace.add_step_fn(move |step, _| {
        sink.lock().push(step.path.to_equipment()?.mrid().to_string());
        Ok(())
    });
    trace
        .run_from_equipment(&network.get_equipment("line1").unwrap(), (), false)
        .await
        .unwrap();

    // Both start terminals are actioned before anything further out.
    assert_eq!(*seen.lock(), vec!["line1", "line1", "line0", "line2", "line3"]);
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_every_reachable_node_visited_once(edges in prop::collection::vec((0u32..12, 0u32..12), 0..40)) {
        let graph = graph(&edges);
        let mut reachable = BTreeSet::from([0u32]);
        let mut pending = vec![0u32];
        while let Some(node) = pending.pop() {
            for next in graph.get(&node).into_iter().flatten() {
                if reachable.insert(*next) {
                    pending.push(*next);
                }
            }
        }

        let mut walk = traversal(graph);
        let seen = record(&mut walk);
        block_on(walk.run_from([0], true)).unwrap();

        let visited: Vec<u32> = seen.lock().iter().map(|(node, _)| *node).collect();
        let unique: BTreeSet<u32> = visited.iter().copied().collect();
        prop_assert_eq!(visited.len(), unique.len());
        prop_assert_eq!(unique, reachable);
    }
}
