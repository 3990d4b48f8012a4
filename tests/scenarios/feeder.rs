use super::{feeder_description, feeder_network};
use cim_network_tracing::feeder::AssignToFeeders;
use cim_network_tracing::model::NetworkService;
use cim_network_tracing::network_trace::{NetworkStateOperators, CURRENT, NORMAL};
use cim_network_tracing::phases::PhaseSet;
use std::collections::BTreeSet;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_feeder_stops_at_open_switch() {
    let network = feeder_network();
    AssignToFeeders::new(&NORMAL).run(&network).await.unwrap();

    let feeder = network.get_feeder("feeder").unwrap();
    assert_eq!(feeder.equipment(), set(&["source", "closed_switch"]));
    assert!(network.get_equipment("open_switch").unwrap().containers().is_empty());
    assert!(network.get_equipment("load").unwrap().containers().is_empty());
}

#[tokio::test]
async fn test_closing_switch_extends_current_feeder_only() {
    let network = feeder_network();
    let open_switch = network.get_equipment("open_switch").unwrap();
    CURRENT.set_open(&open_switch, PhaseSet::EMPTY);

    AssignToFeeders::new(&NORMAL).run(&network).await.unwrap();
    AssignToFeeders::new(&CURRENT).run(&network).await.unwrap();

    let feeder = network.get_feeder("feeder").unwrap();
    assert_eq!(feeder.equipment(), set(&["source", "closed_switch"]));
    assert_eq!(
        feeder.current_equipment(),
        set(&["source", "closed_switch", "open_switch", "load"])
    );
    assert_eq!(
        network.get_equipment("load").unwrap().current_containers(),
        set(&["feeder"])
    );
}

#[tokio::test]
async fn test_out_of_service_equipment_not_assigned() {
    let network = feeder_network();
    let closed_switch = network.get_equipment("closed_switch").unwrap();
    NORMAL.set_in_service(&closed_switch, false);

    AssignToFeeders::new(&NORMAL).run(&network).await.unwrap();
    assert_eq!(network.get_feeder("feeder").unwrap().equipment(), set(&["source"]));
}

#[tokio::test]
async fn test_network_loaded_from_file() {
    let path = std::env::temp_dir().join(format!("cim-trace-feeder-{}.json", std::process::id()));
    let raw = serde_json::to_string(&feeder_description()).unwrap();
    tokio::fs::write(&path, raw).await.unwrap();

    let network = NetworkService::load(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.unwrap();

    AssignToFeeders::new(&CURRENT).run(&network).await.unwrap();
    assert_eq!(
        network.get_feeder("feeder").unwrap().current_equipment(),
        set(&["source", "closed_switch"])
    );
}

#[tokio::test]
async fn test_missing_network_file_is_an_error() {
    let path = std::env::temp_dir().join("cim-trace-does-not-exist.json");
    assert!(NetworkService::load(&path).await.is_err());
}
