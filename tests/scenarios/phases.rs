use super::feeder_network;
use cim_network_tracing::model::NetworkService;
use cim_network_tracing::network_trace::{NetworkState, NetworkStateOperators, CURRENT};
use cim_network_tracing::phases::{PhaseCode, PhaseDirection, PhaseSet, RemovePhases, SetPhases, SinglePhaseKind};
use rstest::rstest;

fn direction(network: &NetworkService, state: NetworkState, terminal: &str) -> PhaseDirection {
    let terminal = network.get_terminal(terminal).unwrap();
    state
        .operators()
        .phase_status(&terminal, SinglePhaseKind::B)
        .direction()
}

#[rstest]
#[case("source-t1", PhaseDirection::Out)]
#[case("closed_switch-t1", PhaseDirection::In)]
#[case("closed_switch-t2", PhaseDirection::Out)]
#[case("open_switch-t1", PhaseDirection::In)]
#[case("open_switch-t2", PhaseDirection::None)]
#[case("load-t1", PhaseDirection::None)]
#[tokio::test]
async fn test_normal_directions(#[case] terminal: &str, #[case] expected: PhaseDirection) {
    let network = feeder_network();
    SetPhases::new(NetworkState::Normal.operators())
        .run(&network)
        .await
        .unwrap();
    assert_eq!(direction(&network, NetworkState::Normal, terminal), expected);
}

#[tokio::test]
async fn test_states_are_energized_independently() {
    let network = feeder_network();
    CURRENT.set_open(&network.get_equipment("open_switch").unwrap(), PhaseSet::EMPTY);

    for state in [NetworkState::Normal, NetworkState::Current] {
        SetPhases::new(state.operators()).run(&network).await.unwrap();
    }

    assert_eq!(direction(&network, NetworkState::Normal, "load-t1"), PhaseDirection::None);
    assert_eq!(direction(&network, NetworkState::Current, "load-t1"), PhaseDirection::In);
    assert_eq!(direction(&network, NetworkState::Current, "open_switch-t2"), PhaseDirection::Out);
}

#[tokio::test]
async fn test_rerun_keeps_directions() {
    let network = feeder_network();
    let set_phases = SetPhases::new(NetworkState::Normal.operators());
    set_phases.run(&network).await.unwrap();
    set_phases.run(&network).await.unwrap();
    assert_eq!(direction(&network, NetworkState::Normal, "closed_switch-t1"), PhaseDirection::In);
}

#[tokio::test]
async fn test_reapply_after_switch_opens() {
    let network = feeder_network();
    CURRENT.set_open(&network.get_equipment("open_switch").unwrap(), PhaseSet::EMPTY);
    SetPhases::new(&CURRENT).run(&network).await.unwrap();
    assert_eq!(direction(&network, NetworkState::Current, "load-t1"), PhaseDirection::In);

    CURRENT.set_open(&network.get_equipment("closed_switch").unwrap(), PhaseCode::ABC.phase_set());
    SetPhases::new(&CURRENT).run(&network).await.unwrap();
    // Energizing only adds, so the stale feed survives.
    assert_eq!(direction(&network, NetworkState::Current, "load-t1"), PhaseDirection::In);

    RemovePhases::new(&CURRENT).remove_all(&network);
    SetPhases::new(&CURRENT).run(&network).await.unwrap();
    assert_eq!(direction(&network, NetworkState::Current, "load-t1"), PhaseDirection::None);
    assert_eq!(direction(&network, NetworkState::Current, "closed_switch-t1"), PhaseDirection::In);
    assert_eq!(direction(&network, NetworkState::Normal, "closed_switch-t2"), PhaseDirection::None);
}
