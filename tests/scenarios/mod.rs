#![cfg(test)]

mod branching;
mod feeder;
mod phases;

use cim_network_tracing::model::{NetworkDescription, NetworkService};
use serde_json::json;

/// source - closed_switch - open_switch - load, fed from the source.
pub fn feeder_description() -> NetworkDescription {
    serde_json::from_value(json!({
        "equipment": [
            { "mrid": "source", "kind": "energy_source", "terminals": ["ABC"] },
            { "mrid": "closed_switch", "kind": "breaker", "terminals": ["ABC", "ABC"] },
            { "mrid": "open_switch", "kind": "disconnector", "terminals": ["ABC", "ABC"], "normally_open": "ABC" },
            { "mrid": "load", "kind": "energy_consumer", "terminals": ["ABC"] }
        ],
        "connections": [
            { "node": "n1", "terminals": ["source-t1", "closed_switch-t1"] },
            { "node": "n2", "terminals": ["closed_switch-t2", "open_switch-t1"] },
            { "node": "n3", "terminals": ["open_switch-t2", "load-t1"] }
        ],
        "feeders": [ { "mrid": "feeder", "head_terminal": "source-t1" } ]
    }))
    .expect("valid description")
}

pub fn feeder_network() -> NetworkService {
    NetworkService::from_description(&feeder_description()).expect("valid network")
}

/// A chain of `count` two terminal lines, `line0` to `line{count-1}`.
pub fn line_chain(count: usize) -> NetworkService {
    let equipment: Vec<_> = (0..count)
        .map(|i| json!({ "mrid": format!("line{i}"), "kind": "ac_line_segment", "terminals": ["ABC", "ABC"] }))
        .collect();
    let connections: Vec<_> = (1..count)
        .map(|i| json!({ "node": format!("n{i}"), "terminals": [format!("line{}-t2", i - 1), format!("line{i}-t1")] }))
        .collect();
    let description: NetworkDescription =
        serde_json::from_value(json!({ "equipment": equipment, "connections": connections })).expect("valid chain");
    NetworkService::from_description(&description).expect("valid network")
}
