use anyhow::{Context, Result};
use cim_network_tracing::{config, feeder, model, network_trace, phases, telemetry, tree, util};
use config::{Config, TraceConfig};
use feeder::AssignToFeeders;
use itertools::Itertools;
use model::NetworkService;
use network_trace::{Conditions, NetworkState, Tracing};
use parking_lot::Mutex;
use phases::SetPhases;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use telemetry::init_tracing;
use tracing::{info, warn};
use tree::{DownstreamTree, TreeSummary};
use util::{extract_positions, EquipmentPosition};

#[derive(Debug, Serialize)]
struct StateReport {
    state: NetworkState,
    feeders: BTreeMap<String, BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    downstream: Option<TreeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reachable: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct Report {
    states: Vec<StateReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    positions: Vec<EquipmentPosition>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load().context("loading configuration")?;
    init_tracing(&cfg.logging);

    let network = NetworkService::load(&cfg.trace.network_file)
        .await
        .with_context(|| format!("loading network from {}", cfg.trace.network_file.display()))?;

    info!(
        file = %cfg.trace.network_file.display(),
        feeders = %network.feeders().map(|f| f.mrid()).join(","),
        "network ready"
    );

    let mut states = Vec::new();
    for state in cfg.trace.state.states() {
        states.push(trace_state(&network, &cfg.trace, state).await?);
    }

    let positions = match &cfg.trace.start_equipment {
        Some(mrid) => extract_positions(network.get_equipment(mrid)?, cfg.trace.search_type).await?,
        None => Vec::new(),
    };

    let report = Report { states, positions };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn trace_state(network: &NetworkService, trace: &TraceConfig, state: NetworkState) -> Result<StateReport> {
    let operators = state.operators();

    SetPhases::new(operators)
        .run_if_fed(network)
        .await
        .with_context(|| format!("applying {state} phases"))?;
    AssignToFeeders::new(operators)
        .run(network)
        .await
        .with_context(|| format!("assigning {state} feeders"))?;

    let feeders: BTreeMap<String, BTreeSet<String>> = network
        .feeders()
        .map(|feeder| (feeder.mrid().to_string(), operators.container_equipment(feeder)))
        .collect();
    for (feeder, equipment) in &feeders {
        if equipment.is_empty() {
            warn!(%state, feeder = feeder.as_str(), "feeder has no equipment");
        }
    }

    let (downstream, reachable) = match &trace.start_equipment {
        Some(mrid) => {
            let start = network.get_equipment(mrid)?;
            let root = DownstreamTree::new(operators).run(start.clone()).await?;

            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = seen.clone();
            let mut reach = Tracing::network_trace(operators).with_search_type(trace.search_type);
            reach.add_queue_condition(Conditions::stop_at_open(operators));
            if let Some(limit) = trace.step_limit {
                reach.add_stop_condition(Conditions::limit_equipment_steps(limit));
            }
            reach.add_step_fn(move |step, _| {
                sink.lock().push(step.path.to_equipment()?.mrid().to_string());
                Ok(())
            });
            reach.run_from_equipment(&start, (), false).await?;

            let reachable: Vec<String> = seen.lock().iter().unique().cloned().collect();
            (Some(root.summary()), Some(reachable))
        }
        None => (None, None),
    };

    info!(%state, feeders = feeders.len(), "state traced");
    Ok(StateReport {
        state,
        feeders,
        downstream,
        reachable,
    })
}
