use crate::model::{EquipmentKind, Feeder, NetworkService};
use crate::network_trace::{Conditions, NetworkStateOperators, Tracing, CURRENT, NORMAL};
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Associates every piece of equipment reachable from a feeder head with
/// that feeder.
///
/// The walk from each head does not pass open equipment in the chosen
/// network state, and stops at the head equipment of any other feeder or at
/// a power transformer. A reached feeder head still joins the feeder; a
/// transformer it stops on does not.
///
/// Associations are set unions, so re-running is harmless.
pub struct AssignToFeeders {
    state: &'static dyn NetworkStateOperators,
}

impl AssignToFeeders {
    pub fn new(state: &'static dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Assigns feeders in the normal state, then the current state.
    pub async fn run_all(network: &NetworkService) -> Result<()> {
        Self::new(&NORMAL).run(network).await?;
        Self::new(&CURRENT).run(network).await
    }

    pub async fn run(&self, network: &NetworkService) -> Result<()> {
        let feeder_heads: HashSet<String> = network
            .feeders()
            .filter_map(|feeder| feeder.normal_head_terminal())
            .filter_map(|terminal| terminal.conducting_equipment())
            .map(|equipment| equipment.mrid().to_string())
            .collect();

        for feeder in network.feeders() {
            self.assign_to_feeder(feeder, &feeder_heads).await?;
        }
        Ok(())
    }

    pub async fn assign_to_feeder(&self, feeder: &Arc<Feeder>, feeder_heads: &HashSet<String>) -> Result<()> {
        let Some(head) = feeder.normal_head_terminal() else {
            warn!(feeder = feeder.mrid(), "feeder has no head terminal, skipping");
            return Ok(());
        };

        let head_equipment = head.conducting_equipment().map(|e| e.mrid().to_string());
        let other_heads: HashSet<String> = feeder_heads
            .iter()
            .filter(|mrid| Some(mrid.as_str()) != head_equipment.as_deref())
            .cloned()
            .collect();
        let other_heads = Arc::new(other_heads);

        let mut trace = Tracing::network_trace(self.state);
        trace.add_queue_condition(Conditions::stop_at_open(self.state));

        trace.add_stop_fn(move |step, _| {
            step.path.to_equipment().is_ok_and(|equipment| {
                other_heads.contains(equipment.mrid()) || equipment.kind() == EquipmentKind::PowerTransformer
            })
        });

        let state = self.state;
        let target = feeder.clone();
        trace.add_step_fn(move |step, context| {
            let equipment = step.path.to_equipment()?;
            if context.is_stopping && equipment.kind() == EquipmentKind::PowerTransformer {
                return Ok(());
            }
            state.associate_equipment_and_container(&equipment, &target);
            Ok(())
        });

        trace.run_from(head.clone(), (), false).await?;

        info!(
            feeder = feeder.mrid(),
            state = %self.state.state(),
            equipment = self.state.container_equipment(feeder).len(),
            steps = trace.stats().steps,
            "feeder assigned"
        );
        Ok(())
    }
}
