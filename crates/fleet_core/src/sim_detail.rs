use std::sync::Arc;

use shared::{
    domain::SimId,
    protocol::{Anomaly, UsagePoint, UsageQuery},
};
use tracing::info;

use crate::{
    loader::{SectionState, SectionedLoader},
    whatif::{FixedScenarios, WhatIfAggregator, WhatIfSections},
    FleetGateway,
};

/// Everything the SIM detail screen renders, one slot per section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimDetailSections {
    pub sim_id: Option<SimId>,
    pub usage: SectionState<Vec<UsagePoint>>,
    pub anomalies: SectionState<Vec<Anomaly>>,
    pub whatif: WhatIfSections,
}

fn whatif_slot(view: &mut SimDetailSections) -> &mut WhatIfSections {
    &mut view.whatif
}

pub struct SimDetailView {
    gateway: Arc<dyn FleetGateway>,
    usage_query: UsageQuery,
    loader: SectionedLoader<SimDetailSections>,
    whatif: WhatIfAggregator,
}

impl SimDetailView {
    pub fn new(
        gateway: Arc<dyn FleetGateway>,
        usage_query: UsageQuery,
        scenarios: FixedScenarios,
    ) -> Self {
        Self {
            whatif: WhatIfAggregator::new(Arc::clone(&gateway), scenarios),
            gateway,
            usage_query,
            loader: SectionedLoader::new(),
        }
    }

    /// Binds the view to `sim_id`, discarding whatever the previous SIM left
    /// behind, and loads every section concurrently.
    pub async fn load(&self, sim_id: &SimId) -> SimDetailSections {
        let generation = self.loader.bind(sim_id.as_str()).await;
        let bound = self
            .loader
            .update(generation, |view| {
                view.sim_id = Some(sim_id.clone());
                view.usage = SectionState::Loading;
                view.anomalies = SectionState::Loading;
            })
            .await;
        if bound {
            info!(sim_id = %sim_id, generation = %generation, "loading sim detail");
            tokio::join!(
                self.loader.load_section(
                    generation,
                    "usage",
                    "usage data could not be loaded",
                    |view| &mut view.usage,
                    self.gateway.usage(sim_id, self.usage_query),
                ),
                self.loader.load_section(
                    generation,
                    "anomalies",
                    "anomaly data could not be loaded",
                    |view| &mut view.anomalies,
                    self.gateway.anomalies(sim_id),
                ),
                self.whatif
                    .load_into(&self.loader, generation, sim_id, whatif_slot),
            );
        }

        self.loader.snapshot().await
    }

    pub async fn snapshot(&self) -> SimDetailSections {
        self.loader.snapshot().await
    }

    pub fn usage_query(&self) -> UsageQuery {
        self.usage_query
    }

    pub fn loader(&self) -> &SectionedLoader<SimDetailSections> {
        &self.loader
    }
}

#[cfg(test)]
#[path = "tests/sim_detail_tests.rs"]
mod tests;
