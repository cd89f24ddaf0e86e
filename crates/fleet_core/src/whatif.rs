//! Cost scenarios for a single SIM: the ranked top-3 plus three fixed
//! scenarios served by the same parameterised endpoint. Each of the four
//! calls owns its slot, so one failing scenario never hides the others.

use std::sync::Arc;

use shared::{
    domain::SimId,
    protocol::{WhatIfRequest, WhatIfResponse, WhatIfTop3},
};
use tracing::info;

use crate::{
    loader::{Generation, SectionState, SectionedLoader},
    FleetGateway,
};

pub const DEFAULT_UPGRADE_PLAN_ID: &str = "iot_plus_2gb";
pub const DEFAULT_ADDON_ID: &str = "200mb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedScenarios {
    pub upgrade_plan_id: String,
    pub addon_id: String,
}

impl Default for FixedScenarios {
    fn default() -> Self {
        Self {
            upgrade_plan_id: DEFAULT_UPGRADE_PLAN_ID.to_string(),
            addon_id: DEFAULT_ADDON_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhatIfSections {
    pub top3: SectionState<WhatIfTop3>,
    pub current: SectionState<WhatIfResponse>,
    pub upgrade: SectionState<WhatIfResponse>,
    pub addon: SectionState<WhatIfResponse>,
}

impl WhatIfSections {
    fn mark_loading(&mut self) {
        self.top3 = SectionState::Loading;
        self.current = SectionState::Loading;
        self.upgrade = SectionState::Loading;
        self.addon = SectionState::Loading;
    }
}

pub struct WhatIfAggregator {
    gateway: Arc<dyn FleetGateway>,
    scenarios: FixedScenarios,
    loader: SectionedLoader<WhatIfSections>,
}

impl WhatIfAggregator {
    pub fn new(gateway: Arc<dyn FleetGateway>, scenarios: FixedScenarios) -> Self {
        Self {
            gateway,
            scenarios,
            loader: SectionedLoader::new(),
        }
    }

    pub fn scenarios(&self) -> &FixedScenarios {
        &self.scenarios
    }

    /// Binds the aggregator's own loader to `sim_id` and fetches all four
    /// scenarios concurrently.
    pub async fn load(&self, sim_id: &SimId) -> Generation {
        let generation = self.loader.bind(sim_id.as_str()).await;
        self.load_into(&self.loader, generation, sim_id, whole_view)
            .await;
        generation
    }

    /// Fetches the scenarios into the [`WhatIfSections`] reached through
    /// `slot` inside another loader's view, under that loader's generation.
    pub async fn load_into<V: Default>(
        &self,
        loader: &SectionedLoader<V>,
        generation: Generation,
        sim_id: &SimId,
        slot: fn(&mut V) -> &mut WhatIfSections,
    ) {
        if !loader
            .update(generation, |view| slot(view).mark_loading())
            .await
        {
            return;
        }
        info!(sim_id = %sim_id, generation = %generation, "loading what-if scenarios");

        let current = WhatIfRequest::current();
        let upgrade = WhatIfRequest::plan(self.scenarios.upgrade_plan_id.clone());
        let addon = WhatIfRequest::addon(self.scenarios.addon_id.clone());

        tokio::join!(
            loader.load_section(
                generation,
                "whatif_top3",
                "what-if top-3 could not be loaded",
                move |view| &mut slot(view).top3,
                self.gateway.whatif_top3(sim_id),
            ),
            loader.load_section(
                generation,
                "whatif_current",
                "current plan scenario could not be loaded",
                move |view| &mut slot(view).current,
                self.gateway.whatif(sim_id, &current),
            ),
            loader.load_section(
                generation,
                "whatif_upgrade",
                "plan upgrade scenario could not be loaded",
                move |view| &mut slot(view).upgrade,
                self.gateway.whatif(sim_id, &upgrade),
            ),
            loader.load_section(
                generation,
                "whatif_addon",
                "add-on scenario could not be loaded",
                move |view| &mut slot(view).addon,
                self.gateway.whatif(sim_id, &addon),
            ),
        );
    }

    pub async fn snapshot(&self) -> WhatIfSections {
        self.loader.snapshot().await
    }

    pub fn loader(&self) -> &SectionedLoader<WhatIfSections> {
        &self.loader
    }
}

fn whole_view(view: &mut WhatIfSections) -> &mut WhatIfSections {
    view
}

#[cfg(test)]
#[path = "tests/whatif_tests.rs"]
mod tests;
