use std::sync::Arc;

use shared::{
    domain::SimId,
    protocol::{FleetItem, FleetQuery},
};
use tracing::{info, warn};

use crate::{
    error::GatewayResult,
    ids::{dedupe_and_sort, normalize_fleet_ids},
    loader::{Generation, SectionState, SectionedLoader},
    FleetGateway,
};

pub const DEFAULT_ID_PAGE_LIMIT: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetViewOptions {
    /// Page size used when collecting the selectable id list.
    pub id_page_limit: u32,
    /// Ids offered for selection when the backend returns an empty fleet.
    /// Leave empty to show an empty list instead.
    pub sample_ids: Vec<SimId>,
}

impl Default for FleetViewOptions {
    fn default() -> Self {
        Self {
            id_page_limit: DEFAULT_ID_PAGE_LIMIT,
            sample_ids: ["2001", "2002", "2003", "2004", "2005"]
                .into_iter()
                .map(SimId::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSections {
    /// Selection universe: deduplicated, ordered SIM ids.
    pub ids: SectionState<Vec<SimId>>,
    /// Table rows as returned by the backend.
    pub rows: SectionState<Vec<FleetItem>>,
}

impl FleetSections {
    pub fn universe(&self) -> &[SimId] {
        self.ids.data().map(Vec::as_slice).unwrap_or(&[])
    }
}

pub struct FleetView {
    gateway: Arc<dyn FleetGateway>,
    options: FleetViewOptions,
    loader: SectionedLoader<FleetSections>,
}

impl FleetView {
    pub fn new(gateway: Arc<dyn FleetGateway>, options: FleetViewOptions) -> Self {
        Self {
            gateway,
            options,
            loader: SectionedLoader::new(),
        }
    }

    /// Loads the id universe and the table rows for `filter` concurrently.
    pub async fn load(&self, filter: &FleetQuery) -> FleetSections {
        let generation = self.loader.bind(filter.cache_key()).await;
        let bound = self
            .loader
            .update(generation, |view| {
                view.ids = SectionState::Loading;
                view.rows = SectionState::Loading;
            })
            .await;
        if bound {
            info!(generation = %generation, query = %filter.cache_key(), "loading fleet");
            let id_query = FleetQuery {
                risk: filter.risk,
                roaming: filter.roaming,
                limit: Some(self.options.id_page_limit),
                offset: Some(0),
            };
            tokio::join!(
                self.loader.load_section(
                    generation,
                    "fleet_ids",
                    "fleet list could not be loaded",
                    |view| &mut view.ids,
                    self.fetch_ids(&id_query),
                ),
                self.loader.load_section(
                    generation,
                    "fleet_rows",
                    "fleet table could not be loaded",
                    |view| &mut view.rows,
                    self.gateway.list_fleet(filter),
                ),
            );
        }
        self.loader.snapshot().await
    }

    async fn fetch_ids(&self, query: &FleetQuery) -> GatewayResult<Vec<SimId>> {
        let rows = self.gateway.list_fleet(query).await?;
        let ids = normalize_fleet_ids(&rows);
        if ids.is_empty() && !self.options.sample_ids.is_empty() {
            warn!(
                count = self.options.sample_ids.len(),
                "fleet listing is empty; offering sample ids"
            );
            return Ok(dedupe_and_sort(self.options.sample_ids.iter().cloned()));
        }
        Ok(ids)
    }

    pub async fn snapshot(&self) -> FleetSections {
        self.loader.snapshot().await
    }

    pub async fn generation(&self) -> Generation {
        self.loader.generation().await
    }

    pub fn options(&self) -> &FleetViewOptions {
        &self.options
    }
}

#[cfg(test)]
#[path = "tests/fleet_view_tests.rs"]
mod tests;
