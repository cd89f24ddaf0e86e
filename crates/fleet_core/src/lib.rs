use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::SimId,
    error::ApiError,
    protocol::{
        ActionApplyResponse, AnalyzeResponse, Anomaly, BulkActionRequest, FleetItem, FleetQuery,
        ImpactRequest, ImpactResponse, SuggestRequest, SuggestResponse, UsagePoint, UsageQuery,
        WhatIfRequest, WhatIfResponse, WhatIfTop3,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod bulk_action;
pub mod error;
pub mod fleet_view;
pub mod ids;
pub mod loader;
pub mod notifier;
pub mod selection;
pub mod sim_detail;
pub mod whatif;

pub use bulk_action::{
    ActionReceipt, ApplyOutcome, BulkActionCoordinator, BulkPhase, CoordinatorSnapshot,
    PreviewOutcome, DEFAULT_THROTTLE_REDUCTION_PCT,
};
pub use error::{GatewayError, GatewayResult};
pub use fleet_view::{FleetSections, FleetView, FleetViewOptions};
pub use loader::{Generation, SectionState, SectionStatus, SectionedLoader};
pub use notifier::{BroadcastNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use selection::SelectionStore;
pub use sim_detail::{SimDetailSections, SimDetailView};
pub use whatif::{FixedScenarios, WhatIfAggregator, WhatIfSections};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Request/response boundary to the fleet backend.
///
/// Implementations are stateless from the caller's point of view: no
/// caching and no deduplication of identical in-flight requests.
#[async_trait]
pub trait FleetGateway: Send + Sync {
    async fn list_fleet(&self, query: &FleetQuery) -> GatewayResult<Vec<FleetItem>>;
    async fn fleet_ids(&self, query: &FleetQuery) -> GatewayResult<Vec<SimId>>;
    async fn usage(&self, sim_id: &SimId, query: UsageQuery) -> GatewayResult<Vec<UsagePoint>>;
    async fn anomalies(&self, sim_id: &SimId) -> GatewayResult<Vec<Anomaly>>;
    async fn analyze(&self, sim_id: &SimId) -> GatewayResult<AnalyzeResponse>;
    async fn whatif_top3(&self, sim_id: &SimId) -> GatewayResult<WhatIfTop3>;
    async fn whatif(
        &self,
        sim_id: &SimId,
        request: &WhatIfRequest,
    ) -> GatewayResult<WhatIfResponse>;
    async fn submit_action(
        &self,
        request: &BulkActionRequest,
    ) -> GatewayResult<ActionApplyResponse>;
    async fn impact(&self, request: &ImpactRequest) -> GatewayResult<ImpactResponse>;
    async fn suggest_actions(&self, request: &SuggestRequest) -> GatewayResult<SuggestResponse>;
}

pub struct HttpFleetGateway {
    http: Client,
    base_url: Url,
}

impl HttpFleetGateway {
    pub fn new(base_url: &str) -> GatewayResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base() && matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| GatewayError::InvalidBaseUrl(base_url.to_string()))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::ClientBuild)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: Url,
        request: RequestBuilder,
    ) -> GatewayResult<T> {
        let path = url.path().to_string();
        debug!(%path, "fleet request");
        let response = request.send().await.map_err(|source| GatewayError::Transport {
            path: path.clone(),
            source,
        })?;
        decode_response(path, response).await
    }

    async fn get_json<T, Q>(&self, segments: &[&str], query: Option<&Q>) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(segments);
        let mut request = self.http.get(url.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        self.send(url, request).await
    }

    async fn post_json<T, B>(&self, segments: &[&str], body: Option<&B>) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(segments);
        let mut request = self.http.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(url, request).await
    }
}

async fn decode_response<T: DeserializeOwned>(path: String, response: Response) -> GatewayResult<T> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|source| GatewayError::Transport {
            path: path.clone(),
            source,
        })?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ApiError>(&bytes)
            .ok()
            .and_then(|body| body.message())
            .or_else(|| {
                let text = String::from_utf8_lossy(&bytes).trim().to_string();
                (!text.is_empty() && text.len() <= 512).then_some(text)
            });
        warn!(%path, status = status.as_u16(), "fleet backend rejected request");
        return Err(GatewayError::status(path, status.as_u16(), message));
    }

    serde_json::from_slice(&bytes).map_err(|source| GatewayError::Decode { path, source })
}

#[derive(Serialize)]
struct IdsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    risk: Option<shared::domain::RiskBadge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    roaming: Option<bool>,
}

#[async_trait]
impl FleetGateway for HttpFleetGateway {
    async fn list_fleet(&self, query: &FleetQuery) -> GatewayResult<Vec<FleetItem>> {
        self.get_json(&["api", "fleet"], Some(query)).await
    }

    async fn fleet_ids(&self, query: &FleetQuery) -> GatewayResult<Vec<SimId>> {
        let query = IdsQuery {
            risk: query.risk,
            roaming: query.roaming,
        };
        self.get_json(&["api", "fleet", "ids"], Some(&query))
            .await
    }

    async fn usage(&self, sim_id: &SimId, query: UsageQuery) -> GatewayResult<Vec<UsagePoint>> {
        self.get_json(&["api", "usage", sim_id.as_str()], Some(&query))
            .await
    }

    async fn anomalies(&self, sim_id: &SimId) -> GatewayResult<Vec<Anomaly>> {
        self.get_json::<_, ()>(&["api", "anomalies", sim_id.as_str()], None)
            .await
    }

    async fn analyze(&self, sim_id: &SimId) -> GatewayResult<AnalyzeResponse> {
        self.post_json::<_, ()>(&["api", "analyze", sim_id.as_str()], None)
            .await
    }

    async fn whatif_top3(&self, sim_id: &SimId) -> GatewayResult<WhatIfTop3> {
        self.post_json::<_, ()>(&["api", "whatif", sim_id.as_str(), "top3"], None)
            .await
    }

    async fn whatif(
        &self,
        sim_id: &SimId,
        request: &WhatIfRequest,
    ) -> GatewayResult<WhatIfResponse> {
        self.post_json(&["api", "whatif", sim_id.as_str()], Some(request))
            .await
    }

    async fn submit_action(
        &self,
        request: &BulkActionRequest,
    ) -> GatewayResult<ActionApplyResponse> {
        self.post_json(&["api", "actions"], Some(request)).await
    }

    async fn impact(&self, request: &ImpactRequest) -> GatewayResult<ImpactResponse> {
        self.post_json(&["api", "actions", "impact"], Some(request))
            .await
    }

    async fn suggest_actions(&self, request: &SuggestRequest) -> GatewayResult<SuggestResponse> {
        self.post_json(&["api", "actions", "suggest"], Some(request))
            .await
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
