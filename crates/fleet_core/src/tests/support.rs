//! In-memory [`FleetGateway`] used by the view and coordinator tests.
//!
//! Replies are queued per call key. The last queued reply for a key keeps
//! answering once the queue is down to one entry. A gate parks the next call
//! for a key until the test releases it.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use shared::{
    domain::SimId,
    protocol::{
        ActionApplyResponse, AnalyzeResponse, Anomaly, BulkActionRequest, FleetItem, FleetQuery,
        ImpactRequest, ImpactResponse, SuggestRequest, SuggestResponse, UsagePoint, UsageQuery,
        WhatIfRequest, WhatIfResponse, WhatIfTop3,
    },
};
use tokio::sync::{oneshot, Mutex};

use crate::{
    error::{GatewayError, GatewayResult},
    FleetGateway,
};

#[derive(Clone)]
enum Reply {
    Json(Value),
    Fail(u16, Option<String>),
}

struct Gate {
    arrived: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Test-side ends of a gate.
pub(crate) struct GateHandle {
    pub arrived: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

#[derive(Default)]
pub(crate) struct ScriptedGateway {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Value)>>,
    gates: Mutex<HashMap<String, Gate>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn reply(&self, key: impl Into<String>, body: Value) {
        self.push(key.into(), Reply::Json(body)).await;
    }

    pub async fn fail(&self, key: impl Into<String>, status: u16, detail: Option<&str>) {
        self.push(key.into(), Reply::Fail(status, detail.map(str::to_string)))
            .await;
    }

    pub async fn gate(&self, key: impl Into<String>) -> GateHandle {
        let (arrived_tx, arrived_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates.lock().await.insert(
            key.into(),
            Gate {
                arrived: arrived_tx,
                release: release_rx,
            },
        );
        GateHandle {
            arrived: arrived_rx,
            release: release_tx,
        }
    }

    /// Call keys in the order the calls were made.
    pub async fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub async fn bodies(&self, key: &str) -> Vec<Value> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(recorded, _)| recorded == key)
            .map(|(_, body)| body.clone())
            .collect()
    }

    async fn push(&self, key: String, reply: Reply) {
        self.replies
            .lock()
            .await
            .entry(key)
            .or_default()
            .push_back(reply);
    }

    async fn respond<T, B>(&self, key: String, body: &B) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).unwrap_or(Value::Null);
        self.calls.lock().await.push((key.clone(), body));

        let gate = self.gates.lock().await.remove(&key);
        if let Some(gate) = gate {
            let _ = gate.arrived.send(());
            let _ = gate.release.await;
        }

        let reply = {
            let mut replies = self.replies.lock().await;
            let queue = replies
                .get_mut(&key)
                .unwrap_or_else(|| panic!("no scripted reply for {key}"));
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }
        .unwrap_or_else(|| panic!("no scripted reply for {key}"));

        match reply {
            Reply::Json(value) => serde_json::from_value(value)
                .map_err(|source| GatewayError::Decode { path: key, source }),
            Reply::Fail(status, message) => Err(GatewayError::status(key, status, message)),
        }
    }
}

pub(crate) fn whatif_key(sim_id: &SimId, request: &WhatIfRequest) -> String {
    match (&request.plan_id, &request.addons) {
        (Some(plan_id), _) => format!("whatif/{sim_id}/plan:{plan_id}"),
        (None, Some(addons)) => format!("whatif/{sim_id}/addons:{}", addons.join(",")),
        (None, None) => format!("whatif/{sim_id}/current"),
    }
}

#[async_trait]
impl FleetGateway for ScriptedGateway {
    async fn list_fleet(&self, query: &FleetQuery) -> GatewayResult<Vec<FleetItem>> {
        self.respond("list_fleet".into(), query).await
    }

    async fn fleet_ids(&self, query: &FleetQuery) -> GatewayResult<Vec<SimId>> {
        self.respond("fleet_ids".into(), query).await
    }

    async fn usage(&self, sim_id: &SimId, query: UsageQuery) -> GatewayResult<Vec<UsagePoint>> {
        self.respond(format!("usage/{sim_id}"), &query).await
    }

    async fn anomalies(&self, sim_id: &SimId) -> GatewayResult<Vec<Anomaly>> {
        self.respond(format!("anomalies/{sim_id}"), &()).await
    }

    async fn analyze(&self, sim_id: &SimId) -> GatewayResult<AnalyzeResponse> {
        self.respond(format!("analyze/{sim_id}"), &()).await
    }

    async fn whatif_top3(&self, sim_id: &SimId) -> GatewayResult<WhatIfTop3> {
        self.respond(format!("whatif_top3/{sim_id}"), &()).await
    }

    async fn whatif(
        &self,
        sim_id: &SimId,
        request: &WhatIfRequest,
    ) -> GatewayResult<WhatIfResponse> {
        self.respond(whatif_key(sim_id, request), request).await
    }

    async fn submit_action(
        &self,
        request: &BulkActionRequest,
    ) -> GatewayResult<ActionApplyResponse> {
        self.respond("actions".into(), request).await
    }

    async fn impact(&self, request: &ImpactRequest) -> GatewayResult<ImpactResponse> {
        self.respond("impact".into(), request).await
    }

    async fn suggest_actions(&self, request: &SuggestRequest) -> GatewayResult<SuggestResponse> {
        self.respond("suggest".into(), request).await
    }
}

pub(crate) fn fleet_row(sim_id: &str) -> Value {
    json!({
        "sim_id": sim_id,
        "device_type": "tracker",
        "apn": "iot.example",
        "plan": "iot_basic_1gb",
        "status": "active",
        "risk_score": 10,
        "risk_badge": "green",
        "anomalies_count": 0,
        "has_roaming": false
    })
}

pub(crate) fn whatif_body(current_total: f64, candidate_total: f64) -> Value {
    json!({
        "current_total": current_total,
        "candidate_total": candidate_total,
        "saving": current_total - candidate_total
    })
}

pub(crate) fn top3_body(current_total: f64) -> Value {
    json!({
        "current_total": current_total,
        "options": [
            {"label": "Upgrade", "plan_id": "iot_plus_2gb", "addons": [], "total": current_total - 2.0, "saving": 2.0}
        ]
    })
}

/// Scripts every what-if call for `sim_id` with the default scenario ids.
pub(crate) async fn script_whatif(gateway: &ScriptedGateway, sim_id: &str, current_total: f64) {
    gateway
        .reply(format!("whatif_top3/{sim_id}"), top3_body(current_total))
        .await;
    gateway
        .reply(
            format!("whatif/{sim_id}/current"),
            whatif_body(current_total, current_total),
        )
        .await;
    gateway
        .reply(
            format!("whatif/{sim_id}/plan:iot_plus_2gb"),
            whatif_body(current_total, current_total - 2.0),
        )
        .await;
    gateway
        .reply(
            format!("whatif/{sim_id}/addons:200mb"),
            whatif_body(current_total, current_total - 1.0),
        )
        .await;
}
