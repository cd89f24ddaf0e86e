use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AnomalyKind, BulkAction, RiskBadge, SimId, UsageGranularity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetItem {
    pub sim_id: SimId,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub apn: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub risk_badge: RiskBadge,
    #[serde(default)]
    pub anomalies_count: u32,
    #[serde(default)]
    pub has_roaming: bool,
}

/// Filters for the fleet listing. Unset fields are omitted from the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FleetQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskBadge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl FleetQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::default()
        }
    }

    /// Stable key identifying this query, used as a loader entity.
    pub fn cache_key(&self) -> String {
        format!(
            "fleet?risk={}&roaming={}&limit={}&offset={}",
            self.risk.map(RiskBadge::as_str).unwrap_or("-"),
            self.roaming.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
            self.limit.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
            self.offset.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageQuery {
    pub days: u32,
    pub granularity: UsageGranularity,
    #[serde(default)]
    pub include_sms: bool,
}

impl Default for UsageQuery {
    fn default() -> Self {
        Self {
            days: 30,
            granularity: UsageGranularity::Day,
            include_sms: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePoint {
    pub ts: String,
    #[serde(default)]
    pub mb_used: f64,
    #[serde(default)]
    pub roaming_mb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_count: Option<u32>,
}

impl UsagePoint {
    /// Calendar day of the sample; the first ten characters of `ts`.
    pub fn day_label(&self) -> &str {
        self.ts.get(..10).unwrap_or(&self.ts)
    }

    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.day_label(), "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub ts: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfOption {
    pub label: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub addons: Vec<String>,
    pub total: f64,
    pub saving: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfTop3 {
    pub current_total: f64,
    #[serde(default)]
    pub options: Vec<WhatIfOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatIfRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addons: Option<Vec<String>>,
}

impl WhatIfRequest {
    pub fn current() -> Self {
        Self::default()
    }

    pub fn plan(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: Some(plan_id.into()),
            addons: None,
        }
    }

    pub fn addon(addon_id: impl Into<String>) -> Self {
        Self {
            plan_id: None,
            addons: Some(vec![addon_id.into()]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatIfBreakdown {
    pub plan_id: String,
    pub plan_name: String,
    pub base: f64,
    pub quota_mb: f64,
    pub addons_applied: Vec<String>,
    pub addons_cost: f64,
    pub extra_mb_total: f64,
    pub effective_quota_mb: f64,
    pub used_so_far_mb: f64,
    pub forecast_mb: f64,
    pub overage_mb: f64,
    pub overage_cost: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfResponse {
    pub current_total: f64,
    pub candidate_total: f64,
    pub saving: f64,
    #[serde(default)]
    pub current_breakdown: WhatIfBreakdown,
    #[serde(default)]
    pub candidate_breakdown: WhatIfBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkActionRequest {
    pub sim_ids: Vec<SimId>,
    pub action: BulkAction,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionApplyResponse {
    pub status: String,
    pub applied_to: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRequest {
    pub sim_ids: Vec<SimId>,
    pub action: BulkAction,
    pub throttle_reduction_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactItem {
    pub sim_id: SimId,
    pub baseline_mb_24h: f64,
    pub expected_mb_24h: f64,
    pub delta_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResponse {
    pub action: BulkAction,
    pub total_baseline_mb_24h: f64,
    pub total_expected_mb_24h: f64,
    pub delta_pct: f64,
    #[serde(default)]
    pub items: Vec<ImpactItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim_ids: Option<Vec<SimId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSuggestion {
    pub sim_id: SimId,
    pub recommended: BulkAction,
    pub confidence: u32,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub impact_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub items: Vec<ActionSuggestion>,
}
