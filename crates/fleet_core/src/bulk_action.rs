//! Preview-then-apply workflow for bulk actions.
//!
//! Preview and apply are independent tracks. An apply never requires a
//! preview, and a preview holds no reservation over the fleet: by the time
//! the operator applies, the backend may have changed state the preview was
//! computed against.
//!
//! Overlapping previews are resolved by a preview generation: only the most
//! recently issued preview may settle into the snapshot, earlier ones are
//! reported as [`PreviewOutcome::Superseded`].

use std::sync::Arc;

use shared::{
    domain::{BulkAction, SimId},
    protocol::{BulkActionRequest, ImpactRequest, ImpactResponse},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    loader::Generation,
    notifier::{Notice, Notifier},
    FleetGateway,
};

pub const DEFAULT_THROTTLE_REDUCTION_PCT: f64 = 65.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkPhase {
    #[default]
    Idle,
    PreviewRequested,
    PreviewReady,
    PreviewFailed,
    ApplyRequested,
    Applied,
    ApplyFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReceipt {
    pub action: BulkAction,
    pub status: String,
    pub applied_to: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    /// Empty selection; nothing was sent.
    Skipped,
    Ready(ImpactResponse),
    Failed(String),
    /// A newer preview was issued before this one settled.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Empty selection; nothing was sent.
    Skipped,
    Applied(ActionReceipt),
    Failed(String),
}

/// What the bulk-action panel renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorSnapshot {
    /// Most recent transition on either track.
    pub phase: BulkPhase,
    pub preview_pending: bool,
    pub apply_pending: usize,
    pub last_impact: Option<ImpactResponse>,
    pub last_apply: Option<ActionReceipt>,
    pub preview_error: Option<String>,
    pub apply_error: Option<String>,
}

struct CoordinatorState {
    view: CoordinatorSnapshot,
    preview_generation: Generation,
}

pub struct BulkActionCoordinator {
    gateway: Arc<dyn FleetGateway>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<CoordinatorState>,
}

impl BulkActionCoordinator {
    pub fn new(gateway: Arc<dyn FleetGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            state: Mutex::new(CoordinatorState {
                view: CoordinatorSnapshot::default(),
                preview_generation: Generation::default(),
            }),
        }
    }

    /// Whether preview/apply controls should be enabled for `selection`.
    pub fn is_enabled(selection: &[SimId]) -> bool {
        !selection.is_empty()
    }

    pub async fn request_preview(
        &self,
        selection: &[SimId],
        action: BulkAction,
        throttle_reduction_pct: f64,
    ) -> PreviewOutcome {
        if !Self::is_enabled(selection) {
            return PreviewOutcome::Skipped;
        }

        let generation = {
            let mut guard = self.state.lock().await;
            guard.preview_generation = guard.preview_generation.next();
            guard.view.phase = BulkPhase::PreviewRequested;
            guard.view.preview_pending = true;
            guard.view.last_impact = None;
            guard.view.preview_error = None;
            guard.preview_generation
        };
        info!(
            action = %action,
            count = selection.len(),
            generation = %generation,
            "requesting impact preview"
        );

        let request = ImpactRequest {
            sim_ids: selection.to_vec(),
            action,
            throttle_reduction_pct,
        };
        let result = self.gateway.impact(&request).await;

        let mut guard = self.state.lock().await;
        if guard.preview_generation != generation {
            debug!(generation = %generation, "dropped superseded impact preview");
            return PreviewOutcome::Superseded;
        }
        guard.view.preview_pending = false;
        match result {
            Ok(impact) => {
                guard.view.phase = BulkPhase::PreviewReady;
                guard.view.last_impact = Some(impact.clone());
                PreviewOutcome::Ready(impact)
            }
            Err(err) => {
                let message = err.user_message("impact preview failed");
                warn!(action = %action, error = %err, "impact preview failed");
                guard.view.phase = BulkPhase::PreviewFailed;
                guard.view.preview_error = Some(message.clone());
                drop(guard);
                self.notifier.notify(Notice::error(message.clone()));
                PreviewOutcome::Failed(message)
            }
        }
    }

    pub async fn apply(
        &self,
        selection: &[SimId],
        action: BulkAction,
        reason: &str,
    ) -> ApplyOutcome {
        if !Self::is_enabled(selection) {
            return ApplyOutcome::Skipped;
        }

        {
            let mut guard = self.state.lock().await;
            guard.view.phase = BulkPhase::ApplyRequested;
            guard.view.apply_pending += 1;
            guard.view.apply_error = None;
        }
        info!(action = %action, count = selection.len(), "submitting bulk action");

        let request = BulkActionRequest {
            sim_ids: selection.to_vec(),
            action,
            reason: reason.trim().to_string(),
        };
        let result = self.gateway.submit_action(&request).await;

        let mut guard = self.state.lock().await;
        guard.view.apply_pending = guard.view.apply_pending.saturating_sub(1);
        let (outcome, notice) = match result {
            Ok(response) => {
                let receipt = ActionReceipt {
                    action,
                    status: response.status,
                    applied_to: response.applied_to,
                };
                info!(action = %action, applied_to = receipt.applied_to, "bulk action applied");
                guard.view.phase = BulkPhase::Applied;
                guard.view.last_apply = Some(receipt.clone());
                let notice = Notice::success(format!(
                    "Applied {action}. Affected SIMs: {}",
                    receipt.applied_to
                ))
                .with_affected(receipt.applied_to);
                (ApplyOutcome::Applied(receipt), notice)
            }
            Err(err) => {
                let message = err.user_message("action could not be applied");
                warn!(action = %action, error = %err, "bulk action failed");
                guard.view.phase = BulkPhase::ApplyFailed;
                guard.view.apply_error = Some(message.clone());
                (ApplyOutcome::Failed(message.clone()), Notice::error(message))
            }
        };
        drop(guard);
        self.notifier.notify(notice);
        outcome
    }

    pub async fn snapshot(&self) -> CoordinatorSnapshot {
        self.state.lock().await.view.clone()
    }
}

#[cfg(test)]
#[path = "tests/bulk_action_tests.rs"]
mod tests;
