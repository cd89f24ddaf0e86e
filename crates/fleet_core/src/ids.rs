//! Set helpers over SIM identifiers.
//!
//! Ordering follows the console's fallback rule: ids are compared by their
//! numeric value first (anything that does not parse to a finite number
//! counts as 0), then byte-wise. Mixed lists therefore put non-numeric ids
//! alongside `"0"`, ahead of positive numbers.

use std::{cmp::Ordering, collections::HashSet};

use shared::{domain::SimId, protocol::FleetItem};

fn numeric_value(id: &str) -> f64 {
    match id.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

pub fn compare_ids(a: &str, b: &str) -> Ordering {
    numeric_value(a)
        .total_cmp(&numeric_value(b))
        .then_with(|| a.cmp(b))
}

pub fn dedupe_and_sort<I>(ids: I) -> Vec<SimId>
where
    I: IntoIterator<Item = SimId>,
{
    let mut seen = HashSet::new();
    let mut unique: Vec<SimId> = ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();
    unique.sort_by(|a, b| compare_ids(a.as_str(), b.as_str()));
    unique
}

/// Ids of a fleet listing with blank entries dropped, deduplicated and
/// ordered.
pub fn normalize_fleet_ids(items: &[FleetItem]) -> Vec<SimId> {
    dedupe_and_sort(
        items
            .iter()
            .filter(|item| !item.sim_id.as_str().trim().is_empty())
            .map(|item| item.sim_id.clone()),
    )
}

pub fn contains(ids: &[SimId], id: &SimId) -> bool {
    ids.iter().any(|candidate| candidate == id)
}
