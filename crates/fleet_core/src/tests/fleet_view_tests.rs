use super::*;
use crate::test_support::{fleet_row, ScriptedGateway};
use serde_json::json;
use shared::domain::RiskBadge;

fn ids(values: &[&str]) -> Vec<SimId> {
    values.iter().copied().map(SimId::from).collect()
}

#[tokio::test]
async fn universe_is_deduplicated_and_ordered() {
    let gateway = ScriptedGateway::new();
    gateway
        .reply(
            "list_fleet",
            json!([fleet_row("2003"), fleet_row("2001"), fleet_row(""), fleet_row("2003"), fleet_row("2002")]),
        )
        .await;
    let view = FleetView::new(gateway.clone(), FleetViewOptions::default());

    let sections = view.load(&FleetQuery::default()).await;

    assert_eq!(sections.universe(), ids(&["2001", "2002", "2003"]).as_slice());
    assert_eq!(sections.rows.data().map(Vec::len), Some(5));

    let bodies = gateway.bodies("list_fleet").await;
    assert_eq!(bodies.len(), 2);
    assert!(bodies.contains(&json!({"limit": 200, "offset": 0})));
    assert!(bodies.contains(&json!({})));
}

#[tokio::test]
async fn empty_fleet_offers_sample_ids() {
    let gateway = ScriptedGateway::new();
    gateway.reply("list_fleet", json!([])).await;
    let view = FleetView::new(gateway, FleetViewOptions::default());

    let sections = view.load(&FleetQuery::default()).await;

    assert_eq!(
        sections.universe(),
        ids(&["2001", "2002", "2003", "2004", "2005"]).as_slice()
    );
    assert_eq!(sections.rows.data().map(Vec::len), Some(0));
}

#[tokio::test]
async fn empty_fleet_without_samples_stays_empty() {
    let gateway = ScriptedGateway::new();
    gateway.reply("list_fleet", json!([])).await;
    let options = FleetViewOptions {
        sample_ids: Vec::new(),
        ..FleetViewOptions::default()
    };
    let view = FleetView::new(gateway, options);

    let sections = view.load(&FleetQuery::default()).await;

    assert!(sections.ids.data().is_some_and(Vec::is_empty));
    assert!(sections.universe().is_empty());
}

#[tokio::test]
async fn failed_listing_marks_both_sections() {
    let gateway = ScriptedGateway::new();
    gateway
        .fail("list_fleet", 500, Some("database unavailable"))
        .await;
    let view = FleetView::new(gateway, FleetViewOptions::default());

    let sections = view.load(&FleetQuery::default()).await;

    assert_eq!(sections.ids.error(), Some("database unavailable"));
    assert_eq!(sections.rows.error(), Some("database unavailable"));
    assert!(sections.universe().is_empty());
}

#[tokio::test]
async fn filters_carry_into_both_requests() {
    let gateway = ScriptedGateway::new();
    gateway.reply("list_fleet", json!([fleet_row("7")])).await;
    let view = FleetView::new(gateway.clone(), FleetViewOptions::default());
    let filter = FleetQuery {
        risk: Some(RiskBadge::Red),
        roaming: Some(true),
        limit: Some(25),
        offset: Some(50),
    };

    view.load(&filter).await;

    let bodies = gateway.bodies("list_fleet").await;
    assert!(bodies.contains(&json!({"risk": "red", "roaming": true, "limit": 200, "offset": 0})));
    assert!(bodies.contains(&json!({"risk": "red", "roaming": true, "limit": 25, "offset": 50})));
    assert_eq!(view.generation().await.value(), 1);
}
