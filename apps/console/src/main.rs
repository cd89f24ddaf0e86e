use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fleet_core::{
    ApplyOutcome, BroadcastNotifier, BulkActionCoordinator, FixedScenarios, FleetGateway,
    FleetView, FleetViewOptions, HttpFleetGateway, NoticeLevel, PreviewOutcome, SectionState,
    SelectionStore, SimDetailView,
};
use shared::{
    domain::{BulkAction, RiskBadge, SimId, UsageGranularity},
    protocol::{FleetQuery, SuggestRequest, UsageQuery},
};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(about = "Operations console for a managed SIM fleet")]
struct Args {
    /// Base URL of the fleet backend; overrides config and environment.
    #[arg(long)]
    api_base: Option<String>,
    /// Settings file read before environment overrides.
    #[arg(long, default_value = config::CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List selectable SIM ids and the fleet table.
    Fleet {
        #[arg(long)]
        risk: Option<RiskBadge>,
        #[arg(long)]
        roaming: Option<bool>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Usage, anomalies and cost scenarios for one SIM.
    Sim {
        sim_id: String,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        hourly: bool,
        #[arg(long)]
        include_sms: bool,
    },
    /// Estimate the 24h impact of a bulk action.
    Preview {
        #[command(flatten)]
        target: ActionTarget,
        #[arg(long)]
        reduction_pct: Option<f64>,
    },
    /// Apply a bulk action.
    Apply {
        #[command(flatten)]
        target: ActionTarget,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Run server-side anomaly analysis for one SIM.
    Analyze { sim_id: String },
    /// Ask the backend for recommended actions.
    Suggest {
        #[arg(long = "sim")]
        sims: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
struct ActionTarget {
    #[arg(long)]
    action: BulkAction,
    /// Toggle a SIM in the selection; repeatable.
    #[arg(long = "sim")]
    sims: Vec<String>,
    /// Start from every SIM in the fleet.
    #[arg(long)]
    all: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings_from(&args.config, |key| std::env::var(key).ok())?;
    if let Some(api_base) = &args.api_base {
        settings.api_base = config::normalize_api_base(api_base);
    }
    if let Some(timeout) = args.timeout_secs {
        settings.request_timeout_secs = timeout;
    }
    info!(api_base = %settings.api_base, "fleet console starting");

    let gateway: Arc<dyn FleetGateway> = Arc::new(
        HttpFleetGateway::with_timeout(
            &settings.api_base,
            Duration::from_secs(settings.request_timeout_secs),
        )
        .context("failed to create fleet gateway")?,
    );

    match args.command {
        Command::Fleet {
            risk,
            roaming,
            limit,
            offset,
        } => {
            let view = fleet_view(&gateway, &settings);
            let sections = view
                .load(&FleetQuery {
                    risk,
                    roaming,
                    limit,
                    offset,
                })
                .await;
            print_fleet(&sections);
        }
        Command::Sim {
            sim_id,
            days,
            hourly,
            include_sms,
        } => {
            let query = UsageQuery {
                days: days.unwrap_or(settings.usage_days),
                granularity: if hourly {
                    UsageGranularity::Hour
                } else {
                    UsageGranularity::Day
                },
                include_sms,
            };
            let view = SimDetailView::new(Arc::clone(&gateway), query, FixedScenarios::default());
            let sections = view.load(&SimId::from(sim_id)).await;
            print_sim(&sections);
        }
        Command::Preview {
            target,
            reduction_pct,
        } => {
            let selection = build_selection(&gateway, &settings, &target).await?;
            let notifier = Arc::new(BroadcastNotifier::default());
            let mut notices = notifier.subscribe();
            let coordinator = BulkActionCoordinator::new(Arc::clone(&gateway), notifier);
            let pct = reduction_pct.unwrap_or(settings.throttle_reduction_pct);
            match coordinator
                .request_preview(&selection, target.action, pct)
                .await
            {
                PreviewOutcome::Ready(impact) => {
                    println!(
                        "{}: {:.1} MB -> {:.1} MB in 24h ({:+.1}%)",
                        impact.action,
                        impact.total_baseline_mb_24h,
                        impact.total_expected_mb_24h,
                        impact.delta_pct
                    );
                    for item in &impact.items {
                        println!(
                            "  {:<12} {:>10.1} -> {:>10.1} ({:+.1}%)",
                            item.sim_id, item.baseline_mb_24h, item.expected_mb_24h, item.delta_pct
                        );
                    }
                }
                PreviewOutcome::Skipped => println!("nothing selected"),
                PreviewOutcome::Failed(_) | PreviewOutcome::Superseded => {}
            }
            print_notices(&mut notices);
        }
        Command::Apply { target, reason } => {
            let selection = build_selection(&gateway, &settings, &target).await?;
            let notifier = Arc::new(BroadcastNotifier::default());
            let mut notices = notifier.subscribe();
            let coordinator = BulkActionCoordinator::new(Arc::clone(&gateway), notifier);
            let outcome = coordinator.apply(&selection, target.action, &reason).await;
            print_notices(&mut notices);
            match outcome {
                ApplyOutcome::Skipped => println!("nothing selected"),
                ApplyOutcome::Failed(message) => bail!("apply failed: {message}"),
                ApplyOutcome::Applied(_) => {}
            }
        }
        Command::Analyze { sim_id } => {
            let report = gateway.analyze(&SimId::from(sim_id.as_str())).await?;
            println!("risk score {}: {}", report.risk_score, report.summary);
            for anomaly in &report.anomalies {
                println!("  {} {} {}", anomaly.ts, anomaly.kind, anomaly.reason);
            }
        }
        Command::Suggest { sims } => {
            let request = SuggestRequest {
                sim_ids: (!sims.is_empty()).then(|| sims.into_iter().map(SimId::from).collect()),
            };
            let response = gateway.suggest_actions(&request).await?;
            for item in &response.items {
                println!(
                    "{:<12} {:<10} {:>3}% {}",
                    item.sim_id, item.recommended, item.confidence, item.reason
                );
            }
        }
    }

    Ok(())
}

fn fleet_view(gateway: &Arc<dyn FleetGateway>, settings: &config::Settings) -> FleetView {
    FleetView::new(
        Arc::clone(gateway),
        FleetViewOptions {
            id_page_limit: settings.page_limit,
            sample_ids: settings.sample_ids.clone(),
        },
    )
}

/// Builds the selection the way the fleet screen does: optional select-all,
/// then per-SIM toggles, then pruning against the current id list.
async fn build_selection(
    gateway: &Arc<dyn FleetGateway>,
    settings: &config::Settings,
    target: &ActionTarget,
) -> Result<Vec<SimId>> {
    let sections = fleet_view(gateway, settings)
        .load(&FleetQuery::default())
        .await;
    if let Some(message) = sections.ids.error() {
        bail!("fleet ids unavailable: {message}");
    }
    let universe = sections.universe();

    let mut selection = SelectionStore::new();
    if target.all {
        selection.toggle_all(true, universe);
    }
    for sim in &target.sims {
        selection.toggle(SimId::from(sim.as_str()));
    }
    let removed = selection.prune(universe);
    if !removed.is_empty() {
        warn!(count = removed.len(), "ignoring SIMs that are not in the fleet");
    }
    Ok(selection.snapshot())
}

fn print_fleet(sections: &fleet_core::FleetSections) {
    match &sections.ids {
        SectionState::Ready(ids) => {
            let ids: Vec<&str> = ids.iter().map(SimId::as_str).collect();
            println!("ids ({}): {}", ids.len(), ids.join(", "));
        }
        SectionState::Failed(message) => println!("ids: {message}"),
        _ => {}
    }
    match &sections.rows {
        SectionState::Ready(rows) => {
            for row in rows {
                println!(
                    "{:<12} {:<10} {:<14} {:<8} risk {:>3} {:<6} anomalies {}{}",
                    row.sim_id,
                    row.status,
                    row.plan,
                    row.device_type,
                    row.risk_score,
                    row.risk_badge,
                    row.anomalies_count,
                    if row.has_roaming { " roaming" } else { "" }
                );
            }
        }
        SectionState::Failed(message) => println!("table: {message}"),
        _ => {}
    }
}

fn print_sim(sections: &fleet_core::SimDetailSections) {
    if let Some(sim_id) = &sections.sim_id {
        println!("SIM {sim_id}");
    }
    print_section("usage", &sections.usage, |points| {
        let total: f64 = points.iter().map(|p| p.mb_used).sum();
        format!("{} samples, {total:.1} MB", points.len())
    });
    print_section("anomalies", &sections.anomalies, |anomalies| {
        anomalies
            .iter()
            .map(|a| format!("{} {} ({})", a.ts, a.kind, a.reason))
            .collect::<Vec<_>>()
            .join("; ")
    });
    print_section("top-3", &sections.whatif.top3, |top3| {
        top3.options
            .iter()
            .map(|o| format!("{} {:.2} (saves {:.2})", o.label, o.total, o.saving))
            .collect::<Vec<_>>()
            .join(", ")
    });
    for (label, state) in [
        ("current", &sections.whatif.current),
        ("upgrade", &sections.whatif.upgrade),
        ("add-on", &sections.whatif.addon),
    ] {
        print_section(label, state, |r| {
            format!("{:.2} -> {:.2} (saves {:.2})", r.current_total, r.candidate_total, r.saving)
        });
    }
}

fn print_section<T>(label: &str, state: &SectionState<T>, render: impl FnOnce(&T) -> String) {
    match state {
        SectionState::Ready(data) => println!("{label}: {}", render(data)),
        SectionState::Failed(message) => println!("{label}: error: {message}"),
        SectionState::Loading | SectionState::Idle => println!("{label}: -"),
    }
}

fn print_notices(notices: &mut broadcast::Receiver<fleet_core::Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice.level {
            NoticeLevel::Success => println!("ok: {}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}
