//! `ragadmin dashboard` command implementation

use crate::api::DashboardMetrics;
use crate::commands::{watch_until_interrupted, Context};
use crate::error::Result;
use crate::progress::with_spinner;
use crate::render;
use crate::workflow::dashboard::DASHBOARD_POLL_INTERVAL;
use crate::workflow::Dashboard;
use chrono::Utc;
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::watch;

/// Number of feed entries printed
const RECENT_ACTIVITY_LIMIT: usize = 10;

pub async fn run(ctx: &Context, watch_mode: bool) -> Result<()> {
    let dashboard = Dashboard::new(Arc::clone(&ctx.api), ctx.cache.clone());

    if watch_mode {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (states, handle) = dashboard.watch(DASHBOARD_POLL_INTERVAL, shutdown_rx);
        return watch_until_interrupted(states, handle, shutdown_tx, print_metrics).await;
    }

    let metrics = with_spinner("Loading metrics", dashboard.get_metrics()).await?;
    print_metrics(&metrics)
}

fn print_metrics(metrics: &DashboardMetrics) -> Result<()> {
    println!("{}", "Platform Overview".cyan().bold());
    println!("{}", render::metrics_table(metrics));

    if !metrics.storage_usage.is_empty() {
        println!("{}", "Storage:".cyan());
        for slice in &metrics.storage_usage {
            println!("  {:<20} {:.1}", slice.category, slice.value);
        }
    }

    println!("{}", "Recent Activity:".cyan());
    if metrics.recent_activities.is_empty() {
        println!("  No recent activities");
        return Ok(());
    }
    let now = Utc::now();
    for activity in metrics.recent_activities.iter().take(RECENT_ACTIVITY_LIMIT) {
        println!("  {}", render::activity_line(activity, now));
    }
    Ok(())
}
