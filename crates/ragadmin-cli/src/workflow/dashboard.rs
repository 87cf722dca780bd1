//! Dashboard metrics
//!
//! The backend computes every figure; the console reads a snapshot and
//! refreshes it on a fixed interval.

use crate::api::{AdminApi, DashboardMetrics};
use crate::cache::{QueryCache, QueryKey};
use crate::error::Result;
use crate::poll::{Poller, ViewState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Refetch interval for dashboard metrics
pub const DASHBOARD_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Dashboard {
    api: Arc<dyn AdminApi>,
    cache: QueryCache,
}

impl Dashboard {
    pub fn new(api: Arc<dyn AdminApi>, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub async fn get_metrics(&self) -> Result<DashboardMetrics> {
        self.cache
            .fetch_with(QueryKey::DashboardMetrics, || self.api.dashboard_metrics())
            .await
    }

    /// Keep the metrics snapshot fresh until `shutdown` fires
    pub fn watch(
        &self,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> (watch::Receiver<ViewState<DashboardMetrics>>, JoinHandle<()>) {
        let api = Arc::clone(&self.api);
        Poller::new(QueryKey::DashboardMetrics, interval, self.cache.clone()).spawn(
            move || {
                let api = Arc::clone(&api);
                async move { api.dashboard_metrics().await }
            },
            shutdown,
        )
    }
}
