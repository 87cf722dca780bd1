//! Fixed-interval polling into the query cache
//!
//! A [`Poller`] refetches one [`QueryKey`] on a timer and publishes a
//! [`ViewState`]. `Loading` is shown only until the first snapshot arrives;
//! afterwards the last snapshot stays visible while a refetch is in flight or
//! after one fails.

use crate::cache::{QueryCache, QueryKey};
use crate::error::Result;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// What a polled view should show
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    /// No snapshot has resolved yet
    Loading,
    /// Every fetch so far has failed
    Failed(String),
    Ready {
        data: T,
        /// A refetch is in flight; `data` is the previous snapshot
        refreshing: bool,
        /// Error of the most recent failed refetch, cleared on success
        last_error: Option<String>,
    },
}

impl<T> ViewState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Ready { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    fn start_refresh(&mut self) {
        if let ViewState::Ready { refreshing, .. } = self {
            *refreshing = true;
        }
    }

    fn resolve(&mut self, outcome: std::result::Result<T, String>) {
        *self = match (std::mem::replace(self, ViewState::Loading), outcome) {
            (_, Ok(data)) => ViewState::Ready {
                data,
                refreshing: false,
                last_error: None,
            },
            (ViewState::Ready { data, .. }, Err(e)) => ViewState::Ready {
                data,
                refreshing: false,
                last_error: Some(e),
            },
            (_, Err(e)) => ViewState::Failed(e),
        };
    }
}

/// Periodic refetch of one cache key
pub struct Poller {
    key: QueryKey,
    interval: Duration,
    cache: QueryCache,
}

impl Poller {
    pub fn new(key: QueryKey, interval: Duration, cache: QueryCache) -> Self {
        Self { key, interval, cache }
    }

    /// Spawn the polling task
    ///
    /// The first fetch starts immediately. An invalidation of the key triggers
    /// a fetch right away and restarts the interval. The task exits when
    /// `shutdown` flips to `true` or its sender is dropped.
    pub fn spawn<T, F, Fut>(
        self,
        fetcher: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> (watch::Receiver<ViewState<T>>, JoinHandle<()>)
    where
        T: Serialize + Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send,
    {
        let (state_tx, state_rx) = watch::channel(ViewState::Loading);
        let mut events = self.cache.subscribe();

        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {},
                    event = events.recv() => match event {
                        Ok(event) if event.invalidates(&self.key) => {
                            debug!(key = %self.key, "Refetching after invalidation");
                            timer.reset();
                        },
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(key = %self.key, skipped, "Poller lagged behind cache events");
                        },
                        Err(RecvError::Closed) => return,
                    },
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!(key = %self.key, "Poller shutting down");
                            return;
                        }
                        continue;
                    }
                }

                state_tx.send_modify(ViewState::start_refresh);
                let outcome = self
                    .cache
                    .refetch(self.key.clone(), &fetcher)
                    .await
                    .map_err(|e| {
                        warn!(key = %self.key, error = %e, "Poll failed");
                        e.to_string()
                    });
                state_tx.send_modify(|state| state.resolve(outcome));
            }
        });

        (state_rx, handle)
    }
}
