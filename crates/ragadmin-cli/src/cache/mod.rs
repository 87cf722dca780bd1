//! Query cache
//!
//! Time-bounded read cache keyed by [`QueryKey`]. Mutations invalidate keys
//! explicitly; subscribers receive a [`CacheEvent`] for every store and
//! invalidation so pollers can refetch promptly.

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;
use tracing::debug;

/// Default stale time
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(300);

const EVENT_CAPACITY: usize = 64;

/// Identifies one cached query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Users,
    UserDetail(String),
    Models,
    ModelDetail(String),
    ModelVersions(String),
    Benchmarks(Option<String>),
    DashboardMetrics,
    Roles,
    RolePermissions(String),
}

impl QueryKey {
    /// True if invalidating `self` also invalidates `other`
    ///
    /// A key covers itself and every key whose string form extends it with
    /// `:<segment>`, so `models` covers `models:<id>` and `benchmarks` covers
    /// `benchmarks:<id>`.
    pub fn covers(&self, other: &QueryKey) -> bool {
        if self == other {
            return true;
        }
        let parent = self.to_string();
        let child = other.to_string();
        child
            .strip_prefix(&parent)
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Users => write!(f, "users"),
            QueryKey::UserDetail(email) => write!(f, "users:{}", email),
            QueryKey::Models => write!(f, "models"),
            QueryKey::ModelDetail(id) => write!(f, "models:{}", id),
            QueryKey::ModelVersions(id) => write!(f, "model-versions:{}", id),
            QueryKey::Benchmarks(None) => write!(f, "benchmarks"),
            QueryKey::Benchmarks(Some(id)) => write!(f, "benchmarks:{}", id),
            QueryKey::DashboardMetrics => write!(f, "dashboard-metrics"),
            QueryKey::Roles => write!(f, "roles"),
            QueryKey::RolePermissions(name) => write!(f, "roles:{}", name),
        }
    }
}

/// Notification published by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
}

impl CacheEvent {
    /// True if a subscriber watching `key` should refetch
    pub fn invalidates(&self, key: &QueryKey) -> bool {
        match self {
            CacheEvent::Invalidated(target) => target.covers(key),
            CacheEvent::Updated(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
    stale: bool,
}

/// Shared query cache; clones share the same storage and channel
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, CacheEntry>>>,
    events: broadcast::Sender<CacheEvent>,
    stale_time: Duration,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            events,
            stale_time,
        }
    }

    /// Stale time from `RAGADMIN_CACHE_TTL_SECS`, falling back to the default
    pub fn from_env() -> Self {
        let stale_time = std::env::var("RAGADMIN_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STALE_TIME);
        Self::new(stale_time)
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Fresh value for `key`, or `None` when missing, invalidated or expired
    pub async fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.stale && entry.fetched_at.elapsed() < self.stale_time => {
                debug!(key = %key, "Cache hit");
                Ok(Some(serde_json::from_value(entry.value.clone())?))
            },
            Some(_) => {
                debug!(key = %key, "Cache entry stale");
                Ok(None)
            },
            None => {
                debug!(key = %key, "Cache miss");
                Ok(None)
            },
        }
    }

    /// Last stored value for `key`, even when stale
    pub async fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .map(|entry| serde_json::from_value(entry.value.clone()))
            .transpose()
            .map_err(Into::into)
    }

    /// Store a value and publish [`CacheEvent::Updated`]
    pub async fn set<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        {
            let mut entries = self.entries.write().await;
            entries.insert(
                key.clone(),
                CacheEntry {
                    value,
                    fetched_at: Instant::now(),
                    stale: false,
                },
            );
        }
        debug!(key = %key, "Cached query result");
        self.publish(CacheEvent::Updated(key));
        Ok(())
    }

    /// Mark `key` and every key it covers as stale, then publish
    /// [`CacheEvent::Invalidated`]
    pub async fn invalidate(&self, key: QueryKey) {
        let count = {
            let mut entries = self.entries.write().await;
            let mut count = 0;
            for (cached, entry) in entries.iter_mut() {
                if key.covers(cached) {
                    entry.stale = true;
                    count += 1;
                }
            }
            count
        };
        debug!(key = %key, count, "Invalidated cache entries");
        self.publish(CacheEvent::Invalidated(key));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Return the fresh cached value or run `fetcher` and store its result
    pub async fn fetch_with<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(&key).await? {
            return Ok(value);
        }
        let value = fetcher().await?;
        self.set(key, &value).await?;
        Ok(value)
    }

    /// Run `fetcher` regardless of freshness and store its result
    pub async fn refetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let value = fetcher().await?;
        self.set(key, &value).await?;
        Ok(value)
    }

    fn publish(&self, event: CacheEvent) {
        // No receivers is fine; nobody is watching.
        let _ = self.events.send(event);
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}
