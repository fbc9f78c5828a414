//! Keyed request cache.
//!
//! Each declared query has a [`Resource`] and an ordered parameter list.
//! Successful results are stored under their [`QueryKey`] until a mutation
//! invalidates them; errors are never cached.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::mutation::Mutation;

/// The closed set of declared queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Health,
    CurrentUser,
    AlertRules,
    AlertSummary,
    ActiveAlerts,
    AlertHistory,
    AlertTimeline,
    AlertsByComponent,
    AlertSpikes,
    GlobalHealth,
    ComponentHealth,
    Volatility,
    Forecast,
    ComponentRegimes,
    ComponentStress,
    ChangeImpact,
    SystemStats,
    AlertsStats,
    ComponentRankings,
    SignalCoverage,
    ActiveHotspots,
    ComponentTimeAnalysis,
    SignalEnvelope,
    Incidents,
    Incident,
    IncidentTimeline,
    IncidentComments,
    SystemOverview,
    ActiveAnomaly,
    AnomalyImpact,
    AnomalyAnalysis,
    ComponentDetails,
    Timeseries,
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Health => "health",
            Resource::CurrentUser => "currentUser",
            Resource::AlertRules => "alertRules",
            Resource::AlertSummary => "alertSummary",
            Resource::ActiveAlerts => "activeAlerts",
            Resource::AlertHistory => "alertHistory",
            Resource::AlertTimeline => "alertEventsForTimeline",
            Resource::AlertsByComponent => "alertsByComponent",
            Resource::AlertSpikes => "alertSpikes",
            Resource::GlobalHealth => "globalHealth",
            Resource::ComponentHealth => "componentHealth",
            Resource::Volatility => "volatility",
            Resource::Forecast => "forecast",
            Resource::ComponentRegimes => "componentRegimes",
            Resource::ComponentStress => "componentStress",
            Resource::ChangeImpact => "changeImpact",
            Resource::SystemStats => "systemStats",
            Resource::AlertsStats => "alertsStats",
            Resource::ComponentRankings => "componentRankings",
            Resource::SignalCoverage => "signalCoverage",
            Resource::ActiveHotspots => "activeHotspots",
            Resource::ComponentTimeAnalysis => "componentTimeAnalysis",
            Resource::SignalEnvelope => "signalEnvelope",
            Resource::Incidents => "incidents",
            Resource::Incident => "incident",
            Resource::IncidentTimeline => "incidentTimeline",
            Resource::IncidentComments => "incidentComments",
            Resource::SystemOverview => "systemOverview",
            Resource::ActiveAnomaly => "activeAnomaly",
            Resource::AnomalyImpact => "anomalyImpact",
            Resource::AnomalyAnalysis => "anomalyAnalysis",
            Resource::ComponentDetails => "componentDetails",
            Resource::Timeseries => "timeseries",
        }
    }
}

/// One query parameter as it appears in a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    Flag(bool),
    None,
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::Str(value.clone())
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Flag(value)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(KeyPart::None)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => write!(f, "{s:?}"),
            KeyPart::Int(n) => write!(f, "{n}"),
            KeyPart::Flag(b) => write!(f, "{b}"),
            KeyPart::None => f.write_str("null"),
        }
    }
}

/// Cache key: a resource plus its ordered parameters.
///
/// A key with fewer parameters acts as a prefix matching every key of the
/// same resource whose leading parameters are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: Resource,
    pub params: Vec<KeyPart>,
}

impl QueryKey {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            params: Vec::new(),
        }
    }

    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.params.push(part.into());
        self
    }

    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        self.resource == other.resource && other.params.starts_with(&self.params)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.resource.name())?;
        for part in &self.params {
            write!(f, ", {part}")?;
        }
        f.write_str("]")
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    /// Ticket of the latest fetch started per key. A finished fetch only
    /// writes back while its ticket is still the current one.
    inflight: HashMap<QueryKey, u64>,
    next_ticket: u64,
}

/// Shared cache of query results.
#[derive(Default)]
pub struct QueryCache {
    state: RwLock<CacheState>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or run `fetch` and cache its
    /// success.
    ///
    /// A result whose key was invalidated (or re-fetched) while it was in
    /// flight is still returned to this caller but is not stored.
    pub async fn fetch<T, F>(&self, key: QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Future<Output = Result<T, ApiError>>,
    {
        if let Some(hit) = self.cached::<T>(&key).await {
            tracing::trace!(key = %key, "Cache hit");
            return Ok(hit);
        }

        let ticket = {
            let mut state = self.state.write().await;
            state.next_ticket += 1;
            let ticket = state.next_ticket;
            state.inflight.insert(key.clone(), ticket);
            ticket
        };
        tracing::debug!(key = %key, "Cache miss, fetching");

        let result = fetch.await;

        let mut state = self.state.write().await;
        let current = state.inflight.get(&key) == Some(&ticket);
        if current {
            state.inflight.remove(&key);
        }
        match &result {
            Ok(value) if current => {
                state.entries.insert(key, Arc::new(value.clone()));
            }
            Ok(_) => {
                tracing::debug!(key = %key, "Discarding stale response");
            }
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Fetch failed, not caching");
            }
        }
        result
    }

    /// Remove every entry matched by `prefix`, returning how many were
    /// removed. Fetches in flight for matching keys will not write back.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|key, _| !prefix.is_prefix_of(key));
        state.inflight.retain(|key, _| !prefix.is_prefix_of(key));
        let removed = before - state.entries.len();
        tracing::debug!(prefix = %prefix, removed, "Invalidated cache entries");
        removed
    }

    /// Invalidate everything a successful mutation affects.
    pub async fn apply(&self, mutation: &Mutation) -> usize {
        let mut removed = 0;
        for prefix in mutation.invalidates() {
            removed += self.invalidate(&prefix).await;
        }
        tracing::info!(mutation = ?mutation, removed, "Applied mutation invalidations");
        removed
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.state.read().await.entries.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop all entries and disown in-flight fetches.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.inflight.clear();
    }

    async fn cached<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let state = self.state.read().await;
        let entry = state.entries.get(key)?;
        match entry.downcast_ref::<T>() {
            Some(value) => Some(value.clone()),
            None => {
                tracing::warn!(key = %key, "Cached value has a different type, refetching");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;

    use super::*;

    fn key(resource: Resource) -> QueryKey {
        QueryKey::new(resource)
    }

    #[test]
    fn prefix_matches_leading_params_only() {
        let full = key(Resource::ActiveAlerts).with("C1.api_qps").with(100);
        assert!(key(Resource::ActiveAlerts).is_prefix_of(&full));
        assert!(key(Resource::ActiveAlerts).with("C1.api_qps").is_prefix_of(&full));
        assert!(!key(Resource::ActiveAlerts).with("C2.cpu").is_prefix_of(&full));
        assert!(!key(Resource::AlertHistory).is_prefix_of(&full));
    }

    #[test]
    fn key_display_reads_like_a_tuple() {
        let k = key(Resource::Incident).with(7_i64).with(None::<&str>);
        assert_eq!(k.to_string(), "[incident, 7, null]");
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .fetch(key(Resource::AlertSummary), async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ApiError>(3_i64)
                })
                .await
                .unwrap();
            assert_eq!(value, 3);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = QueryCache::new();
        let result = cache
            .fetch(key(Resource::GlobalHealth), async {
                Err::<f64, _>(ApiError::Status {
                    status: 500,
                    body: "down".into(),
                })
            })
            .await;

        assert_matches!(result, Err(ApiError::Status { status: 500, .. }));
        assert!(!cache.contains(&key(Resource::GlobalHealth)).await);
    }

    #[tokio::test]
    async fn invalidated_in_flight_result_is_not_written_back() {
        let cache = Arc::new(QueryCache::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let pending = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .fetch(key(Resource::AlertSummary), async {
                        let _ = rx.await;
                        Ok::<_, ApiError>(1_i64)
                    })
                    .await
            })
        };

        // Let the fetch register its ticket before invalidating.
        while cache.state.read().await.inflight.is_empty() {
            tokio::task::yield_now().await;
        }
        cache.invalidate(&key(Resource::AlertSummary)).await;
        tx.send(()).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), 1);
        assert!(!cache.contains(&key(Resource::AlertSummary)).await);
    }

    #[tokio::test]
    async fn invalidate_counts_removed_entries() {
        let cache = QueryCache::new();
        for signal in ["a", "b"] {
            cache
                .fetch(key(Resource::ActiveAlerts).with(signal), async { Ok::<_, ApiError>(0_i64) })
                .await
                .unwrap();
        }
        cache
            .fetch(key(Resource::SystemOverview), async { Ok::<_, ApiError>(0_i64) })
            .await
            .unwrap();

        assert_eq!(cache.invalidate(&key(Resource::ActiveAlerts)).await, 2);
        assert_eq!(cache.len().await, 1);
    }
}
