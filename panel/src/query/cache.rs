//! Keyed query cache
//!
//! The cache is the only shared mutable state of the console. Reads go
//! through `fetch_query`, which serves fresh entries from memory, joins an
//! identical request that is already in flight, and otherwise runs the fetch
//! (retrying once on transient failures). Only the query layer writes
//! entries directly; everything else invalidates and refetches.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::constants::cache::{
    ACTIVITY_STALE_TIME, EVENT_CHANNEL_CAPACITY, READ_RETRIES, RESOURCE_STALE_TIME,
};
use crate::constants::query_keys;
use crate::errors::ApiError;

/// Identifies one cached read: a resource list, one record, or a parameterised query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub resource: &'static str,
    pub id: Option<String>,
    pub params: Option<String>,
}

impl QueryKey {
    pub fn list(resource: &'static str) -> Self {
        Self {
            resource,
            id: None,
            params: None,
        }
    }

    pub fn detail(resource: &'static str, id: impl Into<String>) -> Self {
        Self {
            resource,
            id: Some(id.into()),
            params: None,
        }
    }

    pub fn with_params(resource: &'static str, params: impl Into<String>) -> Self {
        Self {
            resource,
            id: None,
            params: Some(params.into()),
        }
    }

    pub fn is_list(&self) -> bool {
        self.id.is_none() && self.params.is_none()
    }

    /// How long a successful read stays fresh
    pub fn stale_time(&self) -> Duration {
        if self.resource == query_keys::RECENT_ACTIVITY {
            ACTIVITY_STALE_TIME
        } else {
            RESOURCE_STALE_TIME
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if let Some(id) = &self.id {
            write!(f, "/{}", id)?;
        }
        if let Some(params) = &self.params {
            write!(f, "?{}", params)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    updated_at: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn new(data: Value) -> Self {
        Self {
            data,
            updated_at: Instant::now(),
            invalidated: false,
        }
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.invalidated && self.updated_at.elapsed() < stale_time
    }
}

/// Prior state of one entry, taken before an optimistic write
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    key: QueryKey,
    entry: Option<CacheEntry>,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

struct InFlight {
    generation: u64,
    fetch: SharedFetch,
}

#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, CacheEntry>>>,
    in_flight: Arc<Mutex<HashMap<QueryKey, InFlight>>>,
    // Bumped on invalidation; a fetch that started under an older epoch lands stale
    epochs: Arc<RwLock<HashMap<&'static str, u64>>>,
    generations: Arc<AtomicU64>,
    // Generations whose result must not reach `entries`
    cancelled: Arc<Mutex<HashSet<u64>>>,
    events: broadcast::Sender<CacheEvent>,
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            epochs: Arc::new(RwLock::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
            cancelled: Arc::new(Mutex::new(HashSet::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Cached read. Fresh data is returned as is; otherwise one request per
    /// key runs and every concurrent caller receives its outcome.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn fetch_query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if let Some(data) = self.fresh_data(&key).await {
            debug!("Serving {} from cache", key);
            return decode(data);
        }

        let epoch = self.epoch(key.resource).await;
        let shared = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&key) {
                Some(running) => {
                    debug!("Joining in-flight request for {}", key);
                    running.fetch.clone()
                }
                None => {
                    let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.build_fetch(key.clone(), generation, epoch, fetch);
                    in_flight.insert(
                        key.clone(),
                        InFlight {
                            generation,
                            fetch: fetch.clone(),
                        },
                    );
                    fetch
                }
            }
        };

        decode(shared.await?)
    }

    fn build_fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        generation: u64,
        epoch: u64,
        fetch: F,
    ) -> SharedFetch
    where
        T: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let cache = self.clone();
        async move {
            let mut retries = 0;
            let result = loop {
                match fetch().await {
                    Ok(data) => {
                        break serde_json::to_value(data).map_err(|e| ApiError::Decode {
                            reason: e.to_string(),
                        })
                    }
                    Err(e) if e.is_retryable() && retries < READ_RETRIES => {
                        retries += 1;
                        warn!("Retrying {} after failure: {:?}", key, e);
                    }
                    Err(e) => break Err(e),
                }
            };

            let cancelled = cache.cancelled.lock().await.remove(&generation);
            match &result {
                Ok(_) if cancelled => debug!("Discarding cancelled read of {}", key),
                Ok(data) => cache.store_fetched(&key, data.clone(), epoch).await,
                Err(_) => {}
            }
            cache.finish_fetch(&key, generation).await;
            result
        }
        .boxed()
        .shared()
    }

    async fn store_fetched(&self, key: &QueryKey, data: Value, epoch: u64) {
        let invalidated = self.epoch(key.resource).await != epoch;
        if invalidated {
            debug!("{} was invalidated while loading; stored as stale", key);
        }
        self.entries.write().await.insert(
            key.clone(),
            CacheEntry {
                invalidated,
                ..CacheEntry::new(data)
            },
        );
        self.emit(CacheEvent::Updated(key.clone()));
    }

    async fn finish_fetch(&self, key: &QueryKey, generation: u64) {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.get(key).map(|f| f.generation) == Some(generation) {
            in_flight.remove(key);
        }
    }

    async fn fresh_data(&self, key: &QueryKey) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(key.stale_time()))
            .map(|entry| entry.data.clone())
    }

    async fn epoch(&self, resource: &'static str) -> u64 {
        self.epochs.read().await.get(resource).copied().unwrap_or(0)
    }

    /// Cached value regardless of freshness
    pub async fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let data = self.entries.read().await.get(key)?.data.clone();
        serde_json::from_value(data).ok()
    }

    pub async fn is_fresh(&self, key: &QueryKey) -> bool {
        self.fresh_data(key).await.is_some()
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Mark every entry under `resource` stale and drop its in-flight reads
    #[instrument(skip(self))]
    pub async fn invalidate_queries(&self, resource: &'static str) {
        *self.epochs.write().await.entry(resource).or_insert(0) += 1;

        let invalidated: Vec<QueryKey> = {
            let mut entries = self.entries.write().await;
            entries
                .iter_mut()
                .filter(|(key, _)| key.resource == resource)
                .map(|(key, entry)| {
                    entry.invalidated = true;
                    key.clone()
                })
                .collect()
        };
        self.in_flight
            .lock()
            .await
            .retain(|key, _| key.resource != resource);

        info!("Invalidated {} cached {} queries", invalidated.len(), resource);
        for key in invalidated {
            self.emit(CacheEvent::Invalidated(key));
        }
    }

    /// Detach in-flight reads under `resource` so their results are dropped
    /// instead of landing over an optimistic write. Callers already awaiting
    /// them still receive the outcome.
    pub(crate) async fn cancel_queries(&self, resource: &'static str) {
        let mut in_flight = self.in_flight.lock().await;
        let mut cancelled = self.cancelled.lock().await;
        in_flight.retain(|key, running| {
            if key.resource != resource {
                return true;
            }
            debug!("Cancelled in-flight read of {}", key);
            cancelled.insert(running.generation);
            false
        });
    }

    pub async fn remove_queries(&self, resource: &'static str) {
        self.entries
            .write()
            .await
            .retain(|key, _| key.resource != resource);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.in_flight.lock().await.clear();
        self.cancelled.lock().await.clear();
    }

    pub(crate) async fn set_query_data(&self, key: QueryKey, data: Value) {
        self.entries
            .write()
            .await
            .insert(key.clone(), CacheEntry::new(data));
        self.emit(CacheEvent::Updated(key));
    }

    /// Edit an existing entry in place; returns false when nothing is cached
    pub(crate) async fn update_query_data<F>(&self, key: &QueryKey, change: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        let updated = match self.entries.write().await.get_mut(key) {
            Some(entry) => {
                change(&mut entry.data);
                true
            }
            None => false,
        };
        if updated {
            self.emit(CacheEvent::Updated(key.clone()));
        }
        updated
    }

    pub(crate) async fn snapshot(&self, key: &QueryKey) -> Snapshot {
        Snapshot {
            key: key.clone(),
            entry: self.entries.read().await.get(key).cloned(),
        }
    }

    pub(crate) async fn restore(&self, snapshot: Snapshot) {
        let Snapshot { key, entry } = snapshot;
        {
            let mut entries = self.entries.write().await;
            match entry {
                Some(entry) => entries.insert(key.clone(), entry),
                None => entries.remove(&key),
            };
        }
        debug!("Restored {} from snapshot", key);
        self.emit(CacheEvent::Updated(key));
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|e| ApiError::Decode {
        reason: e.to_string(),
    })
}
