//! Keyed cache for server reads.
//!
//! Every read is stored under a [`QueryKey`] as JSON together with the time
//! it arrived. A fetch is answered from the cache while the entry is fresh.
//! Otherwise the fetcher runs, with a small retry budget. Concurrent fetches
//! of one key share a single in-flight request.
//!
//! The in-flight future writes its own result back into the cache, so the
//! entry is updated even if the caller that started it goes away.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::ApiError;

use super::{QueryKey, QueryOptions, QueryState};

/// Entries unused for this long are dropped by [`QueryClient::collect_garbage`]
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

type FetchResult = Result<Value, Arc<ApiError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct InFlight {
    id: u64,
    future: SharedFetch,
}

struct CacheEntry {
    data: Option<Value>,
    cached_at: Option<DateTime<Utc>>,
    last_used: DateTime<Utc>,
    stale_time: Duration,
    invalidated: bool,
    in_flight: Option<InFlight>,
}

impl CacheEntry {
    fn empty() -> Self {
        Self {
            data: None,
            cached_at: None,
            last_used: Utc::now(),
            stale_time: Duration::ZERO,
            invalidated: false,
            in_flight: None,
        }
    }

    fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        // Clock skew can make the age negative; count that as brand new
        self.cached_at
            .map(|at| (now - at).to_std().unwrap_or_default())
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        if self.invalidated || self.data.is_none() {
            return true;
        }
        match self.age(now) {
            Some(age) => age >= self.stale_time,
            None => true,
        }
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    next_fetch_id: Mutex<u64>,
    gc_time: Duration,
}

enum Step {
    Fresh(Value),
    Wait(SharedFetch),
}

/// Shared handle to the query cache. Cloning is cheap.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self::with_gc_time(DEFAULT_GC_TIME)
    }

    pub fn with_gc_time(gc_time: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                next_fetch_id: Mutex::new(0),
                gc_time,
            }),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        lock_entries(&self.inner)
    }

    /// Read through the cache.
    ///
    /// Disabled queries return `Idle` without calling `fetcher`. A fresh
    /// entry is returned as is. Otherwise the fetch runs (or an identical one
    /// already running is joined) and its outcome is returned; on failure the
    /// last good value comes back as `stale_data`.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if !options.enabled {
            debug!(%key, "Query disabled");
            return QueryState::Idle;
        }

        let step = self.begin(&key, options, fetcher);
        let result = match step {
            Step::Fresh(value) => match serde_json::from_value::<T>(value) {
                Ok(data) => {
                    return QueryState::Success {
                        data,
                        is_stale: false,
                    }
                }
                Err(e) => Err(Arc::new(ApiError::Serialization(e))),
            },
            Step::Wait(shared) => shared.await,
        };

        match result.and_then(|value| {
            serde_json::from_value::<T>(value).map_err(|e| Arc::new(ApiError::Serialization(e)))
        }) {
            Ok(data) => QueryState::Success {
                data,
                is_stale: options.stale_time.is_zero(),
            },
            Err(error) => QueryState::Error {
                error,
                stale_data: self.get_query_data(&key),
            },
        }
    }

    /// Decide under the lock whether to answer from cache, join a running
    /// request or start a new one.
    fn begin<T, F, Fut>(&self, key: &QueryKey, options: &QueryOptions, fetcher: F) -> Step
    where
        T: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let now = Utc::now();
        let mut entries = self.entries();
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::empty);
        entry.last_used = now;
        entry.stale_time = options.stale_time;

        if !entry.is_stale(now) {
            if let Some(data) = &entry.data {
                debug!(%key, "Query served from cache");
                return Step::Fresh(data.clone());
            }
        }

        if let Some(in_flight) = &entry.in_flight {
            debug!(%key, "Joining in-flight query");
            return Step::Wait(in_flight.future.clone());
        }

        let id = self.next_fetch_id();
        let future = run_fetch(
            Arc::downgrade(&self.inner),
            key.clone(),
            id,
            options.clone(),
            fetcher,
        )
        .boxed()
        .shared();
        entry.in_flight = Some(InFlight {
            id,
            future: future.clone(),
        });
        debug!(%key, "Query started");
        Step::Wait(future)
    }

    fn next_fetch_id(&self) -> u64 {
        let mut next = self
            .inner
            .next_fetch_id
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *next += 1;
        *next
    }

    /// Run a write and, if it succeeds, mark the given key prefixes stale.
    /// Writes are never retried.
    pub async fn mutate<T, Fut>(&self, mutation: Fut, invalidates: &[QueryKey]) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = mutation.await;
        if result.is_ok() {
            for prefix in invalidates {
                self.invalidate_queries(prefix);
            }
        }
        result
    }

    pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.entries().get(key)?.data.clone()?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(%key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Seed or overwrite an entry. The value counts as freshly fetched.
    pub fn set_query_data<T: Serialize>(&self, key: QueryKey, data: &T) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "Could not cache value");
                return;
            }
        };
        let now = Utc::now();
        let mut entries = self.entries();
        let entry = entries.entry(key).or_insert_with(CacheEntry::empty);
        entry.data = Some(value);
        entry.cached_at = Some(now);
        entry.last_used = now;
        entry.invalidated = false;
    }

    /// Stale if missing, invalidated, or older than its stale time
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries()
            .get(key)
            .map_or(true, |entry| entry.is_stale(Utc::now()))
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries()
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    /// Mark every entry under `prefix` stale. Data is kept so it can still
    /// be shown while the next fetch runs.
    ///
    /// A request already running for such an entry may have read the server
    /// before the change, so it is detached: its waiters still get its
    /// answer, but it no longer writes back and later reads start afresh.
    pub fn invalidate_queries(&self, prefix: &QueryKey) {
        let mut entries = self.entries();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                if entry.in_flight.take().is_some() {
                    debug!(%key, "Detached in-flight query");
                }
                count += 1;
            }
        }
        debug!(%prefix, count, "Invalidated queries");
    }

    /// Forget every entry under `prefix`. Requests still running for them
    /// finish without writing back.
    pub fn remove_queries(&self, prefix: &QueryKey) {
        self.entries().retain(|key, _| !key.starts_with(prefix));
    }

    pub fn clear(&self) {
        self.entries().clear();
        debug!("Query cache cleared");
    }

    /// Drop entries nobody has asked for within the gc window
    pub fn collect_garbage(&self) -> usize {
        let now = Utc::now();
        let gc_time = self.inner.gc_time;
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| {
            let idle = (now - entry.last_used).to_std().unwrap_or_default();
            entry.in_flight.is_some() || idle < gc_time
        });
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Collected unused queries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

fn lock_entries(inner: &Inner) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
    inner.entries.lock().unwrap_or_else(|e| e.into_inner())
}

async fn run_fetch<T, F, Fut>(
    inner: Weak<Inner>,
    key: QueryKey,
    id: u64,
    options: QueryOptions,
    fetcher: F,
) -> FetchResult
where
    T: Serialize + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let result = with_retry(&key, &options, &fetcher)
        .await
        .and_then(|data| serde_json::to_value(data).map_err(ApiError::from))
        .map_err(Arc::new);

    let Some(inner) = inner.upgrade() else {
        return result;
    };
    let mut entries = lock_entries(&inner);
    match entries.get_mut(&key) {
        Some(entry) if entry.in_flight.as_ref().map(|f| f.id) == Some(id) => {
            entry.in_flight = None;
            if let Ok(value) = &result {
                let now = Utc::now();
                entry.data = Some(value.clone());
                entry.cached_at = Some(now);
                entry.invalidated = false;
            }
        }
        _ => debug!(%key, "Query was removed or invalidated while in flight, discarding result"),
    }
    result
}

async fn with_retry<T, F, Fut>(key: &QueryKey, options: &QueryOptions, fetcher: &F) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(data) => return Ok(data),
            Err(e) if attempt < options.retry && e.is_retryable() => {
                attempt += 1;
                warn!(%key, attempt, error = %e, "Query failed, retrying");
                tokio::time::sleep(options.retry_delay).await;
            }
            Err(e) => {
                debug!(%key, error = %e, "Query failed");
                return Err(e);
            }
        }
    }
}
