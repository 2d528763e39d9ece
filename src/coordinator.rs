//! Deduplicating, TTL-gated access to the rate providers.
//!
//! Each data source has at most one resolution cycle running at a time.
//! Callers that arrive while a cycle is running are queued behind it and all
//! receive the single outcome of that cycle, in the order they registered.

use crate::core::retry::with_retry;
use crate::core::{Clock, DataSource, FetchError, FetchResult, RetryPolicy};
use crate::providers::RateFetcher;
use crate::store::RateStore;
use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

type Waiter = Box<dyn FnOnce(FetchResult) + Send + 'static>;

/// Waiters of the cycle currently resolving for one source. An entry exists
/// only while its cycle is in flight.
#[derive(Default)]
struct PendingRequest {
    waiters: Vec<Waiter>,
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorOptions {
    /// Maximum age of a stored payload that is still served without a fetch.
    pub ttl: Duration,
    pub retry: RetryPolicy,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        CoordinatorOptions {
            ttl: Duration::from_secs(600),
            retry: RetryPolicy::default(),
        }
    }
}

struct Inner {
    fetcher: Arc<dyn RateFetcher>,
    store: Arc<RateStore>,
    clock: Arc<dyn Clock>,
    options: CoordinatorOptions,
    pending: Mutex<HashMap<DataSource, PendingRequest>>,
}

/// Cheap to clone; clones share the same in-flight state.
#[derive(Clone)]
pub struct FetchCoordinator {
    inner: Arc<Inner>,
}

impl FetchCoordinator {
    pub fn new(
        fetcher: Arc<dyn RateFetcher>,
        store: Arc<RateStore>,
        clock: Arc<dyn Clock>,
        options: CoordinatorOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                store,
                clock,
                options,
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Registers `on_complete` for the next outcome of `source`.
    ///
    /// The first caller of a cycle starts it on the Tokio runtime; everyone
    /// arriving before it resolves joins it. `on_complete` is invoked exactly
    /// once, never while internal locks are held, so it may call back into
    /// the coordinator.
    ///
    /// Starting a cycle needs a Tokio runtime. Without one, `on_complete`
    /// receives [`FetchError::Interrupted`] right away and no state is kept.
    pub fn request_rates<F>(&self, source: DataSource, on_complete: F)
    where
        F: FnOnce(FetchResult) + Send + 'static,
    {
        let runtime = Handle::try_current();
        let mut pending = self.inner.lock_pending();

        if let Some(request) = pending.get_mut(&source) {
            request.waiters.push(Box::new(on_complete));
            debug!(
                waiters = request.waiters.len(),
                "Joined in-flight request for {source}"
            );
            return;
        }

        let handle = match runtime {
            Ok(handle) => handle,
            Err(e) => {
                drop(pending);
                error!("Cannot start a request for {source}: {e}");
                on_complete(Err(FetchError::Interrupted(format!(
                    "no async runtime to fetch {source}: {e}"
                ))));
                return;
            }
        };

        pending
            .entry(source)
            .or_default()
            .waiters
            .push(Box::new(on_complete));
        drop(pending);

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move { inner.run_cycle(source).await });
    }

    /// Awaits the next outcome of `source`, sharing any cycle already running.
    pub async fn fetch(&self, source: DataSource) -> FetchResult {
        let (tx, rx) = oneshot::channel();
        self.request_rates(source, move |result| {
            let _ = tx.send(result);
        });
        rx.await.unwrap_or_else(|_| {
            Err(FetchError::Interrupted(format!(
                "request for {source} was dropped"
            )))
        })
    }

    pub fn last_fetch_timestamp(&self, source: DataSource) -> Option<DateTime<Utc>> {
        self.inner.store.last_fetch_timestamp(source)
    }

    pub fn is_in_flight(&self, source: DataSource) -> bool {
        self.inner.lock_pending().contains_key(&source)
    }
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<DataSource, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_cycle(&self, source: DataSource) {
        let result = AssertUnwindSafe(self.resolve(source))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!("Resolving {source} panicked");
                Err(FetchError::Interrupted(format!(
                    "resolving {source} panicked"
                )))
            });
        self.dispatch(source, result);
    }

    fn is_fresh(&self, source: DataSource) -> bool {
        let Some(fetched_at) = self.store.last_fetch_timestamp(source) else {
            return false;
        };
        let ttl = TimeDelta::from_std(self.options.ttl).unwrap_or(TimeDelta::MAX);
        let age = self.clock.now() - fetched_at;
        debug!("{source} cache age {}s, ttl {}s", age.num_seconds(), ttl.num_seconds());
        age < ttl
    }

    async fn resolve(&self, source: DataSource) -> FetchResult {
        if self.is_fresh(source) {
            if let Some(payload) = self.store.load(source) {
                info!("Serving cached {source} rates");
                return Ok(payload);
            }
        }

        debug!("Cache MISS for {source}, fetching");
        let fetcher = &self.fetcher;
        let payload = with_retry(|| fetcher.fetch(source), self.options.retry)
            .await
            .inspect_err(|e| warn!("Fetching {source} failed: {e}"))?;

        if payload.source() != source {
            return Err(FetchError::Decode(format!(
                "expected {source} payload, got {}",
                payload.source()
            )));
        }

        // Stored before anyone is notified, so a waiter that asks again sees it.
        if let Err(e) = self.store.save(source, &payload) {
            warn!("Failed to persist {source} rates: {e:#}");
        }
        info!("Fetched fresh {source} rates");
        Ok(payload)
    }

    fn dispatch(&self, source: DataSource, result: FetchResult) {
        let waiters = self
            .lock_pending()
            .remove(&source)
            .map(|request| request.waiters)
            .unwrap_or_default();

        debug!(
            waiters = waiters.len(),
            ok = result.is_ok(),
            "Dispatching {source} result"
        );
        for waiter in waiters {
            let result = result.clone();
            if catch_unwind(AssertUnwindSafe(move || waiter(result))).is_err() {
                error!("A {source} rates callback panicked");
            }
        }
    }
}
