//! Read-through cache for the overview dataset.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::FetchError;

type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, FetchError>> + Send + Sync>;
type SharedFetch<T> = Shared<BoxFuture<'static, Result<Entry<T>, FetchError>>>;

/// A snapshot served by the cache.
#[derive(Debug)]
pub struct Overview<T> {
    /// The aggregate dataset.
    pub data: Arc<T>,
    /// Unix timestamp of the fetch that produced `data`.
    pub fetched_at: i64,
    /// Whether this call was served from the held entry without fetching.
    pub cached: bool,
}

impl<T> Clone for Overview<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            fetched_at: self.fetched_at,
            cached: self.cached,
        }
    }
}

/// The single held entry.
#[derive(Debug)]
struct Entry<T> {
    data: Arc<T>,
    fetched_at: i64,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            fetched_at: self.fetched_at,
        }
    }
}

struct State<T> {
    entry: Option<Entry<T>>,
    inflight: Option<SharedFetch<T>>,
}

struct Inner<T> {
    fetch: FetchFn<T>,
    state: Mutex<State<T>>,
}

/// Memoizes one expensive aggregate fetch behind a single-entry cache.
///
/// Concurrent callers that miss (or arrive during a forced refresh) share a
/// single in-flight fetch, so at most one underlying fetch runs at a time
/// no matter how many callers pile up. Cloning the cache yields another
/// handle to the same entry.
pub struct OverviewCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for OverviewCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> OverviewCache<T> {
    /// Create a cache around the given fetch function.
    ///
    /// The function is invoked on misses and forced refreshes; it is the
    /// only way data enters the cache.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let fetch: FetchFn<T> = Arc::new(move || fetch().boxed());
        Self {
            inner: Arc::new(Inner {
                fetch,
                state: Mutex::new(State {
                    entry: None,
                    inflight: None,
                }),
            }),
        }
    }

    /// Return the overview, fetching if needed.
    ///
    /// With `force_refresh` unset, a held entry is returned immediately with
    /// `cached = true` and no fetch occurs. Otherwise the caller joins the
    /// in-flight fetch if one exists, or starts exactly one; every coalesced
    /// caller receives that fetch's result (value or error) with
    /// `cached = false`.
    ///
    /// A failed fetch surfaces to all waiters and leaves any previously held
    /// entry untouched.
    pub async fn get(&self, force_refresh: bool) -> Result<Overview<T>, FetchError> {
        let shared = {
            let mut state = self.inner.state.lock().await;
            if !force_refresh {
                if let Some(entry) = &state.entry {
                    return Ok(Overview {
                        data: Arc::clone(&entry.data),
                        fetched_at: entry.fetched_at,
                        cached: true,
                    });
                }
            }
            match &state.inflight {
                Some(inflight) => inflight.clone(),
                None => {
                    let shared = Self::start_fetch(&self.inner);
                    state.inflight = Some(shared.clone());
                    // Detached driver: the fetch runs to completion even if
                    // every waiter is cancelled.
                    tokio::spawn(shared.clone().map(|_| ()));
                    shared
                }
            }
        };

        let entry = shared.await?;
        Ok(Overview {
            data: entry.data,
            fetched_at: entry.fetched_at,
            cached: false,
        })
    }

    /// Clear the held entry; the next [`get`](Self::get) fetches regardless
    /// of its flag.
    ///
    /// Safe with no entry present and safe mid-fetch. An in-flight fetch is
    /// not cancelled and its result still populates the cache when it lands:
    /// invalidation only promises that the next `get` observes a fetch
    /// newer than the entry it cleared.
    pub async fn invalidate(&self) {
        let mut state = self.inner.state.lock().await;
        state.entry = None;
        debug!("overview cache invalidated");
    }

    /// Build the shared future for one fetch. The future itself owns the
    /// post-fetch bookkeeping, so every waiter just awaits it.
    fn start_fetch(inner: &Arc<Inner<T>>) -> SharedFetch<T> {
        let inner = Arc::clone(inner);
        async move {
            debug!("overview fetch started");
            let result = (inner.fetch)().await;

            let mut state = inner.state.lock().await;
            state.inflight = None;
            match result {
                Ok(data) => {
                    let entry = Entry {
                        data: Arc::new(data),
                        fetched_at: now_secs(),
                    };
                    state.entry = Some(entry.clone());
                    debug!(fetched_at = entry.fetched_at, "overview fetch completed");
                    Ok(entry)
                }
                Err(e) => {
                    // The held entry, if any, stays: stale-but-valid data
                    // must survive a failed refresh.
                    warn!(error = %e, "overview fetch failed");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn now_secs() -> i64 {
    #[allow(clippy::cast_possible_wrap)]
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    secs
}
