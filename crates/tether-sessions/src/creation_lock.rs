//! Keyed asynchronous creation lock.
//!
//! Each key maps to the shared future of the creation currently in flight.
//! Callers arriving while a creation is pending await that same future and
//! receive its outcome. The entry is dropped as soon as the work finishes,
//! whether it succeeded or failed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tether_core::errors::SessionError;

type Pending<T> = Shared<BoxFuture<'static, Result<T, SessionError>>>;

struct InFlight<T: Clone> {
    generation: u64,
    pending: Pending<T>,
}

type InFlightMap<T> = Arc<Mutex<HashMap<String, InFlight<T>>>>;

pub(crate) struct CreationLock<T: Clone> {
    inflight: InFlightMap<T>,
    next_generation: AtomicU64,
}

impl<T> CreationLock<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Run `work` for `key` unless a creation for `key` is already pending,
    /// in which case wait for that one instead.
    ///
    /// The work is spawned onto the runtime so it runs to completion even if
    /// every caller stops waiting.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T, SessionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SessionError>> + Send + 'static,
    {
        let pending = {
            let mut inflight = self.inflight.lock();
            match inflight.get(key) {
                Some(existing) => {
                    tracing::debug!(key, "Joining in-flight session creation");
                    existing.pending.clone()
                }
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let map = Arc::clone(&self.inflight);
                    let owned_key = key.to_owned();
                    let fut = work();
                    // The release below blocks on `inflight` until this insert is done.
                    let task = tokio::spawn(async move {
                        let outcome = fut.await;
                        release(&map, &owned_key, generation);
                        outcome
                    });
                    let pending: Pending<T> = async move {
                        task.await.unwrap_or_else(|e| {
                            Err(SessionError::Io(format!("session creation task failed: {e}")))
                        })
                    }
                    .boxed()
                    .shared();
                    inflight.insert(
                        key.to_owned(),
                        InFlight {
                            generation,
                            pending: pending.clone(),
                        },
                    );
                    pending
                }
            }
        };
        pending.await
    }

    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }
}

fn release<T: Clone>(map: &InFlightMap<T>, key: &str, generation: u64) {
    let mut inflight = map.lock();
    if inflight
        .get(key)
        .is_some_and(|entry| entry.generation == generation)
    {
        inflight.remove(key);
    }
}
