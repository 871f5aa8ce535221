//! Keyed query slots with staleness and request coalescing
//!
//! Each key holds at most one value and at most one in-flight fetch.
//! Readers of a stale key share the in-flight fetch instead of starting
//! their own. Every fetch, invalidation or write takes a new generation
//! from a counter that never repeats, so a fetch started earlier can no
//! longer install its result. Keys with no value and no fetch in flight
//! are dropped from the map.

use crate::errors::Result;
use crate::metrics;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

type Fetch<V> = Shared<BoxFuture<'static, Result<V>>>;

struct Slot<V> {
    value: Option<(Instant, V)>,
    inflight: Option<Fetch<V>>,
    generation: u64,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            value: None,
            inflight: None,
            generation: 0,
        }
    }
}

type SlotMap<K, V> = Arc<Mutex<HashMap<K, Slot<V>>>>;

pub struct QuerySlots<K, V> {
    name: &'static str,
    stale_after: Duration,
    slots: SlotMap<K, V>,
    generations: AtomicU64,
}

impl<K, V> QuerySlots<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, stale_after: Duration) -> Self {
        Self {
            name,
            stale_after,
            slots: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(1),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve a fresh value, join the in-flight fetch, or start one
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.lock();
            let slot = slots.entry(key.clone()).or_default();

            if let Some((stored_at, value)) = &slot.value {
                if stored_at.elapsed() < self.stale_after {
                    metrics::record_cache(true, self.name);
                    tracing::debug!(cache = self.name, key = ?key, "Cache hit");
                    return Ok(value.clone());
                }
            }

            match &slot.inflight {
                Some(pending) => {
                    metrics::record_cache_coalesced(self.name);
                    tracing::debug!(cache = self.name, key = ?key, "Joining in-flight fetch");
                    pending.clone()
                }
                None => {
                    metrics::record_cache(false, self.name);
                    tracing::debug!(cache = self.name, key = ?key, "Cache miss, fetching");

                    let generation = self.next_generation();
                    slot.generation = generation;
                    let slots_handle = Arc::clone(&self.slots);
                    let request = fetch();
                    let pending = async move {
                        let result = request.await;
                        adopt(&slots_handle, key, generation, &result);
                        result
                    }
                    .boxed()
                    .shared();

                    slot.inflight = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Drop the value and detach any in-flight fetch
    pub fn invalidate(&self, key: &K) {
        if self.lock().remove(key).is_some() {
            metrics::record_cache_invalidation(self.name);
            tracing::debug!(cache = self.name, key = ?key, "Cache slot invalidated");
        }
    }

    /// Write-through: install `value` as the fresh result for `key`
    pub fn put(&self, key: K, value: V) {
        let generation = self.next_generation();
        self.lock().insert(
            key,
            Slot {
                value: Some((Instant::now(), value)),
                inflight: None,
                generation,
            },
        );
    }

    /// Whether `key` currently holds a fresh value
    pub fn is_fresh(&self, key: &K) -> bool {
        self.lock()
            .get(key)
            .and_then(|slot| slot.value.as_ref())
            .is_some_and(|(stored_at, _)| stored_at.elapsed() < self.stale_after)
    }

    /// Drop every slot
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Install a finished fetch unless the slot moved on while it ran.
/// Failures are never stored; a failed key with no earlier value is removed.
fn adopt<K, V>(slots: &SlotMap<K, V>, key: K, generation: u64, result: &Result<V>)
where
    K: Eq + Hash,
    V: Clone,
{
    let mut slots = slots.lock().unwrap_or_else(|e| e.into_inner());
    let Some(slot) = slots.get_mut(&key) else {
        return;
    };
    if slot.generation != generation {
        return;
    }

    slot.inflight = None;
    match result {
        Ok(value) => slot.value = Some((Instant::now(), value.clone())),
        Err(_) if slot.value.is_none() => {
            slots.remove(&key);
        }
        Err(_) => {}
    }
}
