//! Registry of cooldown buckets keyed by [`BucketKey`].
//!
//! Buckets are created lazily on first use and stay resident for the lifetime of
//! the registry.

use std::sync::Arc;

use dashmap::DashMap;

use crate::bucket::CooldownBucket;
use crate::clock::{Clock, MonotonicClock};
use crate::policy::CooldownPolicy;
use crate::scope::{BucketKey, Identity};

/// Concurrent key → bucket map.
///
/// Backed by a sharded map, so inserts of unrelated keys do not contend on one lock.
/// Clones share the same buckets.
#[derive(Clone, Debug)]
pub struct BucketRegistry {
    buckets: Arc<DashMap<BucketKey, Arc<CooldownBucket>>>,
    clock: Arc<dyn Clock>,
}

impl Default for BucketRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketRegistry {
    /// Empty registry on the monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::default())
    }

    /// Empty registry whose buckets read time from `clock`.
    pub fn with_clock<C: Clock + 'static>(clock: C) -> Self {
        Self::with_shared_clock(Arc::new(clock))
    }

    pub(crate) fn with_shared_clock(clock: Arc<dyn Clock>) -> Self {
        Self { buckets: Arc::new(DashMap::new()), clock }
    }

    /// Return the bucket for `identity` under `policy`, creating it if absent.
    ///
    /// Creation is insert-if-absent: when two callers race on a new key, both get the
    /// bucket that was published first.
    pub fn get_or_create(&self, policy: &CooldownPolicy, identity: &Identity) -> Arc<CooldownBucket> {
        let (key, effective) = BucketKey::derive(policy.scope(), identity);
        if let Some(existing) = self.buckets.get(&key) {
            return existing.value().clone();
        }
        self.buckets
            .entry(key)
            .or_insert_with(|| Arc::new(CooldownBucket::new(policy, effective, self.clock.clone())))
            .value()
            .clone()
    }

    /// Return the bucket for `identity` under `policy` without creating one.
    pub fn lookup(&self, policy: &CooldownPolicy, identity: &Identity) -> Option<Arc<CooldownBucket>> {
        let (key, _) = BucketKey::derive(policy.scope(), identity);
        self.get(&key)
    }

    /// Return the bucket registered under `key`, if any.
    pub fn get(&self, key: &BucketKey) -> Option<Arc<CooldownBucket>> {
        self.buckets.get(key).map(|entry| entry.value().clone())
    }

    /// Number of buckets created so far.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no bucket has been created yet.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Snapshot `(key, remaining_uses)` pairs sorted by key.
    pub fn snapshot(&self) -> Vec<(BucketKey, u32)> {
        let mut entries: Vec<(BucketKey, u32)> = self
            .buckets
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().remaining_uses()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
