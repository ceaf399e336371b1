//! Cooldown bucket: per-key usage counter with a lazily rolled window.
//!
//! A bucket is in one of three conceptual states:
//! - **Active**: uses remain in the current window.
//! - **Exhausted**: no uses remain and the window has not yet ended.
//! - **Expired**: the window has ended; the next [`CooldownBucket::try_consume`]
//!   rolls it over to a fresh window before deciding.
//!
//! Rollover happens only on consumption. Reads such as
//! [`CooldownBucket::remaining_cooldown`] report the stored state as-is.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::clock::Clock;
use crate::policy::CooldownPolicy;
use crate::scope::{BucketKey, Identity};

#[derive(Debug)]
struct BucketState {
    remaining_uses: u32,
    resets_at: Duration,
}

/// Rate-limit state for one bucket key.
///
/// `max_uses` and `reset_interval` are copied from the policy at creation time and
/// never change afterwards.
#[derive(Debug)]
pub struct CooldownBucket {
    state: Mutex<BucketState>,
    max_uses: u32,
    reset_interval: Duration,
    identity: Identity,
    key: BucketKey,
    clock: Arc<dyn Clock>,
}

impl CooldownBucket {
    /// Create a full bucket whose first window ends `reset_interval` from now.
    ///
    /// `identity` is the effective identity (already reduced to the policy's scope).
    pub fn new(policy: &CooldownPolicy, identity: Identity, clock: Arc<dyn Clock>) -> Self {
        let key = BucketKey::from_identity(&identity);
        let resets_at = clock.now().saturating_add(policy.reset_interval());
        tracing::debug!(
            target: "cooldown::bucket",
            key = %key,
            max_uses = policy.max_uses(),
            reset_interval = ?policy.reset_interval(),
            "bucket created"
        );
        Self {
            state: Mutex::new(BucketState { remaining_uses: policy.max_uses(), resets_at }),
            max_uses: policy.max_uses(),
            reset_interval: policy.reset_interval(),
            identity,
            key,
            clock,
        }
    }

    /// Attempt to take one use from this bucket.
    ///
    /// Returns `false` when the current window has no uses left. An expired window is
    /// reset to `max_uses` (not partially refilled) before the check. Concurrent
    /// callers on the same bucket are serialized; other buckets are unaffected.
    pub fn try_consume(&self) -> bool {
        self.consume_outcome().is_ok()
    }

    /// Consume and report in one critical section: `Ok(remaining uses)` on success,
    /// `Err(wait until the window ends)` on denial. The wait is never zero.
    pub(crate) fn consume_outcome(&self) -> Result<u32, Duration> {
        let mut state = self.lock();
        let now = self.clock.now();

        if now >= state.resets_at {
            state.remaining_uses = self.max_uses;
            state.resets_at = now.saturating_add(self.reset_interval);
            tracing::debug!(
                target: "cooldown::bucket",
                key = %self.key,
                "window rolled over"
            );
        }

        if state.remaining_uses > 0 {
            state.remaining_uses -= 1;
            tracing::trace!(
                target: "cooldown::bucket",
                key = %self.key,
                remaining = state.remaining_uses,
                "use consumed"
            );
            Ok(state.remaining_uses)
        } else {
            // now < resets_at here, otherwise the window would have rolled over
            let wait = state.resets_at.saturating_sub(now);
            tracing::debug!(
                target: "cooldown::bucket",
                key = %self.key,
                wait = ?wait,
                "bucket exhausted"
            );
            Err(wait)
        }
    }

    /// Time until the caller may use this bucket again.
    ///
    /// Zero while uses remain. Otherwise the time left until `resets_at`, clamped at
    /// zero. A window that has expired but not yet been rolled over reports zero.
    pub fn remaining_cooldown(&self) -> Duration {
        let state = self.lock();
        if state.remaining_uses > 0 {
            Duration::ZERO
        } else {
            state.resets_at.saturating_sub(self.clock.now())
        }
    }

    /// Uses left in the stored window.
    pub fn remaining_uses(&self) -> u32 {
        self.lock().remaining_uses
    }

    /// End of the stored window, on the bucket clock's axis.
    pub fn resets_at(&self) -> Duration {
        self.lock().resets_at
    }

    /// Uses allowed per window.
    pub fn max_uses(&self) -> u32 {
        self.max_uses
    }

    /// Window length.
    pub fn reset_interval(&self) -> Duration {
        self.reset_interval
    }

    /// Effective identity this bucket belongs to.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Key this bucket is registered under.
    pub fn key(&self) -> &BucketKey {
        &self.key
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().expect("cooldown bucket state poisoned")
    }
}

impl PartialEq for CooldownBucket {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for CooldownBucket {}

impl Hash for CooldownBucket {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Display for CooldownBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cooldown bucket {}", self.key)
    }
}
