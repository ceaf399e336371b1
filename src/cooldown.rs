//! Action-level cooldowns.
//!
//! A [`Cooldown`] pairs one policy with one [`BucketRegistry`] and answers
//! "may this caller run the action now?". A [`CooldownSet`] stacks several
//! cooldowns on the same action, e.g. a per-user limit plus a per-guild limit.

use std::sync::Arc;
use std::time::Duration;

use crate::bucket::CooldownBucket;
use crate::clock::{Clock, MonotonicClock};
use crate::policy::{CooldownPolicy, SharedPolicy};
use crate::registry::BucketRegistry;
use crate::scope::Identity;

/// The decision returned by a cooldown check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The invocation may proceed.
    Allowed {
        /// Uses left in the caller's bucket after this one.
        remaining: u32,
    },
    /// The invocation is denied.
    Denied {
        /// How long the caller should wait before retrying.
        wait: Duration,
    },
}

impl Decision {
    /// Helper to check if allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Wait time for a denial, zero otherwise.
    pub fn wait(&self) -> Duration {
        match self {
            Decision::Allowed { .. } => Duration::ZERO,
            Decision::Denied { wait } => *wait,
        }
    }
}

/// Whether a check is a real invocation or an informational pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Consume a use.
    #[default]
    Execute,
    /// Listing or help output: always allowed, nothing consumed.
    Help,
}

/// One rate-limited action: a live policy plus its buckets.
///
/// Clones share the same policy and buckets.
///
/// # Examples
/// ```
/// use cooldown::{BucketScope, Cooldown, CooldownPolicy, Identity};
/// use std::time::Duration;
///
/// let policy = CooldownPolicy::new(2, Duration::from_secs(10), BucketScope::USER).unwrap();
/// let cooldown = Cooldown::new(policy);
/// let caller = Identity::in_guild(9, 100, 1000);
///
/// assert!(cooldown.try_consume(&caller));
/// assert!(cooldown.try_consume(&caller));
/// assert!(!cooldown.try_consume(&caller));
/// assert!(cooldown.remaining_cooldown(&caller) > Duration::ZERO);
/// ```
#[derive(Debug, Clone)]
pub struct Cooldown {
    policy: SharedPolicy,
    registry: BucketRegistry,
}

impl Cooldown {
    /// Create a cooldown on the monotonic clock.
    pub fn new(policy: CooldownPolicy) -> Self {
        Self::with_clock(policy, MonotonicClock::default())
    }

    /// Create a cooldown whose buckets read time from `clock`.
    pub fn with_clock<C: Clock + 'static>(policy: CooldownPolicy, clock: C) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        Self {
            policy: SharedPolicy::new(policy),
            registry: BucketRegistry::with_shared_clock(clock),
        }
    }

    /// Current policy snapshot.
    pub fn policy(&self) -> Arc<CooldownPolicy> {
        self.policy.get()
    }

    /// Replace the policy.
    ///
    /// Only buckets created afterwards use the new limits; existing buckets keep
    /// theirs. A changed scope derives keys differently from now on.
    pub fn set_policy(&self, policy: CooldownPolicy) {
        tracing::info!(
            target: "cooldown::cooldown",
            max_uses = policy.max_uses(),
            reset_interval = ?policy.reset_interval(),
            scope = %policy.scope(),
            "cooldown policy replaced"
        );
        self.policy.set(policy);
    }

    /// Buckets of this cooldown.
    pub fn registry(&self) -> &BucketRegistry {
        &self.registry
    }

    /// The caller's bucket, if it has ever been consulted.
    pub fn bucket(&self, identity: &Identity) -> Option<Arc<CooldownBucket>> {
        self.registry.lookup(&self.policy.get(), identity)
    }

    /// Time the caller must wait; zero if their bucket does not exist yet.
    pub fn remaining_cooldown(&self, identity: &Identity) -> Duration {
        self.bucket(identity).map(|b| b.remaining_cooldown()).unwrap_or(Duration::ZERO)
    }

    /// Take one use from the caller's bucket, creating it on first use.
    pub fn try_consume(&self, identity: &Identity) -> bool {
        self.registry.get_or_create(&self.policy.get(), identity).try_consume()
    }

    /// Take one use and describe the outcome.
    ///
    /// The decision comes from the same critical section as the consumption, so a
    /// denial always carries a non-zero wait.
    pub fn check(&self, identity: &Identity) -> Decision {
        let bucket = self.registry.get_or_create(&self.policy.get(), identity);
        match bucket.consume_outcome() {
            Ok(remaining) => Decision::Allowed { remaining },
            Err(wait) => {
                tracing::debug!(
                    target: "cooldown::cooldown",
                    key = %bucket.key(),
                    wait = ?wait,
                    "invocation denied"
                );
                Decision::Denied { wait }
            }
        }
    }

    /// [`check`](Self::check), unless `mode` is [`CheckMode::Help`].
    pub fn check_with(&self, identity: &Identity, mode: CheckMode) -> Decision {
        match mode {
            CheckMode::Execute => self.check(identity),
            CheckMode::Help => Decision::Allowed {
                remaining: self
                    .bucket(identity)
                    .map(|b| b.remaining_uses())
                    .unwrap_or_else(|| self.policy.get().max_uses()),
            },
        }
    }
}

/// Several cooldowns guarding the same action.
///
/// Every member is consulted on each check, so each consumes a use independently;
/// the invocation is allowed only when all members allow it.
#[derive(Debug, Clone, Default)]
pub struct CooldownSet {
    members: Vec<Cooldown>,
}

impl CooldownSet {
    /// Empty set; allows everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cooldown to the set.
    pub fn with(mut self, cooldown: Cooldown) -> Self {
        self.members.push(cooldown);
        self
    }

    /// Add a cooldown to the set in place.
    pub fn push(&mut self, cooldown: Cooldown) {
        self.members.push(cooldown);
    }

    /// Member cooldowns in insertion order.
    pub fn members(&self) -> &[Cooldown] {
        &self.members
    }

    /// Check every member.
    ///
    /// Denied if any member denies, with the longest wait among the denials.
    /// Allowed decisions report the smallest remaining count.
    pub fn check(&self, identity: &Identity) -> Decision {
        self.check_with(identity, CheckMode::Execute)
    }

    /// [`check`](Self::check) with an explicit mode.
    pub fn check_with(&self, identity: &Identity, mode: CheckMode) -> Decision {
        let mut remaining = u32::MAX;
        let mut denied: Option<Duration> = None;

        for member in &self.members {
            match member.check_with(identity, mode) {
                Decision::Allowed { remaining: r } => remaining = remaining.min(r),
                Decision::Denied { wait } => {
                    denied = Some(denied.map_or(wait, |w| w.max(wait)));
                }
            }
        }

        match denied {
            Some(wait) => Decision::Denied { wait },
            None => Decision::Allowed { remaining },
        }
    }

    /// Longest remaining cooldown across members.
    pub fn remaining_cooldown(&self, identity: &Identity) -> Duration {
        self.members
            .iter()
            .map(|m| m.remaining_cooldown(identity))
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

impl FromIterator<Cooldown> for CooldownSet {
    fn from_iter<I: IntoIterator<Item = Cooldown>>(iter: I) -> Self {
        Self { members: iter.into_iter().collect() }
    }
}
