//! Validated cooldown policy.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::error::PolicyError;
use crate::scope::BucketScope;

/// How many uses are allowed per window, how long a window lasts, and how callers
/// are partitioned into buckets.
///
/// Construction validates the values; a policy that exists is always usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownPolicy {
    max_uses: u32,
    reset_interval: Duration,
    scope: BucketScope,
}

impl CooldownPolicy {
    /// Create a policy, rejecting `max_uses == 0` and a zero `reset_interval`.
    ///
    /// # Examples
    /// ```
    /// use cooldown::{BucketScope, CooldownPolicy};
    /// use std::time::Duration;
    /// let policy = CooldownPolicy::new(2, Duration::from_secs(10), BucketScope::USER).unwrap();
    /// assert_eq!(policy.max_uses(), 2);
    /// ```
    pub fn new(
        max_uses: u32,
        reset_interval: Duration,
        scope: BucketScope,
    ) -> Result<Self, PolicyError> {
        if max_uses == 0 {
            return Err(PolicyError::InvalidMaxUses { provided: max_uses });
        }
        if reset_interval.is_zero() {
            return Err(PolicyError::InvalidResetInterval(reset_interval));
        }
        Ok(Self { max_uses, reset_interval, scope })
    }

    /// Create a policy whose window is given in fractional seconds.
    pub fn from_secs(
        max_uses: u32,
        reset_after_secs: f64,
        scope: BucketScope,
    ) -> Result<Self, PolicyError> {
        if !reset_after_secs.is_finite() || reset_after_secs <= 0.0 {
            return Err(PolicyError::InvalidResetSeconds(reset_after_secs));
        }
        let reset_interval = Duration::try_from_secs_f64(reset_after_secs)
            .map_err(|_| PolicyError::InvalidResetSeconds(reset_after_secs))?;
        Self::new(max_uses, reset_interval, scope)
    }

    /// Uses allowed per window.
    pub fn max_uses(&self) -> u32 {
        self.max_uses
    }

    /// Length of a window.
    pub fn reset_interval(&self) -> Duration {
        self.reset_interval
    }

    /// Identity components that select a bucket.
    pub fn scope(&self) -> BucketScope {
        self.scope
    }
}

/// Live-replaceable policy shared between handles.
///
/// Reads are lock-free snapshots. Replacing the policy does not touch buckets that
/// already exist; they keep the limits they were created with.
#[derive(Debug, Clone)]
pub struct SharedPolicy {
    inner: Arc<ArcSwap<CooldownPolicy>>,
}

impl SharedPolicy {
    /// Wrap an initial policy.
    pub fn new(policy: CooldownPolicy) -> Self {
        Self { inner: Arc::new(ArcSwap::from_pointee(policy)) }
    }

    /// Snapshot the current policy (cheap clone of Arc).
    pub fn get(&self) -> Arc<CooldownPolicy> {
        self.inner.load_full()
    }

    /// Replace the policy entirely.
    pub fn set(&self, policy: CooldownPolicy) {
        self.inner.store(Arc::new(policy));
    }
}

/// Raw, deserializable form of a [`CooldownPolicy`].
///
/// ```
/// # #[cfg(feature = "serde")]
/// # {
/// use cooldown::{CooldownPolicy, PolicyConfig};
/// let raw: PolicyConfig = serde_json::from_str(
///     r#"{ "max_uses": 3, "reset_after_secs": 30.0, "scope": ["user", "guild"] }"#,
/// ).unwrap();
/// let policy = CooldownPolicy::try_from(raw).unwrap();
/// assert_eq!(policy.max_uses(), 3);
/// # }
/// ```
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct PolicyConfig {
    /// Uses allowed per window.
    pub max_uses: u32,
    /// Window length in seconds.
    pub reset_after_secs: f64,
    /// Scope names; omitted or `"global"` means one shared bucket.
    #[serde(default)]
    pub scope: ScopeConfig,
}

/// Scope as written in configuration: a single name or a list of names.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum ScopeConfig {
    /// One name, e.g. `"user"` or `"global"`.
    One(String),
    /// Several names combined, e.g. `["user", "channel"]`.
    Many(Vec<String>),
}

#[cfg(feature = "serde")]
impl Default for ScopeConfig {
    fn default() -> Self {
        ScopeConfig::One("global".to_string())
    }
}

#[cfg(feature = "serde")]
impl TryFrom<&ScopeConfig> for BucketScope {
    type Error = PolicyError;

    fn try_from(value: &ScopeConfig) -> Result<Self, Self::Error> {
        match value {
            ScopeConfig::One(name) => BucketScope::parse_name(name),
            ScopeConfig::Many(names) => names.iter().try_fold(BucketScope::GLOBAL, |acc, name| {
                Ok(acc | BucketScope::parse_name(name)?)
            }),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<PolicyConfig> for CooldownPolicy {
    type Error = PolicyError;

    fn try_from(raw: PolicyConfig) -> Result<Self, Self::Error> {
        let scope = BucketScope::try_from(&raw.scope)?;
        CooldownPolicy::from_secs(raw.max_uses, raw.reset_after_secs, scope)
    }
}
