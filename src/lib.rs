#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Cooldown
//!
//! Per-key, time-windowed usage limits for actions such as bot commands: "each user
//! may run this 2 times every 10 seconds", "this guild may run it 5 times a minute".
//!
//! ## Pieces
//!
//! - [`CooldownPolicy`]: validated max uses, window length, and [`BucketScope`].
//! - [`Identity`]: who is calling and where (user, channel, guild ids).
//! - [`CooldownBucket`]: remaining uses and the end of the current window for one key.
//! - [`BucketRegistry`]: lazily created buckets keyed by [`BucketKey`].
//! - [`Cooldown`] / [`CooldownSet`]: the per-action facade.
//! - [`CooldownLayer`]: tower middleware for dispatch layers.
//!
//! Windows roll over lazily: there is no background task, and an expired bucket is
//! reset on its next consumption attempt.
//!
//! ## Quick Start
//!
//! ```rust
//! use cooldown::{BucketScope, Cooldown, CooldownPolicy, Decision, Identity};
//! use std::time::Duration;
//!
//! let policy = CooldownPolicy::new(1, Duration::from_secs(30), BucketScope::USER | BucketScope::GUILD)
//!     .expect("valid policy");
//! let cooldown = Cooldown::new(policy);
//!
//! let caller = Identity::in_guild(42, 7, 1);
//! assert!(cooldown.check(&caller).is_allowed());
//! match cooldown.check(&caller) {
//!     Decision::Denied { wait } => assert!(wait <= Duration::from_secs(30)),
//!     Decision::Allowed { .. } => unreachable!("second use within the window"),
//! }
//! ```

pub mod bucket;
pub mod clock;
pub mod cooldown;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod registry;
pub mod scope;

// Re-exports
pub use bucket::CooldownBucket;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use cooldown::{CheckMode, Cooldown, CooldownSet, Decision};
pub use error::{CooldownError, PolicyError};
pub use middleware::{CooldownLayer, CooldownService, IdentityExtractor};
#[cfg(feature = "serde")]
pub use policy::{PolicyConfig, ScopeConfig};
pub use policy::{CooldownPolicy, SharedPolicy};
pub use registry::BucketRegistry;
pub use scope::{BucketKey, BucketScope, Identity};
