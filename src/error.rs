//! Error types for cooldown policies and the cooldown middleware.
use std::fmt;
use std::time::Duration;

/// Errors produced when validating a [`CooldownPolicy`](crate::CooldownPolicy).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PolicyError {
    /// `max_uses` must be at least 1.
    #[error("max_uses must be > 0 (got {provided})")]
    InvalidMaxUses {
        /// Value provided by caller.
        provided: u32,
    },
    /// The reset interval must be strictly positive.
    #[error("reset_interval must be > 0 (got {0:?})")]
    InvalidResetInterval(Duration),
    /// Fractional-seconds window that is not a finite, positive, representable duration.
    #[error("reset_after_secs must be a finite number > 0 (got {0})")]
    InvalidResetSeconds(f64),
    /// Scope name that is not one of `user`, `channel`, `guild`, `global`.
    #[error("unknown cooldown scope '{0}'")]
    UnknownScope(String),
}

/// Error returned by [`CooldownService`](crate::CooldownService).
#[derive(Debug, Clone)]
pub enum CooldownError<E> {
    /// The caller's bucket has no uses left in the current window.
    CoolingDown {
        /// How long until the bucket's window resets.
        wait: Duration,
    },
    /// The inner service failed.
    Inner(E),
}

impl<E: fmt::Display> fmt::Display for CooldownError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoolingDown { wait } => {
                write!(f, "cooldown active; try again in {:?}", wait)
            }
            Self::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CooldownError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Inner(e) => Some(e),
            Self::CoolingDown { .. } => None,
        }
    }
}

impl<E> CooldownError<E> {
    /// Check if the request was rejected by a cooldown.
    pub fn is_cooling_down(&self) -> bool {
        matches!(self, Self::CoolingDown { .. })
    }
    /// Remaining cooldown, if this is a rejection.
    pub fn wait(&self) -> Option<Duration> {
        match self {
            Self::CoolingDown { wait } => Some(*wait),
            Self::Inner(_) => None,
        }
    }
    /// Get the inner error if this is an Inner variant
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::CoolingDown { .. } => None,
        }
    }
    /// Borrow the inner error if present.
    pub fn as_inner(&self) -> Option<&E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::CoolingDown { .. } => None,
        }
    }
}
