//! Retry configuration loaded from environment variables.

const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Bounds the re-read-and-retry loop used after losing a race.
///
/// Reads from environment variables:
/// - `TRANSITION_MAX_ATTEMPTS` — total attempts per transition, at least 1
///   (default: `3`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` attempts (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Loads the policy from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_attempts = lookup("TRANSITION_MAX_ATTEMPTS")
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        Self::new(max_attempts)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
