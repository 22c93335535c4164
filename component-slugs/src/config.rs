//! Resolver and checker settings

use crate::slug::normalize;
use serde::Deserialize;
use std::time::Duration;

/// Base used when a display name normalizes to nothing and the configured
/// fallback does too
pub const DEFAULT_FALLBACK_BASE: &str = "component";

/// Settings shared by [`SlugResolver`](crate::SlugResolver) and
/// [`AvailabilityChecker`](crate::AvailabilityChecker)
///
/// Deserializes from camelCase keys; missing keys take their defaults:
///
/// ```json
/// {
///   "maxAttempts": 50,
///   "oracleTimeoutMilliseconds": 5000,
///   "debounceMilliseconds": 300,
///   "fallbackBase": "component"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlugConfig {
    /// Maximum number of oracle queries per resolution
    pub max_attempts: u32,

    /// Time allowed for a single oracle query
    pub oracle_timeout_milliseconds: u64,

    /// How long typed input must stay unchanged before it is checked
    pub debounce_milliseconds: u64,

    /// Base for names that normalize to an empty slug
    pub fallback_base: String,
}

impl Default for SlugConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            oracle_timeout_milliseconds: 5_000,
            debounce_milliseconds: 300,
            fallback_base: DEFAULT_FALLBACK_BASE.to_string(),
        }
    }
}

impl SlugConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout_milliseconds = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_milliseconds = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_fallback_base(mut self, fallback_base: impl Into<String>) -> Self {
        self.fallback_base = fallback_base.into();
        self
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_milliseconds)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_milliseconds)
    }

    /// The fallback base in slug form
    ///
    /// A fallback that normalizes to nothing is replaced by
    /// [`DEFAULT_FALLBACK_BASE`].
    pub fn fallback_base(&self) -> String {
        let normalized = normalize(&self.fallback_base);
        if normalized.is_empty() {
            DEFAULT_FALLBACK_BASE.to_string()
        } else {
            normalized
        }
    }
}
