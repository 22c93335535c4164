//! Slug resolution against a uniqueness oracle
//!
//! Resolution tries `base`, `base-1`, `base-2`, ... in order and returns the
//! first candidate the oracle reports as free. The search is bounded by
//! [`SlugConfig::max_attempts`] and every oracle query by
//! [`SlugConfig::oracle_timeout`].

use crate::config::SlugConfig;
use crate::database::traits::{OracleError, UniquenessOracle};
use crate::schema::ResolvedSlug;
use crate::slug::{is_valid, Attempt, Candidate};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Ask the oracle about one candidate, bounded by `timeout`
pub(crate) async fn query_oracle<O: UniquenessOracle>(
    oracle: &O,
    timeout: Duration,
    namespace: &str,
    candidate: &str,
) -> std::result::Result<bool, OracleError> {
    tokio::time::timeout(timeout, oracle.exists(namespace, candidate))
        .await
        .map_err(|_| OracleError::Timeout)?
}

/// Resolves display names into slugs that are free within a namespace
pub struct SlugResolver<O: UniquenessOracle> {
    oracle: Arc<O>,
    config: SlugConfig,
}

impl<O: UniquenessOracle> SlugResolver<O> {
    /// Create a resolver with default settings
    pub fn new(oracle: O) -> Self {
        Self::with_config(oracle, SlugConfig::default())
    }

    /// Create a resolver with the given settings
    pub fn with_config(oracle: O, config: SlugConfig) -> Self {
        Self {
            oracle: Arc::new(oracle),
            config,
        }
    }

    pub fn oracle(&self) -> &Arc<O> {
        &self.oracle
    }

    pub fn config(&self) -> &SlugConfig {
        &self.config
    }

    /// Resolve a display name into a slug not yet used in `namespace`
    ///
    /// Names without any ASCII alphanumerics resolve from the configured
    /// fallback base instead.
    ///
    /// The result is only a hint: a concurrent writer may take the same slug
    /// before it is inserted, so the insert must still be guarded by the
    /// store's uniqueness constraint.
    ///
    /// # Errors
    ///
    /// * [`Error::OracleUnavailable`] - a query failed or timed out
    /// * [`Error::ResolutionExhausted`] - every allowed attempt was taken
    pub async fn resolve(&self, namespace: &str, name: &str) -> Result<ResolvedSlug> {
        let candidate = Candidate::new(name);
        let base = if candidate.is_empty() {
            self.config.fallback_base()
        } else {
            candidate.normalized().to_string()
        };

        let timeout = self.config.oracle_timeout();
        let mut attempt = Attempt::first(&base);

        for attempts in 1..=self.config.max_attempts {
            let slug = attempt.to_string();
            if !query_oracle(self.oracle.as_ref(), timeout, namespace, &slug).await? {
                return Ok(ResolvedSlug {
                    slug,
                    base: base.clone(),
                    attempts,
                });
            }
            attempt = attempt.next();
        }

        tracing::debug!(
            namespace,
            base = %base,
            attempts = self.config.max_attempts,
            "slug resolution exhausted"
        );

        Err(Error::ResolutionExhausted {
            base,
            attempts: self.config.max_attempts,
        })
    }

    /// Check whether a user-supplied slug is free in `namespace`
    ///
    /// Malformed slugs are rejected without querying the oracle; valid ones
    /// cost exactly one query.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidFormat`] - `candidate` is not a well-formed slug
    /// * [`Error::OracleUnavailable`] - the query failed or timed out
    pub async fn check(&self, namespace: &str, candidate: &str) -> Result<bool> {
        if !is_valid(candidate) {
            return Err(Error::InvalidFormat(candidate.to_string()));
        }

        let taken = query_oracle(
            self.oracle.as_ref(),
            self.config.oracle_timeout(),
            namespace,
            candidate,
        )
        .await?;

        Ok(!taken)
    }
}
