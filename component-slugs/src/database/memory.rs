//! In-memory uniqueness oracle
//!
//! Keeps taken slugs in a process-local set and records every lookup. Useful
//! for tests and for wiring the resolver up before a database exists.

use crate::database::traits::{OracleError, UniquenessOracle};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    taken: HashSet<(String, String)>,
    queries: Vec<(String, String)>,
}

/// In-memory oracle
///
/// Clones share the same underlying set.
#[derive(Debug, Clone, Default)]
pub struct MemoryOracle {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryOracle {
    /// Create an empty oracle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an oracle with `slugs` already taken in `namespace`
    pub fn with_taken<I, S>(namespace: &str, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let oracle = Self::new();
        for slug in slugs {
            oracle.insert(namespace, slug);
        }
        oracle
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a slug as taken; returns `false` if it already was
    pub fn insert(&self, namespace: &str, slug: impl Into<String>) -> bool {
        self.lock().taken.insert((namespace.to_string(), slug.into()))
    }

    /// Release a slug; returns `false` if it was not taken
    pub fn remove(&self, namespace: &str, slug: &str) -> bool {
        self.lock()
            .taken
            .remove(&(namespace.to_string(), slug.to_string()))
    }

    /// Candidates looked up so far, in query order
    pub fn queried_candidates(&self) -> Vec<String> {
        self.lock()
            .queries
            .iter()
            .map(|(_, candidate)| candidate.clone())
            .collect()
    }

    /// Number of lookups performed
    pub fn query_count(&self) -> usize {
        self.lock().queries.len()
    }

    /// Forget recorded lookups; taken slugs stay
    ///
    /// Every lookup is recorded until this is called, so long-lived instances
    /// should call it periodically.
    pub fn clear_queries(&self) {
        self.lock().queries.clear();
    }
}

#[async_trait]
impl UniquenessOracle for MemoryOracle {
    async fn exists(&self, namespace: &str, candidate: &str) -> Result<bool, OracleError> {
        let mut inner = self.lock();
        inner
            .queries
            .push((namespace.to_string(), candidate.to_string()));
        let key = (namespace.to_string(), candidate.to_string());
        Ok(inner.taken.contains(&key))
    }
}
