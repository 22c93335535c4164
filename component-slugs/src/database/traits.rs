//! Uniqueness oracle trait
//!
//! This trait defines the single read query the slug resolver needs from a
//! backing store.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Uniqueness oracle for namespace-scoped slugs
///
/// Implementations answer whether a slug is already used inside a namespace.
/// They must only read; reserving a slug is the job of the store's own
/// insert, guarded by a uniqueness constraint.
#[async_trait]
pub trait UniquenessOracle: Send + Sync + 'static {
    /// Check whether `candidate` is already taken
    ///
    /// # Arguments
    ///
    /// * `namespace` - Scope of uniqueness (e.g. the owning user's id)
    /// * `candidate` - Slug to look up
    ///
    /// # Returns
    ///
    /// `true` if any record in `namespace` already uses `candidate`
    async fn exists(&self, namespace: &str, candidate: &str) -> Result<bool, OracleError>;
}

#[async_trait]
impl<O: UniquenessOracle> UniquenessOracle for Arc<O> {
    async fn exists(&self, namespace: &str, candidate: &str) -> Result<bool, OracleError> {
        (**self).exists(namespace, candidate).await
    }
}

/// Oracle error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The lookup query failed
    #[error("Oracle query failed: {0}")]
    Query(String),

    /// The store could not be reached
    #[error("Oracle connection failed: {0}")]
    Connection(String),

    /// The lookup did not answer in time
    #[error("Oracle query timeout exceeded")]
    Timeout,
}

impl From<sqlx::Error> for OracleError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => OracleError::Timeout,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                OracleError::Connection(error.to_string())
            }
            other => OracleError::Query(other.to_string()),
        }
    }
}

/// Location of slugs in a relational schema
///
/// Names the table holding slugged records, the column scoping uniqueness and
/// the column holding the slug itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugTable {
    /// Table name
    pub table: String,

    /// Column whose value is the namespace
    pub namespace_column: String,

    /// Column holding the slug
    pub slug_column: String,

    /// SQL type of the namespace column, used to cast the bound namespace
    /// where the driver needs it (PostgreSQL)
    pub namespace_type: String,
}

impl SlugTable {
    pub fn new(
        table: impl Into<String>,
        namespace_column: impl Into<String>,
        slug_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            namespace_column: namespace_column.into(),
            slug_column: slug_column.into(),
            namespace_type: "bigint".to_string(),
        }
    }

    /// Set the SQL type of the namespace column (e.g. "uuid", "text")
    pub fn with_namespace_type(mut self, namespace_type: impl Into<String>) -> Self {
        self.namespace_type = namespace_type.into();
        self
    }

    /// Component slugs, unique per owning user
    pub fn components() -> Self {
        Self::new("components", "user_id", "component_slug")
    }

    /// Demo slugs, unique per component
    pub fn demos() -> Self {
        Self::new("demos", "component_id", "demo_slug")
    }

    /// Build the lookup statement for this table
    ///
    /// Both columns are compared as stored so the `(namespace, slug)` unique
    /// index serves the lookup. `placeholders` are the driver's bind markers
    /// for the namespace and the slug, in that order; any cast of the bound
    /// namespace belongs in its marker.
    pub(crate) fn exists_query(&self, placeholders: (&str, &str)) -> String {
        format!(
            "SELECT 1 FROM {} WHERE {} = {} AND {} = {} LIMIT 1",
            quote_identifier(&self.table),
            quote_identifier(&self.namespace_column),
            placeholders.0,
            quote_identifier(&self.slug_column),
            placeholders.1,
        )
    }
}

/// Quote an identifier (table or column name) to prevent SQL injection
///
/// Both SQLite and PostgreSQL use double quotes for identifiers; embedded
/// double quotes are escaped by doubling them.
pub(crate) fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
