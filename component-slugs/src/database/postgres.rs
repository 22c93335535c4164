//! PostgreSQL uniqueness oracle

use crate::database::traits::{OracleError, SlugTable, UniquenessOracle};
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL uniqueness oracle
pub struct PostgresOracle {
    pool: PgPool,
    table: SlugTable,
    exists_query: String,
}

impl PostgresOracle {
    /// Create a new PostgreSQL oracle
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    /// * `table` - Where slugs and their namespaces live
    pub fn new(pool: PgPool, table: SlugTable) -> Self {
        let namespace_marker = format!("$1::{}", table.namespace_type);
        let exists_query = table.exists_query((&namespace_marker, "$2"));
        Self {
            pool,
            table,
            exists_query,
        }
    }

    /// The table this oracle looks into
    pub fn table(&self) -> &SlugTable {
        &self.table
    }
}

#[async_trait]
impl UniquenessOracle for PostgresOracle {
    async fn exists(&self, namespace: &str, candidate: &str) -> Result<bool, OracleError> {
        tracing::debug!(
            table = %self.table.table,
            namespace,
            candidate,
            "checking slug in postgres"
        );

        // SELECT 1 yields INT4 in PostgreSQL
        let found: Option<i32> = sqlx::query_scalar(&self.exists_query)
            .bind(namespace)
            .bind(candidate)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}
