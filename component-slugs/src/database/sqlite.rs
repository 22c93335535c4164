//! SQLite uniqueness oracle

use crate::database::traits::{OracleError, SlugTable, UniquenessOracle};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// SQLite uniqueness oracle
pub struct SqliteOracle {
    pool: SqlitePool,
    table: SlugTable,
    exists_query: String,
}

impl SqliteOracle {
    /// Create a new SQLite oracle
    ///
    /// # Arguments
    ///
    /// * `pool` - SQLite connection pool
    /// * `table` - Where slugs and their namespaces live
    pub fn new(pool: SqlitePool, table: SlugTable) -> Self {
        let exists_query = table.exists_query(("?", "?"));
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
impl UniquenessOracle for SqliteOracle {
    async fn exists(&self, namespace: &str, candidate: &str) -> Result<bool, OracleError> {
        tracing::debug!(
            table = %self.table.table,
            namespace,
            candidate,
            "checking slug in sqlite"
        );

        let found: Option<i64> = sqlx::query_scalar(&self.exists_query)
            .bind(namespace)
            .bind(candidate)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::Row;

    async fn memory_pool() -> SqlitePool {
        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE components (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                component_slug TEXT NOT NULL,
                UNIQUE (user_id, component_slug)
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO components (user_id, name, component_slug) VALUES (1, 'My Button', 'my-button'), (2, 'Card', 'card')",
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_exists_within_namespace() {
        let oracle = SqliteOracle::new(memory_pool().await, SlugTable::components());

        assert!(oracle.exists("1", "my-button").await.unwrap());
        assert!(!oracle.exists("1", "card").await.unwrap());
        assert!(oracle.exists("2", "card").await.unwrap());
        assert!(!oracle.exists("2", "my-button").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_table_is_query_error() {
        let oracle = SqliteOracle::new(memory_pool().await, SlugTable::demos());

        let error = oracle.exists("1", "default").await.unwrap_err();
        assert!(matches!(error, OracleError::Query(_)));
    }

    #[tokio::test]
    async fn test_candidate_is_bound_not_interpolated() {
        let oracle = SqliteOracle::new(memory_pool().await, SlugTable::components());

        assert!(!oracle.exists("1", "x' OR '1'='1").await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_uses_unique_index() {
        let pool = memory_pool().await;
        let oracle = SqliteOracle::new(pool.clone(), SlugTable::components());

        let plan = sqlx::query(&format!("EXPLAIN QUERY PLAN {}", oracle.exists_query))
            .bind("1")
            .bind("my-button")
            .fetch_all(&pool)
            .await
            .unwrap();
        let details: Vec<String> = plan
            .iter()
            .map(|row| row.try_get::<String, _>("detail").unwrap())
            .collect();

        assert!(
            details
                .iter()
                .any(|detail| detail.starts_with("SEARCH") && detail.contains("INDEX")),
            "plan: {:?}",
            details
        );
    }
}
