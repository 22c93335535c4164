//! SlugResolverLayer - Axum integration layer
//!
//! This module provides the entry point for mounting the slug endpoints into
//! an Axum application.

use crate::api::create_api_router;
use crate::config::SlugConfig;
use crate::database::traits::UniquenessOracle;
use crate::resolver::SlugResolver;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
use crate::database::traits::SlugTable;

#[cfg(feature = "sqlite")]
use crate::database::sqlite::SqliteOracle;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresOracle;

/// Layer for mounting slug resolution into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use component_slugs::{SlugConfig, SlugResolverLayer, SlugTable};
/// use sqlx::SqlitePool;
///
/// # async fn example() {
/// let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
/// let slugs = SlugResolverLayer::sqlite("/slugs", pool, SlugTable::components())
///     .with_config(SlugConfig::default().with_max_attempts(20));
/// let app = Router::new().merge(slugs.into_router());
/// # }
/// ```
pub struct SlugResolverLayer<O: UniquenessOracle> {
    base_path: String,
    oracle: O,
    config: SlugConfig,
}

impl<O: UniquenessOracle> SlugResolverLayer<O> {
    /// Create a new slug layer at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the endpoints will be mounted (e.g., "/slugs")
    /// * `oracle` - The uniqueness oracle implementation
    pub fn new(base_path: impl Into<String>, oracle: O) -> Self {
        Self {
            base_path: base_path.into(),
            oracle,
            config: SlugConfig::default(),
        }
    }

    /// Replace the default resolver settings
    pub fn with_config(mut self, config: SlugConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the resolver without mounting any routes
    ///
    /// Useful when the caller also needs the resolver outside of HTTP, e.g.
    /// to resolve slugs inside its own insert handlers.
    pub fn into_resolver(self) -> SlugResolver<O> {
        SlugResolver::with_config(self.oracle, self.config)
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router includes:
    /// - `GET {base_path}/api/namespaces/{namespace}/resolve?name=...`
    /// - `GET {base_path}/api/namespaces/{namespace}/slugs/{slug}`
    /// - Permissive CORS middleware
    pub fn into_router(self) -> Router {
        let base_path = self.base_path.clone();
        let resolver = Arc::new(self.into_resolver());

        Router::new()
            .nest(&format!("{}/api", base_path), create_api_router(resolver))
            .layer(CorsLayer::permissive())
    }
}

#[cfg(feature = "sqlite")]
impl SlugResolverLayer<SqliteOracle> {
    /// Create a new slug layer backed by SQLite
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the endpoints will be mounted
    /// * `pool` - The SQLite connection pool
    /// * `table` - Where slugs and their namespaces live
    pub fn sqlite(base_path: impl Into<String>, pool: sqlx::SqlitePool, table: SlugTable) -> Self {
        Self::new(base_path, SqliteOracle::new(pool, table))
    }
}

#[cfg(feature = "postgres")]
impl SlugResolverLayer<PostgresOracle> {
    /// Create a new slug layer backed by PostgreSQL
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the endpoints will be mounted
    /// * `pool` - The PostgreSQL connection pool
    /// * `table` - Where slugs and their namespaces live
    pub fn postgres(base_path: impl Into<String>, pool: sqlx::PgPool, table: SlugTable) -> Self {
        Self::new(base_path, PostgresOracle::new(pool, table))
    }
}
