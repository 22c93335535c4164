//! # component-slugs
//!
//! Slug generation and namespace-scoped uniqueness resolution for a component
//! marketplace, easily integrable as an Axum layer.
//!
//! ## Features
//!
//! - Normalization of display names into URL-safe slugs
//! - Slug grammar validation
//! - Collision resolution by linear suffix search (`my-button`, `my-button-1`, ...)
//!   against a uniqueness oracle, bounded in attempts and time
//! - Live availability checks with last-request-wins ordering
//! - Oracles for SQLite and PostgreSQL, plus an in-memory one
//!
//! ## Uniqueness
//!
//! Resolution only reads. Two concurrent resolutions for the same name may both
//! see a slug as free, so the resolved slug is a hint, not a reservation: the
//! table must carry a uniqueness constraint on `(namespace, slug)` and the
//! insert is what finally decides.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use component_slugs::{SlugResolverLayer, SlugTable};
//! use sqlx::SqlitePool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = SqlitePool::connect("sqlite::memory:")
//!         .await
//!         .unwrap();
//!
//!     let app = Router::new()
//!         .route("/", get(|| async { "Hello, World!" }))
//!         .merge(SlugResolverLayer::sqlite("/slugs", pool, SlugTable::components()).into_router());
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod checker;
pub mod config;
pub mod database;
pub mod layer;
pub mod resolver;
pub mod schema;
pub mod slug;

// Public exports
pub use checker::AvailabilityChecker;
pub use config::SlugConfig;
pub use layer::SlugResolverLayer;
pub use resolver::SlugResolver;
pub use schema::{AvailabilityResponse, AvailabilityState, ResolvedSlug};
pub use slug::{is_valid, normalize, Attempt, Candidate};

// Re-export oracle providers
pub use database::memory::MemoryOracle;
pub use database::traits::{OracleError, SlugTable, UniquenessOracle};

#[cfg(feature = "sqlite")]
pub use database::sqlite::SqliteOracle;

#[cfg(feature = "postgres")]
pub use database::postgres::PostgresOracle;

// Error type
use thiserror::Error;

/// Message reported for candidates that fail the slug grammar
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid slug format";

#[derive(Debug, Error)]
pub enum Error {
    /// The candidate does not match the slug grammar; no oracle query was made
    #[error("Invalid slug format: {0:?}")]
    InvalidFormat(String),

    /// The uniqueness query could not complete; retrying is up to the caller
    #[error("Uniqueness oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),

    /// Suffix search hit the attempt bound without finding a free slug
    #[error("No free slug for base {base:?} after {attempts} attempts")]
    ResolutionExhausted { base: String, attempts: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
