//! Uniqueness oracles
//!
//! This module provides the store-agnostic oracle interface used by the
//! resolver, along with SQL-backed and in-memory implementations.

pub mod memory;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-export the main trait
pub use traits::UniquenessOracle;
