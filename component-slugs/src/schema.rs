//! Types exchanged with callers and over HTTP
//!
//! All types serialize with camelCase field names.

use serde::{Deserialize, Serialize};

/// A slug that was free at the moment it was checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSlug {
    /// The resolved slug (`base` or `base-N`)
    pub slug: String,

    /// Normalized base the slug was derived from
    pub base: String,

    /// Number of oracle queries it took
    pub attempts: u32,
}

/// Observable state of an [`AvailabilityChecker`](crate::AvailabilityChecker)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityState {
    /// Candidate of the most recently started check
    pub candidate: Option<String>,

    /// Whether the oracle query for `candidate` is outstanding
    pub checking: bool,

    /// `None` while unknown, otherwise whether `candidate` is free
    pub available: Option<bool>,

    /// Why the last check produced no positive verdict
    pub error: Option<String>,
}

/// Query parameters for resolving a display name
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuery {
    /// Display name to derive the slug from
    #[serde(default)]
    pub name: String,
}

/// Response for slug availability checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    /// The slug that was checked
    pub slug: String,

    /// Whether the slug is free in the namespace
    pub available: bool,

    /// Error message if the slug was rejected without a lookup
    pub error: Option<String>,
}
