//! Catalog statistics.
//!
//! Snapshots returned by [`Engine::stats`](crate::Engine::stats) to observe how
//! a long-running engine has adapted: how many lookups resolved, how often each
//! catalog re-sorted itself and which patterns currently lead.
//!
//! A snapshot is taken under each catalog's read lock, so counters within one
//! `CatalogStats` are consistent with the `head` order it reports. Snapshots of
//! different catalogs are independent.

use crate::Category;
use serde::Serialize;

/// Counters and current head order of one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub category: Category,
    /// Number of patterns in the catalog.
    pub patterns: usize,
    /// Misses accumulated since the last reorder.
    pub misses: u64,
    /// Reorders performed since construction.
    pub reorders: u64,
    /// Lookups resolved by some pattern (sum of all hit counters).
    pub matches: u64,
    /// Leading patterns in current scan order.
    pub head: Vec<PatternSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternSummary {
    pub regex: String,
    pub matches: u64,
}
