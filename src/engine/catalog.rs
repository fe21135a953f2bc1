//! Ordered pattern catalogs with adaptive reordering.
//!
//! A catalog is scanned front to back and the first pattern yielding a
//! non-empty family wins. Every win bumps that pattern's hit counter. A lookup
//! counts as a **miss** when it matched past `acceptable_index` or matched
//! nothing; once `miss_threshold` misses accumulate, the catalog is stably
//! re-sorted by descending hit count and the miss counter resets.
//!
//! ## Concurrency
//!
//! The pattern list sits behind a `parking_lot::RwLock`:
//!
//! - lookups hold the read lock for the whole scan, including the hit counter
//!   increment, so a scan always sees one consistent order;
//! - the re-sort is the only writer.
//!
//! Counters are atomics. Because increments happen under the read lock, no hit
//! count moves while the writer sorts.

use super::metrics::{CatalogStats, PatternSummary};
use super::pattern::{CompiledPattern, Templates};
use crate::{DEFAULT_ACCEPTABLE_INDEX, DEFAULT_MISS_THRESHOLD};
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};

/// When a catalog reorders itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReorderPolicy {
    pub miss_threshold: u64,
    pub acceptable_index: usize,
}

impl Default for ReorderPolicy {
    fn default() -> Self {
        ReorderPolicy { miss_threshold: DEFAULT_MISS_THRESHOLD, acceptable_index: DEFAULT_ACCEPTABLE_INDEX }
    }
}

/// Outcome of a single catalog lookup.
#[derive(Debug, Clone)]
pub(crate) struct Lookup<R> {
    pub record: R,
    /// Position of the winning pattern at lookup time.
    pub index: Option<usize>,
    pub miss: bool,
}

#[derive(Debug)]
pub(crate) struct Catalog<T> {
    patterns: RwLock<Vec<CompiledPattern<T>>>,
    misses: AtomicU64,
    reorders: AtomicU64,
    policy: ReorderPolicy,
}

impl<T: Templates> Catalog<T> {
    pub fn new(patterns: Vec<CompiledPattern<T>>, policy: ReorderPolicy) -> Self {
        Catalog { patterns: RwLock::new(patterns), misses: AtomicU64::new(0), reorders: AtomicU64::new(0), policy }
    }

    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Acquire)
    }

    /// Classify `line`, defaulting to family "Other" when nothing matches.
    pub fn lookup(&self, line: &str) -> Lookup<T::Record> {
        let hit = {
            let patterns = self.patterns.read();
            patterns.iter().enumerate().find_map(|(idx, pattern)| {
                let record = pattern.apply(line)?;
                pattern.record_match();
                Some((idx, record))
            })
        };

        let (record, index) = match hit {
            Some((idx, record)) => (record, Some(idx)),
            None => (T::Record::default(), None),
        };

        let miss = index.is_none_or(|idx| idx > self.policy.acceptable_index);
        if miss {
            self.misses.fetch_add(1, Ordering::AcqRel);
            tracing::trace!(category = %T::CATEGORY, index = ?index, "catalog miss");
        }

        Lookup { record, index, miss }
    }

    /// Re-sort the catalog if enough misses accumulated. Returns whether a
    /// reorder happened.
    pub fn reorder_if_due(&self) -> bool {
        if self.misses() < self.policy.miss_threshold {
            return false;
        }

        let mut patterns = self.patterns.write();

        // Another caller may have sorted while we waited for the lock.
        let threshold = self.policy.miss_threshold;
        let Ok(misses) =
            self.misses.fetch_update(Ordering::AcqRel, Ordering::Acquire, |m| (m >= threshold).then_some(0))
        else {
            return false;
        };

        patterns.sort_by_key(|p| Reverse(p.match_count()));
        self.reorders.fetch_add(1, Ordering::Relaxed);

        if let Some(head) = patterns.first() {
            tracing::debug!(
                category = %T::CATEGORY,
                misses,
                head = head.source(),
                head_matches = head.match_count(),
                "catalog reordered"
            );
        }
        true
    }

    /// Snapshot of counters and the first `top` patterns in current order.
    pub fn stats(&self, top: usize) -> CatalogStats {
        let patterns = self.patterns.read();
        CatalogStats {
            category: T::CATEGORY,
            patterns: patterns.len(),
            misses: self.misses(),
            reorders: self.reorders.load(Ordering::Relaxed),
            matches: patterns.iter().map(CompiledPattern::match_count).sum(),
            head: patterns
                .iter()
                .take(top)
                .map(|p| PatternSummary { regex: p.source().to_string(), matches: p.match_count() })
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn order(&self) -> Vec<String> {
        self.patterns.read().iter().map(|p| p.source().to_string()).collect()
    }
}
