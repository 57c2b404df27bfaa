use std::collections::HashSet;

use crate::feed::Entry;
use crate::storage::Ledger;

/// Concatenates the entries of several sources into one pool.
///
/// Sources keep the order they were configured in, and each source keeps its
/// document order. That pool order is what breaks timestamp ties later.
pub fn merge_sources<I>(sources: I) -> Vec<Entry>
where
    I: IntoIterator<Item = Vec<Entry>>,
{
    sources.into_iter().flatten().collect()
}

/// Selects and orders the entries that still need submitting.
///
/// - entries whose id is in `ledger` are dropped
/// - repeated ids within `pool` keep only their first occurrence
/// - the rest are sorted oldest first by `published_at`
///
/// The sort is stable, so entries with equal timestamps keep pool order.
/// Undated entries compare lower than any dated one: they go first, in pool
/// order.
pub fn build_batch(pool: Vec<Entry>, ledger: &Ledger) -> Vec<Entry> {
    let mut seen: HashSet<String> = HashSet::with_capacity(pool.len());

    let mut batch: Vec<Entry> = pool
        .into_iter()
        .filter(|entry| !ledger.contains(&entry.id))
        .filter(|entry| seen.insert(entry.id.clone()))
        .collect();

    batch.sort_by_key(|entry| entry.published_at);
    batch
}
