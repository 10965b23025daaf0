//! Order-preserving txid deduplication.

use std::collections::HashSet;

/// Remove duplicate txids, keeping the first occurrence of each.
///
/// Always returns a freshly allocated vector.
#[must_use]
pub fn dedupe<S: AsRef<str>>(txids: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(txids.len());
    txids
        .iter()
        .map(AsRef::as_ref)
        .filter(|txid| seen.insert(*txid))
        .map(str::to_owned)
        .collect()
}
