//! Provenance height derivations.
//!
//! Two heights decide whether an inscription's newest child can be trusted
//! as current:
//!
//! - `H_parent`: block height of the inscription's last transfer, read from
//!   the transaction named by its satpoint.
//! - `H_child`: the greatest genesis height among its children.
//!
//! Both derivations fail closed. Each is cached per inscription id for a
//! fixed TTL, failures included, so a flapping upstream is asked at most
//! once per window.

use crate::cache::{CacheStats, Clock, TtlCache, DEFAULT_CACHE_CAPACITY, DEFAULT_TTL};
use crate::upstream::{with_timeout, ChildInscription, InscriptionSource, TxSource};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a height derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// The height was derived.
    Height(u64),
    /// The upstream answered, but no height can be derived from the answer.
    Absent(String),
    /// The upstream could not be consulted.
    Unavailable(String),
}

impl Derivation {
    /// The derived height, if any.
    #[must_use]
    pub const fn height(&self) -> Option<u64> {
        match self {
            Self::Height(h) => Some(*h),
            Self::Absent(_) | Self::Unavailable(_) => None,
        }
    }

    /// Returns true if the derivation failed because of the upstream.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Height(h) => write!(f, "height {h}"),
            Self::Absent(reason) => write!(f, "absent: {reason}"),
            Self::Unavailable(reason) => write!(f, "unavailable: {reason}"),
        }
    }
}

/// Resolves and caches `H_parent` and `H_child`.
pub struct ProvenanceHeightResolver {
    transfers: TtlCache<Derivation>,
    children: TtlCache<Derivation>,
    fetch_timeout: Option<Duration>,
}

impl ProvenanceHeightResolver {
    /// Create a resolver with the default 30 second TTL.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL, clock)
    }

    /// Create a resolver with explicit cache settings.
    #[must_use]
    pub fn with_settings(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            transfers: TtlCache::with_capacity(capacity, ttl, Arc::clone(&clock)),
            children: TtlCache::with_capacity(capacity, ttl, clock),
            fetch_timeout: None,
        }
    }

    /// Bound every upstream fetch made by this resolver.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Height of the block containing the inscription's last transfer.
    pub async fn last_transfer_height(
        &self,
        inscription_id: &str,
        inscriptions: &dyn InscriptionSource,
        txs: &dyn TxSource,
    ) -> Derivation {
        if let Some(cached) = self.transfers.get(inscription_id) {
            debug!("H_parent for {} served from cache: {}", inscription_id, cached);
            return cached;
        }

        let derived = self.derive_transfer_height(inscription_id, inscriptions, txs).await;
        debug!("H_parent for {}: {}", inscription_id, derived);
        self.transfers.insert(inscription_id, derived.clone());
        derived
    }

    /// Greatest genesis height among the inscription's children.
    pub async fn latest_child_height(
        &self,
        parent_id: &str,
        inscriptions: &dyn InscriptionSource,
    ) -> Derivation {
        if let Some(cached) = self.children.get(parent_id) {
            debug!("H_child for {} served from cache: {}", parent_id, cached);
            return cached;
        }

        let derived = match with_timeout(self.fetch_timeout, inscriptions.fetch_children(parent_id)).await {
            Ok(children) => max_child_height(&children),
            Err(e) => {
                warn!("Fetching children of {} failed: {}", parent_id, e);
                Derivation::Unavailable(e.to_string())
            }
        };
        debug!("H_child for {}: {}", parent_id, derived);
        self.children.insert(parent_id, derived.clone());
        derived
    }

    /// Statistics for the `(H_parent, H_child)` caches.
    #[must_use]
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.transfers.stats(), self.children.stats())
    }

    async fn derive_transfer_height(
        &self,
        inscription_id: &str,
        inscriptions: &dyn InscriptionSource,
        txs: &dyn TxSource,
    ) -> Derivation {
        let meta = match with_timeout(self.fetch_timeout, inscriptions.fetch_meta(inscription_id)).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return Derivation::Absent("no inscription metadata".to_string()),
            Err(e) => {
                warn!("Fetching metadata of {} failed: {}", inscription_id, e);
                return Derivation::Unavailable(e.to_string());
            }
        };

        let Some(satpoint) = meta.satpoint() else {
            return Derivation::Absent("metadata has no valid satpoint".to_string());
        };

        let record = match with_timeout(self.fetch_timeout, txs.fetch_tx(&satpoint.txid)).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Derivation::Absent(format!("transfer tx {} not found", satpoint.txid))
            }
            Err(e) => {
                warn!("Fetching transfer tx {} failed: {}", satpoint.txid, e);
                return Derivation::Unavailable(e.to_string());
            }
        };

        record.confirmed_height().map_or_else(
            || Derivation::Absent(format!("transfer tx {} unconfirmed", satpoint.txid)),
            Derivation::Height,
        )
    }
}

fn max_child_height(children: &[ChildInscription]) -> Derivation {
    children
        .iter()
        .filter_map(ChildInscription::height)
        .max()
        .map_or_else(
            || {
                Derivation::Absent(format!(
                    "none of {} children has a genesis height",
                    children.len()
                ))
            },
            Derivation::Height,
        )
}
