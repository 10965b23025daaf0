//! Upstream data sources consumed by the registry.
//!
//! The registry never talks to a node directly. It reads chain data through
//! [`TxSource`] (esplora-style transaction records) and ordinals data through
//! [`InscriptionSource`] (ord-style inscription metadata, children, content).
//!
//! Return conventions:
//!
//! * `Ok(Some(_))` / `Ok(vec)` - the upstream answered
//! * `Ok(None)` - the upstream answered "not found"
//! * `Err(_)` - the upstream could not be reached or answered garbage

mod http;
mod types;

pub use http::HttpChainSource;
pub use types::{ChildInscription, InscriptionMeta, TxRecord, TxStatus};
pub(crate) use types::lenient_u64;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Source of confirmed transaction data.
#[async_trait]
pub trait TxSource: Send + Sync {
    /// Fetch a transaction record by txid.
    async fn fetch_tx(&self, txid: &str) -> Result<Option<TxRecord>>;

    /// Height of the current chain tip.
    async fn tip_height(&self) -> Result<u64>;
}

/// Source of inscription metadata and content.
#[async_trait]
pub trait InscriptionSource: Send + Sync {
    /// Fetch inscription metadata (satpoint / location).
    async fn fetch_meta(&self, inscription_id: &str) -> Result<Option<InscriptionMeta>>;

    /// Fetch every child of an inscription, in upstream order.
    async fn fetch_children(&self, inscription_id: &str) -> Result<Vec<ChildInscription>>;

    /// Fetch a child's body, if it is JSON.
    async fn fetch_content(&self, inscription_id: &str) -> Result<Option<serde_json::Value>>;
}

/// Await `fut`, bounded by `limit` when one is given.
///
/// On expiry the pending future is dropped and its eventual result
/// discarded.
///
/// # Errors
///
/// Returns [`Error::Timeout`] when the bound elapses, otherwise whatever
/// `fut` resolves to.
pub async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(limit))?,
    }
}
