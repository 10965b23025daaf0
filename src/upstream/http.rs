//! HTTP chain source backed by an ord server and an esplora API.

use crate::error::{Error, Result};
use crate::upstream::types::{ChildInscription, InscriptionMeta, TxRecord, TxStatus};
use crate::upstream::{InscriptionSource, TxSource};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout applied by the HTTP client itself.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound on children pages followed for one inscription.
const MAX_CHILDREN_PAGES: u32 = 100;

/// One page of `/r/children/{id}/inscriptions/{page}`.
#[derive(Debug, Deserialize)]
struct ChildrenPage {
    #[serde(default)]
    children: Vec<ChildInscription>,
    #[serde(default)]
    more: bool,
}

/// Subset of esplora's `/tx/{txid}` response.
#[derive(Debug, Deserialize)]
struct EsploraTx {
    #[serde(default)]
    status: TxStatus,
}

/// Reads inscriptions from ord's recursive endpoints and transactions from
/// an esplora-compatible API.
#[derive(Debug, Clone)]
pub struct HttpChainSource {
    client: Client,
    ord_url: String,
    esplora_url: String,
}

impl HttpChainSource {
    /// Create a source with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(ord_url: &str, esplora_url: &str) -> Result<Self> {
        Self::with_request_timeout(ord_url, esplora_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a source with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_request_timeout(
        ord_url: &str,
        esplora_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            ord_url: ord_url.trim_end_matches('/').to_string(),
            esplora_url: esplora_url.trim_end_matches('/').to_string(),
        })
    }

    fn ord(&self, path: &str) -> String {
        format!("{}{path}", self.ord_url)
    }

    fn esplora(&self, path: &str) -> String {
        format!("{}{path}", self.esplora_url)
    }

    /// GET `url` as text; 404 is `Ok(None)`.
    async fn get_text(&self, url: &str) -> Result<Option<String>> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text().await?)),
            status => Err(Error::Network(format!("GET {url} returned {status}"))),
        }
    }

    /// GET `url` as JSON; 404 is `Ok(None)`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        debug!("GET {} (json)", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| Error::Network(format!("malformed payload from {url}: {e}"))),
            status => Err(Error::Network(format!("GET {url} returned {status}"))),
        }
    }
}

#[async_trait]
impl TxSource for HttpChainSource {
    async fn fetch_tx(&self, txid: &str) -> Result<Option<TxRecord>> {
        let Some(tx) = self
            .get_json::<EsploraTx>(&self.esplora(&format!("/tx/{txid}")))
            .await?
        else {
            return Ok(None);
        };
        let hex = self
            .get_text(&self.esplora(&format!("/tx/{txid}/hex")))
            .await?
            .map(|hex| hex.trim().to_string());

        Ok(Some(TxRecord {
            hex,
            block_height: tx.status.block_height,
            status: Some(tx.status),
        }))
    }

    async fn tip_height(&self) -> Result<u64> {
        let url = self.esplora("/blocks/tip/height");
        let body = self
            .get_text(&url)
            .await?
            .ok_or_else(|| Error::Network(format!("GET {url} returned 404")))?;
        body.trim()
            .parse()
            .map_err(|e| Error::Network(format!("malformed tip height from {url}: {e}")))
    }
}

#[async_trait]
impl InscriptionSource for HttpChainSource {
    async fn fetch_meta(&self, inscription_id: &str) -> Result<Option<InscriptionMeta>> {
        self.get_json(&self.ord(&format!("/r/inscription/{inscription_id}")))
            .await
    }

    async fn fetch_children(&self, inscription_id: &str) -> Result<Vec<ChildInscription>> {
        let mut children = Vec::new();
        for page in 0..MAX_CHILDREN_PAGES {
            let url = self.ord(&format!("/r/children/{inscription_id}/inscriptions/{page}"));
            let Some(batch) = self.get_json::<ChildrenPage>(&url).await? else {
                break;
            };
            children.extend(batch.children);
            if !batch.more {
                break;
            }
        }
        Ok(children)
    }

    async fn fetch_content(&self, inscription_id: &str) -> Result<Option<serde_json::Value>> {
        let body = self
            .get_text(&self.ord(&format!("/content/{inscription_id}")))
            .await?;
        // Non-JSON bodies are simply not registrations
        Ok(body.and_then(|text| serde_json::from_str(&text).ok()))
    }
}
