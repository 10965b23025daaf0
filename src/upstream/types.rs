//! Upstream record types, validated at the boundary.
//!
//! Every field is optional: upstreams disagree on shape, and a record with
//! missing or malformed fields must degrade to "cannot derive" rather than
//! fail deserialization of the whole response.

use crate::inscription::Satpoint;
use serde::{Deserialize, Deserializer, Serialize};

/// Confirmation status of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatus {
    /// Whether the transaction is in a block.
    #[serde(default)]
    pub confirmed: bool,
    /// Height of the containing block.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub block_height: Option<u64>,
}

/// A transaction as reported by the chain source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Raw consensus-encoded transaction, hex.
    #[serde(default)]
    pub hex: Option<String>,
    /// Height of the containing block.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub block_height: Option<u64>,
    /// Confirmation status.
    #[serde(default)]
    pub status: Option<TxStatus>,
}

impl TxRecord {
    /// Confirmed record at `height` carrying `hex`.
    #[must_use]
    pub fn confirmed(hex: impl Into<String>, height: u64) -> Self {
        Self {
            hex: Some(hex.into()),
            block_height: Some(height),
            status: Some(TxStatus {
                confirmed: true,
                block_height: Some(height),
            }),
        }
    }

    /// Unconfirmed (mempool) record carrying `hex`.
    #[must_use]
    pub fn unconfirmed(hex: impl Into<String>) -> Self {
        Self {
            hex: Some(hex.into()),
            block_height: None,
            status: Some(TxStatus::default()),
        }
    }

    /// Block height, only if the transaction is confirmed at a positive height.
    ///
    /// A record without a `status` counts as confirmed when it reports a
    /// block height.
    #[must_use]
    pub fn confirmed_height(&self) -> Option<u64> {
        let status_height = self.status.as_ref().and_then(|s| s.block_height);
        let confirmed = self
            .status
            .as_ref()
            .map_or(self.block_height.is_some(), |s| s.confirmed);
        if !confirmed {
            return None;
        }
        self.block_height.or(status_height).filter(|h| *h > 0)
    }
}

/// Inscription metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InscriptionMeta {
    /// Current satpoint, `<txid>:<vout>:<offset>`.
    #[serde(default)]
    pub satpoint: Option<String>,
    /// Alternate name some indexers use for the satpoint.
    #[serde(default)]
    pub location: Option<String>,
}

impl InscriptionMeta {
    /// Metadata with only a satpoint.
    #[must_use]
    pub fn at(satpoint: impl Into<String>) -> Self {
        Self {
            satpoint: Some(satpoint.into()),
            location: None,
        }
    }

    /// The first of `satpoint` / `location` that parses.
    #[must_use]
    pub fn satpoint(&self) -> Option<Satpoint> {
        [self.satpoint.as_deref(), self.location.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|s| s.parse().ok())
    }
}

/// A child inscription reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildInscription {
    /// Child inscription id.
    pub id: String,
    /// Genesis height, as most indexers name it.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub height: Option<u64>,
    /// Genesis height, alternate name.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub genesis_height: Option<u64>,
}

impl ChildInscription {
    /// Child with a known genesis height.
    #[must_use]
    pub fn new(id: impl Into<String>, height: u64) -> Self {
        Self {
            id: id.into(),
            height: Some(height),
            genesis_height: None,
        }
    }

    /// Genesis height from whichever field is present.
    #[must_use]
    pub fn height(&self) -> Option<u64> {
        self.height.or(self.genesis_height)
    }
}

/// Accept a non-negative integer or a decimal string; anything else is `None`.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
