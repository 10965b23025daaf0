//! Registration child bodies and the normalized record built from them.

use crate::upstream::lenient_u64;
use serde::{Deserialize, Deserializer, Serialize};

/// Schema tag carried by registration children.
pub const REGISTRATION_SCHEMA: &str = "buyer_registration.v1";

/// Body of a registration child inscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationContent {
    /// Schema tag; must equal [`REGISTRATION_SCHEMA`].
    pub schema: String,
    /// Inscription being registered.
    pub parent: String,
    /// Address the buyer claims to have paid.
    #[serde(default, deserialize_with = "lenient_text")]
    pub paid_to: Option<String>,
    /// Fee the buyer claims to have paid.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub fee_sats: Option<u64>,
    /// Transaction the buyer associates with the registration.
    #[serde(default, deserialize_with = "lenient_text")]
    pub txid: Option<String>,
    /// Buyer-supplied timestamp, passed through untouched.
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    /// Fee transaction carrying the OP_RETURN token.
    #[serde(rename = "feeTxid", default)]
    pub fee_txid: String,
}

/// Buyer-supplied text: strings pass through, numbers and booleans are
/// rendered, anything else is `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => Some(v.to_string()),
        _ => None,
    })
}

/// Returns true if `body` claims to register `nft_id`, whatever the shape of
/// its other fields.
#[must_use]
pub fn claims_registration(body: &serde_json::Value, nft_id: &str) -> bool {
    let field = |name: &str| body.get(name).and_then(serde_json::Value::as_str);
    field("schema") == Some(REGISTRATION_SCHEMA)
        && field("parent").is_some_and(|parent| parent.eq_ignore_ascii_case(nft_id))
}

impl RegistrationContent {
    /// Returns true if this body registers `nft_id`.
    #[must_use]
    pub fn registers(&self, nft_id: &str) -> bool {
        self.schema == REGISTRATION_SCHEMA
            && self.parent.eq_ignore_ascii_case(nft_id)
            && !self.fee_txid.trim().is_empty()
    }
}

/// A verified registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Schema tag of the registration child.
    pub schema: String,
    /// Registered inscription.
    pub parent: String,
    /// Address the buyer claims to have paid.
    pub paid_to: Option<String>,
    /// Fee the buyer claims to have paid.
    pub fee_sats: Option<u64>,
    /// Transaction the buyer associates with the registration.
    pub txid: Option<String>,
    /// Buyer-supplied timestamp.
    pub timestamp: Option<serde_json::Value>,
    /// Verified fee transaction.
    #[serde(rename = "feeTxid")]
    pub fee_txid: String,
    /// Satoshis the fee transaction paid to the creator.
    pub amount: u64,
    /// Registration child inscription.
    #[serde(rename = "childId", skip_serializing_if = "Option::is_none", default)]
    pub child_id: Option<String>,
}

impl RegistrationRecord {
    /// Build a record from a child body once its fee verified.
    #[must_use]
    pub fn from_content(content: RegistrationContent, amount: u64, child_id: Option<String>) -> Self {
        Self {
            schema: content.schema,
            parent: content.parent,
            paid_to: content.paid_to,
            fee_sats: content.fee_sats,
            txid: content.txid,
            timestamp: content.timestamp,
            fee_txid: content.fee_txid,
            amount,
            child_id,
        }
    }
}
