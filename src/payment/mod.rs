//! Fee-payment verification for membership registrations.
//!
//! A fee transaction is valid for an inscription when it carries an
//! OP_RETURN token binding it to that inscription, the token has not
//! expired, and its outputs pay at least the minimum fee to the creator.
//!
//! # Pipeline
//!
//! ```text
//! txid or raw hex
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ Resolve raw bytes   │  (fetch by txid, optional time bound)
//! └─────────┬───────────┘
//!           ▼
//! ┌─────────────────────┐
//! │ Decode OP_RETURN    │  "<nftId>|<expiryBlock>"
//! └─────────┬───────────┘
//!           ▼
//!   nftId matches and expiryBlock > currentBlock?
//!           │
//!           ▼
//!   minBlock gate (if configured)
//!           │
//!           ▼
//! ┌─────────────────────┐
//! │ Sum outputs paying  │
//! │ the creator address │
//! └─────────┬───────────┘
//!           ▼
//!   sum >= minFee ? sum : 0
//! ```

mod dedupe;
mod opreturn;
mod outputs;
mod verifier;

pub use dedupe::dedupe;
pub use opreturn::{is_expired, OpReturnToken, TOKEN_SEPARATOR};
pub use outputs::{locking_script, sum_outputs_to_address, sum_outputs_to_script};
pub use verifier::{verify_payment, VerifyPaymentOptions};

use crate::error::{Error, Result};
use bitcoin::Transaction;

/// Decode a hex-encoded, consensus-serialized transaction.
///
/// # Errors
///
/// Returns [`Error::Decode`] for odd-length or non-hex input, or bytes that
/// are not a complete transaction.
pub fn decode_transaction(raw_tx_hex: &str) -> Result<Transaction> {
    let bytes = hex::decode(raw_tx_hex.trim())
        .map_err(|e| Error::Decode(format!("invalid transaction hex: {e}")))?;
    bitcoin::consensus::deserialize(&bytes)
        .map_err(|e| Error::Decode(format!("invalid transaction encoding: {e}")))
}
