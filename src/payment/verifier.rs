//! Paid-amount verdict for a single fee transaction.
//!
//! This is the core payment verification logic: see the module-level
//! pipeline in [`crate::payment`].

use crate::error::Result;
use crate::inscription::is_txid;
use crate::network::SupportedNetwork;
use crate::payment::opreturn::OpReturnToken;
use crate::payment::outputs::{locking_script, sum_outputs_to_script};
use crate::payment::decode_transaction;
use crate::upstream::{with_timeout, TxSource};
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-call validation context.
#[derive(Clone, Copy)]
pub struct VerifyPaymentOptions<'a> {
    /// Chain tip the token expiry is checked against.
    pub current_block: u64,
    /// Network the creator address is resolved under.
    pub network: SupportedNetwork,
    /// Lowest acceptable confirmation height for the fee transaction.
    pub min_block: Option<u64>,
    /// Confirmation height of the fee transaction, if known.
    pub tx_block_height: Option<u64>,
    /// Resolver used when the input is a txid.
    pub fetch_tx: Option<&'a dyn TxSource>,
    /// Time bound for `fetch_tx`.
    pub timeout: Option<Duration>,
}

impl<'a> VerifyPaymentOptions<'a> {
    /// Options with no height gate and no resolver.
    #[must_use]
    pub fn new(current_block: u64, network: SupportedNetwork) -> Self {
        Self {
            current_block,
            network,
            min_block: None,
            tx_block_height: None,
            fetch_tx: None,
            timeout: None,
        }
    }

    /// Require the fee transaction to confirm at or above `min_block`.
    #[must_use]
    pub fn with_min_block(mut self, min_block: u64) -> Self {
        self.min_block = Some(min_block);
        self
    }

    /// Supply the fee transaction's confirmation height.
    #[must_use]
    pub fn with_tx_block_height(mut self, height: Option<u64>) -> Self {
        self.tx_block_height = height;
        self
    }

    /// Resolve txid inputs through `source`.
    #[must_use]
    pub fn with_fetch_tx(mut self, source: &'a dyn TxSource) -> Self {
        self.fetch_tx = Some(source);
        self
    }

    /// Bound the txid fetch.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for VerifyPaymentOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyPaymentOptions")
            .field("current_block", &self.current_block)
            .field("network", &self.network)
            .field("min_block", &self.min_block)
            .field("tx_block_height", &self.tx_block_height)
            .field("fetch_tx", &self.fetch_tx.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Verify a fee payment and return the amount paid to `creator_address`.
///
/// `tx_hex_or_id` is either raw transaction hex or a 64-hex txid. A txid is
/// resolved through `opts.fetch_tx`; when the fetched record is confirmed
/// and `opts.tx_block_height` is unset, its height feeds the `min_block`
/// gate.
///
/// # Returns
///
/// * `Ok(sats)` - the payment verified; `sats >= min_fee`
/// * `Ok(0)` - no resolver for a txid, fetch failed, no token, token for
///   another inscription, token expired, height gate failed, or the amount
///   is below `min_fee`
///
/// # Errors
///
/// Returns an error only for caller mistakes: malformed transaction hex or
/// a creator address that does not resolve on `opts.network`.
pub async fn verify_payment(
    tx_hex_or_id: &str,
    creator_address: &str,
    min_fee: u64,
    nft_id: &str,
    opts: &VerifyPaymentOptions<'_>,
) -> Result<u64> {
    let creator_script = locking_script(creator_address, opts.network)?;
    let mut tx_block_height = opts.tx_block_height;

    // Step 1: resolve raw bytes
    let raw_hex: Cow<'_, str> = if is_txid(tx_hex_or_id) {
        let Some(source) = opts.fetch_tx else {
            debug!("No tx resolver for txid {} - payment unverifiable", tx_hex_or_id);
            return Ok(0);
        };
        match with_timeout(opts.timeout, source.fetch_tx(tx_hex_or_id)).await {
            Ok(Some(record)) => {
                tx_block_height = tx_block_height.or_else(|| record.confirmed_height());
                match record.hex {
                    Some(hex) => Cow::Owned(hex),
                    None => {
                        debug!("Tx {} has no raw hex", tx_hex_or_id);
                        return Ok(0);
                    }
                }
            }
            Ok(None) => {
                debug!("Tx {} not found", tx_hex_or_id);
                return Ok(0);
            }
            Err(e) => {
                warn!("Fetching tx {} failed: {}", tx_hex_or_id, e);
                return Ok(0);
            }
        }
    } else {
        Cow::Borrowed(tx_hex_or_id)
    };

    let tx = decode_transaction(&raw_hex)?;

    // Step 2: token binding and expiry
    let Some(token) = OpReturnToken::from_transaction(&tx) else {
        debug!("No OP_RETURN token in fee transaction");
        return Ok(0);
    };
    if token.nft_id != nft_id {
        debug!("Token bound to {} not {}", token.nft_id, nft_id);
        return Ok(0);
    }
    if token.is_expired(opts.current_block) {
        debug!(
            "Token expired at {} (current block {})",
            token.expiry_block, opts.current_block
        );
        return Ok(0);
    }

    // Step 3: height gate
    if let Some(min_block) = opts.min_block {
        match tx_block_height {
            Some(height) if height >= min_block => {}
            other => {
                debug!("Fee tx height {:?} below required {}", other, min_block);
                return Ok(0);
            }
        }
    }

    // Step 4: amount
    let paid = sum_outputs_to_script(&tx, &creator_script);
    if paid < min_fee {
        debug!("Paid {} sats, below minimum {}", paid, min_fee);
        return Ok(0);
    }

    Ok(paid)
}
