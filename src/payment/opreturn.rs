//! OP_RETURN payment-binding token.
//!
//! The token is plain ASCII, `<nftId>|<expiryBlock>`, carried in the pushes
//! of a single OP_RETURN output. A transaction yields at most one token: the
//! first OP_RETURN output whose payload decodes.

use crate::payment::decode_transaction;
use bitcoin::script::Instruction;
use bitcoin::{Script, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the two token fields.
pub const TOKEN_SEPARATOR: char = '|';

/// Decoded payment-binding token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpReturnToken {
    /// Inscription the payment is bound to.
    pub nft_id: String,
    /// Block height at which the token stops being valid.
    pub expiry_block: u64,
}

/// Returns true iff a token with `expiry_block` is no longer valid at
/// `current_block`.
#[must_use]
pub const fn is_expired(expiry_block: u64, current_block: u64) -> bool {
    expiry_block <= current_block
}

impl OpReturnToken {
    /// Decode the token from a hex-encoded raw transaction.
    ///
    /// Never fails: bad hex, a missing OP_RETURN output or a payload of the
    /// wrong shape all yield `None`.
    #[must_use]
    pub fn parse(raw_tx_hex: &str) -> Option<Self> {
        let tx = decode_transaction(raw_tx_hex).ok()?;
        Self::from_transaction(&tx)
    }

    /// Decode the token from an already-decoded transaction.
    #[must_use]
    pub fn from_transaction(tx: &Transaction) -> Option<Self> {
        tx.output
            .iter()
            .filter(|output| output.script_pubkey.is_op_return())
            .find_map(|output| {
                op_return_payload(&output.script_pubkey)
                    .and_then(|payload| Self::decode_payload(&payload))
            })
    }

    /// Decode `<nftId>|<expiryBlock>` from raw payload bytes.
    #[must_use]
    pub fn decode_payload(payload: &[u8]) -> Option<Self> {
        if !payload.is_ascii() {
            return None;
        }
        let text = std::str::from_utf8(payload).ok()?;
        let (nft_id, expiry) = text.split_once(TOKEN_SEPARATOR)?;

        // u64::from_str would accept a leading '+'
        if nft_id.is_empty() || expiry.is_empty() || !expiry.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            nft_id: nft_id.to_string(),
            expiry_block: expiry.parse().ok()?,
        })
    }

    /// Encode the token payload as carried on-chain.
    #[must_use]
    pub fn encode_payload(&self) -> String {
        self.to_string()
    }

    /// Returns true if the token is no longer valid at `current_block`.
    #[must_use]
    pub const fn is_expired(&self, current_block: u64) -> bool {
        is_expired(self.expiry_block, current_block)
    }
}

impl fmt::Display for OpReturnToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{TOKEN_SEPARATOR}{}", self.nft_id, self.expiry_block)
    }
}

/// Concatenated data pushes following the OP_RETURN opcode.
///
/// Any non-push opcode or truncated push makes the script unusable.
fn op_return_payload(script: &Script) -> Option<Vec<u8>> {
    let mut payload = Vec::new();
    for instruction in script.instructions().skip(1) {
        match instruction.ok()? {
            Instruction::PushBytes(bytes) => payload.extend_from_slice(bytes.as_bytes()),
            Instruction::Op(_) => return None,
        }
    }
    Some(payload)
}
