//! Inscription identifiers and satpoints.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returns true if `s` is a 64-character hex transaction id.
#[must_use]
pub fn is_txid(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Identifier of an inscription: `<64-hex-txid>i<index>`.
///
/// The txid is normalised to lowercase so ids compare equal regardless of
/// the casing an upstream returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InscriptionId {
    txid: String,
    index: u32,
}

impl InscriptionId {
    /// Reveal transaction id.
    #[must_use]
    pub fn txid(&self) -> &str {
        &self.txid
    }

    /// Index of the inscription within the reveal transaction.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl FromStr for InscriptionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (txid, index) = s
            .split_once('i')
            .ok_or_else(|| Error::InvalidInscriptionId(s.to_string()))?;
        if !is_txid(txid) {
            return Err(Error::InvalidInscriptionId(s.to_string()));
        }
        let index = index
            .parse::<u32>()
            .map_err(|_| Error::InvalidInscriptionId(s.to_string()))?;
        Ok(Self {
            txid: txid.to_ascii_lowercase(),
            index,
        })
    }
}

impl TryFrom<String> for InscriptionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<InscriptionId> for String {
    fn from(id: InscriptionId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for InscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}i{}", self.txid, self.index)
    }
}

/// Location of a satoshi: `<64-hex-txid>:<vout>:<offset>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Satpoint {
    /// Transaction holding the sat.
    pub txid: String,
    /// Output index.
    pub vout: u32,
    /// Offset of the sat within the output.
    pub offset: u64,
}

impl FromStr for Satpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::Decode(format!("malformed satpoint: {s}"));
        let mut parts = s.split(':');
        let (Some(txid), Some(vout), Some(offset), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if !is_txid(txid) {
            return Err(malformed());
        }
        Ok(Self {
            txid: txid.to_ascii_lowercase(),
            vout: vout.parse().map_err(|_| malformed())?,
            offset: offset.parse().map_err(|_| malformed())?,
        })
    }
}

impl fmt::Display for Satpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.txid, self.vout, self.offset)
    }
}
