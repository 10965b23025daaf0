//! Supported Bitcoin networks and their address-encoding parameter sets.
//!
//! Four networks map onto three parameter tables: testnet and signet share
//! one, mainnet and regtest each have their own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address-encoding parameters for one network family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressParams {
    /// Bech32 / Bech32m human-readable part.
    pub bech32_hrp: &'static str,
    /// Base58Check version byte for P2PKH.
    pub p2pkh_prefix: u8,
    /// Base58Check version byte for P2SH.
    pub p2sh_prefix: u8,
}

const MAINNET_PARAMS: AddressParams = AddressParams {
    bech32_hrp: "bc",
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
};

const TESTNET_PARAMS: AddressParams = AddressParams {
    bech32_hrp: "tb",
    p2pkh_prefix: 0x6f,
    p2sh_prefix: 0xc4,
};

const REGTEST_PARAMS: AddressParams = AddressParams {
    bech32_hrp: "bcrt",
    p2pkh_prefix: 0x6f,
    p2sh_prefix: 0xc4,
};

/// Bitcoin network a verification runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedNetwork {
    /// Bitcoin mainnet.
    #[default]
    Mainnet,
    /// Testnet (v3).
    Testnet,
    /// Signet. Shares address parameters with testnet.
    Signet,
    /// Local regtest.
    Regtest,
}

impl SupportedNetwork {
    /// All supported networks.
    pub const ALL: [Self; 4] = [Self::Mainnet, Self::Testnet, Self::Signet, Self::Regtest];

    /// Address parameter table for this network.
    #[must_use]
    pub const fn params(self) -> &'static AddressParams {
        match self {
            Self::Mainnet => &MAINNET_PARAMS,
            Self::Testnet | Self::Signet => &TESTNET_PARAMS,
            Self::Regtest => &REGTEST_PARAMS,
        }
    }

    /// Returns true when both networks encode addresses identically.
    #[must_use]
    pub fn shares_params_with(self, other: Self) -> bool {
        self.params() == other.params()
    }

    /// The corresponding `bitcoin` crate network.
    #[must_use]
    pub const fn to_bitcoin(self) -> bitcoin::Network {
        match self {
            Self::Mainnet => bitcoin::Network::Bitcoin,
            Self::Testnet => bitcoin::Network::Testnet,
            Self::Signet => bitcoin::Network::Signet,
            Self::Regtest => bitcoin::Network::Regtest,
        }
    }

    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Signet => "signet",
            Self::Regtest => "regtest",
        }
    }
}

impl fmt::Display for SupportedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedNetwork {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "signet" => Ok(Self::Signet),
            "regtest" => Ok(Self::Regtest),
            other => Err(crate::Error::Config(format!("unsupported network: {other}"))),
        }
    }
}
