//! Command-line interface definition.

use clap::{Parser, ValueEnum};
use membership_registry::config::default_config_path;
use membership_registry::{FeeHeightPolicy, RegistryConfig, SupportedNetwork};
use std::path::PathBuf;

/// Check whether an Ordinals membership inscription is registered.
#[derive(Parser, Debug)]
#[command(name = "membership-check")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Membership inscription id (`<txid>i<index>`).
    pub nft_id: String,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Network the creator address belongs to.
    #[arg(long, value_enum, env = "MEMBERSHIP_NETWORK")]
    pub network: Option<CliNetwork>,

    /// Address registration fees must be paid to.
    #[arg(long, env = "MEMBERSHIP_CREATOR_ADDRESS")]
    pub creator_address: Option<String>,

    /// Minimum registration fee in satoshis.
    #[arg(long, env = "MEMBERSHIP_MIN_FEE")]
    pub min_fee: Option<u64>,

    /// Base URL of the ord server.
    #[arg(long, env = "MEMBERSHIP_ORD_URL")]
    pub ord_url: Option<String>,

    /// Base URL of the esplora API.
    #[arg(long, env = "MEMBERSHIP_ESPLORA_URL")]
    pub esplora_url: Option<String>,

    /// Accept fee transactions up to K blocks before the newest child.
    #[arg(long, value_name = "K", env = "MEMBERSHIP_FEE_WINDOW")]
    pub fee_window: Option<u64>,

    /// Log level.
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,
}

/// Network CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliNetwork {
    /// Bitcoin mainnet.
    Mainnet,
    /// Testnet3.
    Testnet,
    /// Signet.
    Signet,
    /// Local regtest.
    Regtest,
}

impl Cli {
    /// Convert CLI arguments into a `RegistryConfig`.
    ///
    /// Without `--config`, the platform config file is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<RegistryConfig> {
        // Start with default config or load from file
        let mut config = match self.config {
            Some(ref path) => RegistryConfig::from_file(path)?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    RegistryConfig::from_file(&path)?
                } else {
                    RegistryConfig::default()
                }
            }
        };

        // Override with CLI arguments
        if let Some(network) = self.network {
            config.network = network.into();
        }
        if let Some(address) = self.creator_address {
            config.creator_address = address;
        }
        if let Some(min_fee) = self.min_fee {
            config.min_fee_sats = min_fee;
        }
        if let Some(url) = self.ord_url {
            config.ord_url = url;
        }
        if let Some(url) = self.esplora_url {
            config.esplora_url = url;
        }
        if let Some(k) = self.fee_window {
            config.fee_height_policy = FeeHeightPolicy::WithinWindow { k };
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        Ok(config)
    }
}

impl From<CliNetwork> for SupportedNetwork {
    fn from(n: CliNetwork) -> Self {
        match n {
            CliNetwork::Mainnet => Self::Mainnet,
            CliNetwork::Testnet => Self::Testnet,
            CliNetwork::Signet => Self::Signet,
            CliNetwork::Regtest => Self::Regtest,
        }
    }
}
