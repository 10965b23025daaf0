//! Configuration for membership-registry.

use crate::network::SupportedNetwork;
use crate::payment::locking_script;
use crate::registration::EvaluatorSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How a fee transaction's confirmation height must relate to `H_child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeeHeightPolicy {
    /// Fee tx confirmed at or above `H_child`.
    #[default]
    AtOrAfterChild,
    /// Fee tx confirmed at or before `H_child`, at most `k` blocks earlier.
    WithinWindow {
        /// Window size in blocks.
        k: u64,
    },
}

impl FeeHeightPolicy {
    /// Window size reported as `K`; zero for [`FeeHeightPolicy::AtOrAfterChild`].
    #[must_use]
    pub const fn window(self) -> u64 {
        match self {
            Self::AtOrAfterChild => 0,
            Self::WithinWindow { k } => k,
        }
    }

    /// Human-readable policy name for integrity reports.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::AtOrAfterChild => "at_or_after_child".to_string(),
            Self::WithinWindow { k } => format!("within_window(k={k})"),
        }
    }
}

/// Registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Network the creator address belongs to.
    #[serde(default)]
    pub network: SupportedNetwork,

    /// Address registration fees must be paid to.
    #[serde(default)]
    pub creator_address: String,

    /// Minimum fee in satoshis.
    #[serde(default = "default_min_fee_sats")]
    pub min_fee_sats: u64,

    /// TTL for provenance and verdict caches, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum keys held per cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Time bound for each upstream fetch, in seconds. Zero disables it.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Fee-height policy.
    #[serde(default)]
    pub fee_height_policy: FeeHeightPolicy,

    /// Base URL of the ord server.
    #[serde(default = "default_ord_url")]
    pub ord_url: String,

    /// Base URL of the esplora API.
    #[serde(default = "default_esplora_url")]
    pub esplora_url: String,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            network: SupportedNetwork::default(),
            creator_address: String::new(),
            min_fee_sats: default_min_fee_sats(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fee_height_policy: FeeHeightPolicy::default(),
            ord_url: default_ord_url(),
            esplora_url: default_esplora_url(),
            log_level: default_log_level(),
        }
    }
}

const fn default_min_fee_sats() -> u64 {
    1000
}

const fn default_cache_ttl_secs() -> u64 {
    30
}

const fn default_cache_capacity() -> usize {
    crate::cache::DEFAULT_CACHE_CAPACITY
}

const fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_ord_url() -> String {
    "http://127.0.0.1:80".to_string()
}

fn default_esplora_url() -> String {
    "https://mempool.space/api".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default location of the configuration file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "membership-registry")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("membership-registry.toml"))
}

impl RegistryConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that the configuration can drive an evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the creator address is missing or
    /// does not resolve on `network`, or an upstream URL is empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.creator_address.trim().is_empty() {
            return Err(crate::Error::Config("creator_address is required".to_string()));
        }
        locking_script(&self.creator_address, self.network)
            .map_err(|e| crate::Error::Config(format!("creator_address: {e}")))?;
        if self.ord_url.trim().is_empty() || self.esplora_url.trim().is_empty() {
            return Err(crate::Error::Config("upstream URLs must not be empty".to_string()));
        }
        Ok(())
    }

    /// Fetch time bound as a duration.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }

    /// Validated evaluator settings.
    ///
    /// # Errors
    ///
    /// Returns an error if [`RegistryConfig::validate`] fails.
    pub fn evaluator_settings(&self) -> crate::Result<EvaluatorSettings> {
        self.validate()?;
        Ok(EvaluatorSettings {
            network: self.network,
            creator_address: self.creator_address.trim().to_string(),
            min_fee_sats: self.min_fee_sats,
            fee_height_policy: self.fee_height_policy,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_capacity: self.cache_capacity,
            fetch_timeout: self.fetch_timeout(),
        })
    }
}
