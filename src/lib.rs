//! # membership-registry
//!
//! On-chain registration verification for Bitcoin Ordinals membership
//! inscriptions.
//!
//! A membership inscription is *registered* when:
//!
//! - its provenance is continuous: the block height of the parent's last
//!   transfer equals the genesis height of its newest child, and
//! - one of its `buyer_registration.v1` children is bound to a fee
//!   transaction that carries an unexpired OP_RETURN token naming the
//!   inscription and pays at least the minimum fee to the creator address.
//!
//! The crate only consumes narrow upstream interfaces ([`upstream::TxSource`],
//! [`upstream::InscriptionSource`]); it does not perform consensus validation.
//! Confirmation status is trusted from the upstream data source.
//!
//! ## Example
//!
//! ```rust,ignore
//! use membership_registry::{RegistrationEvaluator, RegistryConfig, SystemClock};
//! use membership_registry::upstream::HttpChainSource;
//! use std::sync::Arc;
//!
//! let config = RegistryConfig::from_file("config.toml".as_ref())?;
//! let source = Arc::new(HttpChainSource::new(&config.ord_url, &config.esplora_url)?);
//! let evaluator = RegistrationEvaluator::new(
//!     config.evaluator_settings()?,
//!     source.clone(),
//!     source,
//!     Arc::new(SystemClock),
//! );
//! let status = evaluator.evaluate("<txid>i0").await?;
//! println!("registered: {}", status.is_registered);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod config;
pub mod error;
pub mod inscription;
pub mod network;
pub mod payment;
pub mod provenance;
pub mod registration;
pub mod upstream;


pub use cache::{CacheStats, Clock, ManualClock, SystemClock, TtlCache};
pub use config::{FeeHeightPolicy, RegistryConfig};
pub use error::{Error, Result};
pub use inscription::{InscriptionId, Satpoint};
pub use network::SupportedNetwork;
pub use payment::{
    dedupe, is_expired, sum_outputs_to_address, verify_payment, OpReturnToken,
    VerifyPaymentOptions,
};
pub use provenance::{Derivation, ProvenanceHeightResolver};
pub use registration::{
    EvaluatorSettings, ProvenanceState, RegistrationEvaluator, RegistrationRecord,
    RegistrationStatus,
};
