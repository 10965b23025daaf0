//! Test harness wiring a [`MockChain`] to a [`RegistrationEvaluator`].
//!
//! The harness owns one membership inscription (`NFT_ID`) and offers
//! helpers to place its last transfer, add registration children and mint
//! fee transactions paying the creator.

#![allow(clippy::expect_used)]

use super::chain::MockChain;
use bitcoin::absolute::LockTime;
use bitcoin::script::PushBytesBuf;
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, ScriptBuf, Transaction, TxIn, TxOut};
use membership_registry::payment::locking_script;
use membership_registry::upstream::{ChildInscription, TxRecord};
use membership_registry::{
    EvaluatorSettings, FeeHeightPolicy, ManualClock, RegistrationEvaluator, SupportedNetwork,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// The membership inscription under test.
pub const NFT_ID: &str = "6fb976ab49dcec017f1e201e84395983204ae1a7c2abf7ced0a85d692e442799i0";

/// Transaction that last moved `NFT_ID`.
pub const TRANSFER_TXID: &str = "2b1f4e7c8d9a0b3c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4";

/// Network every harness address lives on.
pub const NETWORK: SupportedNetwork = SupportedNetwork::Testnet;

/// Minimum registration fee.
pub const MIN_FEE: u64 = 1000;

/// Chain tip reported by the mock.
pub const TIP: u64 = 200_000;

/// Deterministic txid for fixture `n`.
#[must_use]
pub fn txid(n: u8) -> String {
    format!("{n:02x}").repeat(32)
}

/// Deterministic child inscription id for fixture `n`.
#[must_use]
pub fn child_id(n: u8) -> String {
    format!("{}i{n}", "c1".repeat(32))
}

/// P2WSH address on `network` derived from `seed`.
#[must_use]
pub fn address(network: SupportedNetwork, seed: u8) -> String {
    let witness_script = ScriptBuf::from_bytes(vec![seed; 4]);
    Address::p2wsh(&witness_script, network.to_bitcoin()).to_string()
}

/// Output paying `sats` to `address`.
#[must_use]
pub fn pay(address: &str, network: SupportedNetwork, sats: u64) -> TxOut {
    TxOut {
        value: Amount::from_sat(sats),
        script_pubkey: locking_script(address, network).expect("valid fixture address"),
    }
}

/// OP_RETURN output carrying `payload`.
#[must_use]
pub fn op_return(payload: &str) -> TxOut {
    let push = PushBytesBuf::try_from(payload.as_bytes().to_vec()).expect("payload fits a push");
    TxOut {
        value: Amount::ZERO,
        script_pubkey: ScriptBuf::new_op_return(push),
    }
}

/// Serialize a one-input transaction with `outputs` to hex.
#[must_use]
pub fn raw_tx(outputs: Vec<TxOut>) -> String {
    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn::default()],
        output: outputs,
    };
    bitcoin::consensus::encode::serialize_hex(&tx)
}

/// Registration child body for `parent` bound to `fee_txid`.
#[must_use]
pub fn registration_body(parent: &str, fee_txid: &str) -> serde_json::Value {
    json!({
        "schema": "buyer_registration.v1",
        "parent": parent,
        "paid_to": "creator",
        "fee_sats": MIN_FEE,
        "timestamp": 1_714_521_600,
        "feeTxid": fee_txid,
    })
}

/// Test harness around one evaluator.
pub struct TestHarness {
    /// The upstream.
    pub chain: Arc<MockChain>,
    /// Virtual clock driving every cache.
    pub clock: Arc<ManualClock>,
    /// Evaluator under test.
    pub evaluator: RegistrationEvaluator,
    /// Creator address fees must reach.
    pub creator: String,
}

impl TestHarness {
    /// Harness with the default fee-height policy.
    #[must_use]
    pub fn setup() -> Self {
        Self::setup_with_policy(FeeHeightPolicy::AtOrAfterChild)
    }

    /// Harness with an explicit fee-height policy.
    #[must_use]
    pub fn setup_with_policy(policy: FeeHeightPolicy) -> Self {
        let chain = Arc::new(MockChain::with_tip(TIP));
        let clock = Arc::new(ManualClock::new());
        let creator = address(NETWORK, 1);
        let settings = EvaluatorSettings {
            network: NETWORK,
            creator_address: creator.clone(),
            min_fee_sats: MIN_FEE,
            fee_height_policy: policy,
            cache_ttl: Duration::from_secs(30),
            cache_capacity: 128,
            fetch_timeout: Some(Duration::from_secs(5)),
        };
        let evaluator =
            RegistrationEvaluator::new(settings, chain.clone(), chain.clone(), clock.clone());

        Self {
            chain,
            clock,
            evaluator,
            creator,
        }
    }

    /// Place the last transfer of `NFT_ID` at `height`.
    pub fn set_parent_height(&self, height: u64) {
        self.chain
            .set_satpoint(NFT_ID, &format!("{TRANSFER_TXID}:0:0"));
        self.chain
            .put_tx(TRANSFER_TXID, TxRecord::confirmed(raw_tx(vec![op_return("transfer")]), height));
    }

    /// Add a registration child at `height` bound to `fee_txid`.
    pub fn add_registration(&self, n: u8, height: u64, fee_txid: &str) {
        self.chain.add_child(
            NFT_ID,
            ChildInscription::new(child_id(n), height),
            Some(registration_body(NFT_ID, fee_txid)),
        );
    }

    /// Add a fee transaction carrying `token` that pays `sats` to the creator,
    /// confirmed at `height`.
    pub fn add_fee_tx(&self, fee_txid: &str, token: &str, sats: u64, height: u64) {
        self.chain
            .put_tx(fee_txid, TxRecord::confirmed(self.fee_tx_hex(token, sats), height));
    }

    /// Raw fee transaction carrying `token` and paying `sats` to the creator.
    #[must_use]
    pub fn fee_tx_hex(&self, token: &str, sats: u64) -> String {
        raw_tx(vec![op_return(token), pay(&self.creator, NETWORK, sats)])
    }

    /// Token binding a fee to `NFT_ID`, valid well past the tip.
    #[must_use]
    pub fn valid_token() -> String {
        format!("{NFT_ID}|{}", TIP + 10_000)
    }

    /// Advance the virtual clock past the cache TTL.
    pub fn expire_caches(&self) {
        self.clock.advance(Duration::from_secs(31));
    }
}
