//! Registration evaluation scenarios against the mock chain.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::{child_id, registration_body, txid, NFT_ID, TIP};
use super::{Method, TestHarness};
use membership_registry::upstream::{ChildInscription, TxRecord};
use membership_registry::{Error, FeeHeightPolicy};
use serde_json::json;

const HEIGHT: u64 = 100;

/// Harness with a continuous provenance at `HEIGHT` and one valid fee.
fn registered_harness() -> TestHarness {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 1500, HEIGHT);
    harness
}

#[tokio::test]
async fn test_registered_when_provenance_continuous_and_fee_paid() {
    let harness = registered_harness();

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(status.is_registered);
    let record = status.last_registration.expect("record");
    assert_eq!(record.fee_txid, txid(0xa1));
    assert_eq!(record.amount, 1500);
    assert_eq!(record.child_id, Some(child_id(1)));
    assert_eq!(status.debug.provenance.h_parent, Some(HEIGHT));
    assert_eq!(status.debug.provenance.h_child, Some(HEIGHT));
    assert_eq!(status.debug.provenance.fee_height, Some(HEIGHT));
    assert_eq!(status.debug.child_count, 1);
    assert!(status.integrity.find("provenance.continuity").expect("check").passed);
    assert!(status.integrity.find("fee.payment").expect("check").passed);
}

#[tokio::test]
async fn test_uppercase_id_is_normalized() {
    let harness = registered_harness();

    let status = harness
        .evaluator
        .evaluate(&NFT_ID.to_uppercase().replace('I', "i"))
        .await
        .expect("evaluate");

    assert!(status.is_registered);
    assert_eq!(status.debug.nft_id, NFT_ID);
}

#[tokio::test]
async fn test_height_mismatch_is_unregistered() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT + 1);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 1500, HEIGHT + 1);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    assert!(status.last_registration.is_none());
    assert_eq!(status.debug.child_count, 0);
    assert!(!status.integrity.find("provenance.continuity").expect("check").passed);
    // The gate stops before any fee transaction is fetched
    assert_eq!(harness.chain.calls(Method::Tx), 1);
    assert_eq!(harness.chain.calls(Method::Content), 0);
}

#[tokio::test]
async fn test_no_children_is_unregistered() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    assert_eq!(status.debug.provenance.h_child, None);
}

#[tokio::test]
async fn test_verdict_cached_within_ttl() {
    let harness = registered_harness();

    let first = harness.evaluator.evaluate(NFT_ID).await.expect("first");
    let meta_calls = harness.chain.calls(Method::Meta);
    let second = harness.evaluator.evaluate(NFT_ID).await.expect("second");

    assert_eq!(first, second);
    assert_eq!(harness.chain.calls(Method::Meta), meta_calls);
    assert_eq!(harness.evaluator.cache_stats().hits, 1);

    harness.expire_caches();
    harness.evaluator.evaluate(NFT_ID).await.expect("third");
    assert_eq!(harness.chain.calls(Method::Meta), meta_calls + 1);
}

#[tokio::test]
async fn test_duplicate_fee_txids_fetched_once() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT - 5, &txid(0xa1));
    harness.add_registration(2, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 10, HEIGHT);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    // One transfer tx plus one fee tx
    assert_eq!(harness.chain.calls(Method::Tx), 2);
    assert_eq!(status.candidate_errors.len(), 1);
    assert_eq!(status.candidate_errors[0].child_id, child_id(2));
}

#[tokio::test]
async fn test_failed_newest_candidate_falls_through_to_older() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT - 10, &txid(0xa1));
    harness.add_registration(2, HEIGHT, &txid(0xa2));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 2000, HEIGHT);
    harness.add_fee_tx(&txid(0xa2), &TestHarness::valid_token(), 999, HEIGHT);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(status.is_registered);
    let record = status.last_registration.expect("record");
    assert_eq!(record.child_id, Some(child_id(1)));
    assert_eq!(record.amount, 2000);
    assert_eq!(status.candidate_errors.len(), 1);
    assert_eq!(status.candidate_errors[0].fee_txid, Some(txid(0xa2)));
    assert!(!status.candidate_errors[0].upstream);
}

#[tokio::test]
async fn test_meta_outage_fails_closed() {
    let harness = registered_harness();
    harness.chain.fail(Method::Meta);

    let err = harness.evaluator.evaluate(NFT_ID).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));

    // The unavailable derivation stays cached until the TTL lapses
    harness.chain.recover();
    assert!(harness.evaluator.evaluate(NFT_ID).await.is_err());

    harness.expire_caches();
    let status = harness.evaluator.evaluate(NFT_ID).await.expect("recovered");
    assert!(status.is_registered);
}

#[tokio::test]
async fn test_tip_outage_is_an_error_and_not_cached() {
    let harness = registered_harness();
    harness.chain.fail(Method::Tip);

    assert!(harness.evaluator.evaluate(NFT_ID).await.is_err());

    harness.chain.recover();
    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");
    assert!(status.is_registered);
}

#[tokio::test]
async fn test_children_outage_is_an_error() {
    let harness = registered_harness();
    harness.chain.fail(Method::Children);

    let err = harness.evaluator.evaluate(NFT_ID).await.unwrap_err();
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_fee_tx_outage_verdict_not_cached() {
    let harness = registered_harness();
    harness.chain.fail_tx(&txid(0xa1));

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");
    assert!(!status.is_registered);
    assert!(status.candidate_errors[0].upstream);
    assert!(!status.is_cacheable());

    harness.chain.recover();
    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");
    assert!(status.is_registered);
}

#[tokio::test]
async fn test_content_outage_recorded_as_candidate_error() {
    let harness = registered_harness();
    harness.chain.fail(Method::Content);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    assert_eq!(status.candidate_errors.len(), 1);
    assert_eq!(status.candidate_errors[0].fee_txid, None);
    assert!(status.candidate_errors[0].upstream);
}

#[tokio::test]
async fn test_window_policy_accepts_fee_before_child() {
    let harness = TestHarness::setup_with_policy(FeeHeightPolicy::WithinWindow { k: 6 });
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 1500, HEIGHT - 3);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(status.is_registered);
    assert_eq!(status.debug.provenance.fee_height, Some(HEIGHT - 3));
    assert_eq!(status.debug.provenance.k, 6);
}

#[tokio::test]
async fn test_window_policy_rejects_fee_after_child() {
    let harness = TestHarness::setup_with_policy(FeeHeightPolicy::WithinWindow { k: 6 });
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 1500, HEIGHT + 1);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    assert_eq!(status.debug.provenance.fee_height, Some(HEIGHT + 1));
}

#[tokio::test]
async fn test_window_policy_rejects_fee_too_old() {
    let harness = TestHarness::setup_with_policy(FeeHeightPolicy::WithinWindow { k: 6 });
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 1500, HEIGHT - 7);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
}

#[tokio::test]
async fn test_default_policy_rejects_fee_before_child() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 1500, HEIGHT - 3);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    assert_eq!(status.debug.provenance.k, 0);
}

#[tokio::test]
async fn test_invalid_id_rejected() {
    let harness = TestHarness::setup();

    let err = harness.evaluator.evaluate("not-an-inscription").await.unwrap_err();

    assert!(matches!(err, Error::InvalidInscriptionId(_)));
    assert_eq!(harness.chain.calls(Method::Meta), 0);
}

#[tokio::test]
async fn test_token_for_other_inscription_rejected() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    let other = format!("{}i0", "ab".repeat(32));
    harness.add_fee_tx(&txid(0xa1), &format!("{other}|{}", TIP + 100), 1500, HEIGHT);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &format!("{NFT_ID}|{TIP}"), 1500, HEIGHT);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
}

#[tokio::test]
async fn test_unconfirmed_fee_rejected() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    let hex = harness.fee_tx_hex(&TestHarness::valid_token(), 1500);
    harness.chain.put_tx(&txid(0xa1), TxRecord::unconfirmed(hex));

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    assert_eq!(status.debug.provenance.fee_height, None);
}

#[tokio::test]
async fn test_non_registration_children_ignored() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.chain.add_child(
        NFT_ID,
        ChildInscription::new(child_id(7), HEIGHT - 20),
        Some(json!({ "name": "artwork" })),
    );
    harness
        .chain
        .add_child(NFT_ID, ChildInscription::new(child_id(8), HEIGHT - 10), None);
    harness.chain.add_child(
        NFT_ID,
        ChildInscription::new(child_id(9), HEIGHT - 5),
        Some(registration_body(&format!("{}i0", "ab".repeat(32)), &txid(0xb1))),
    );
    harness.add_registration(1, HEIGHT, &txid(0xa1));
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 1500, HEIGHT);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(status.is_registered);
    assert_eq!(status.debug.child_count, 4);
    assert!(status.candidate_errors.is_empty());
}

#[tokio::test]
async fn test_status_serializes_debug_fields() {
    let harness = registered_harness();

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");
    let value = serde_json::to_value(&status).expect("serialize");

    assert_eq!(value["isRegistered"], json!(true));
    assert_eq!(value["debug"]["H_parent"], json!(HEIGHT));
    assert_eq!(value["debug"]["H_child"], json!(HEIGHT));
    assert_eq!(value["debug"]["feeHeight"], json!(HEIGHT));
    assert_eq!(value["debug"]["K"], json!(0));
    assert_eq!(value["lastRegistration"]["feeTxid"], json!(txid(0xa1)));
}

#[tokio::test]
async fn test_loosely_typed_passthrough_fields_still_register() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.chain.add_child(
        NFT_ID,
        ChildInscription::new(child_id(1), HEIGHT),
        Some(json!({
            "schema": "buyer_registration.v1",
            "parent": NFT_ID,
            "fee_sats": "1000",
            "paid_to": { "unexpected": true },
            "feeTxid": txid(0xa1),
        })),
    );
    harness.add_fee_tx(&txid(0xa1), &TestHarness::valid_token(), 1500, HEIGHT);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(status.is_registered);
    let record = status.last_registration.expect("record");
    assert_eq!(record.fee_sats, Some(1000));
    assert_eq!(record.paid_to, None);
    assert_eq!(harness.chain.calls(Method::Tx), 2);
}

#[tokio::test]
async fn test_malformed_registration_body_recorded_as_candidate_error() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.chain.add_child(
        NFT_ID,
        ChildInscription::new(child_id(1), HEIGHT),
        Some(json!({
            "schema": "buyer_registration.v1",
            "parent": NFT_ID,
            "feeTxid": 12_345,
        })),
    );

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    assert_eq!(status.candidate_errors.len(), 1);
    let error = &status.candidate_errors[0];
    assert_eq!(error.child_id, child_id(1));
    assert_eq!(error.fee_txid, None);
    assert!(!error.upstream);
    assert!(status.is_cacheable());
}

#[tokio::test]
async fn test_fee_txid_that_is_not_a_txid_is_never_fetched() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    harness.add_registration(1, HEIGHT, "../../blocks/tip/height");

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    // Only the transfer tx reached the upstream
    assert_eq!(harness.chain.calls(Method::Tx), 1);
    assert_eq!(status.candidate_errors.len(), 1);
    let error = &status.candidate_errors[0];
    assert_eq!(error.reason, "feeTxid is not a txid");
    assert!(!error.upstream);
}

#[tokio::test]
async fn test_fee_txids_dedupe_across_case() {
    let harness = TestHarness::setup();
    harness.set_parent_height(HEIGHT);
    let fee = format!("{}{}", "ab".repeat(16), "cd".repeat(16));
    harness.add_registration(1, HEIGHT - 5, &fee.to_ascii_uppercase());
    harness.add_registration(2, HEIGHT, &fee);
    harness.add_fee_tx(&fee, &TestHarness::valid_token(), 10, HEIGHT);

    let status = harness.evaluator.evaluate(NFT_ID).await.expect("evaluate");

    assert!(!status.is_registered);
    assert_eq!(harness.chain.calls(Method::Tx), 2);
    assert_eq!(status.candidate_errors.len(), 1);
    assert_eq!(status.candidate_errors[0].fee_txid, Some(fee));
}
