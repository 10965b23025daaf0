//! Top-level registration evaluation.

use crate::cache::{CacheStats, Clock, TtlCache};
use crate::config::FeeHeightPolicy;
use crate::error::{Error, Result};
use crate::inscription::{is_txid, InscriptionId};
use crate::network::SupportedNetwork;
use crate::payment::{dedupe, verify_payment, VerifyPaymentOptions};
use crate::provenance::{Derivation, ProvenanceHeightResolver};
use crate::registration::record::{claims_registration, RegistrationContent, RegistrationRecord};
use crate::registration::status::{
    CandidateError, DebugInfo, Integrity, ProvenanceState, RegistrationStatus,
};
use crate::upstream::{with_timeout, ChildInscription, InscriptionSource, TxSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings an evaluator runs with.
#[derive(Debug, Clone)]
pub struct EvaluatorSettings {
    /// Network the creator address belongs to.
    pub network: SupportedNetwork,
    /// Address registration fees must be paid to.
    pub creator_address: String,
    /// Minimum fee in satoshis.
    pub min_fee_sats: u64,
    /// Fee-height policy.
    pub fee_height_policy: FeeHeightPolicy,
    /// TTL for provenance and verdict caches.
    pub cache_ttl: Duration,
    /// Maximum keys held per cache.
    pub cache_capacity: usize,
    /// Time bound for each upstream fetch.
    pub fetch_timeout: Option<Duration>,
}

/// A registration child whose fee transaction is still to be checked.
struct Candidate {
    child_id: String,
    content: RegistrationContent,
}

/// Outcome of one candidate.
type CandidateOutcome =
    std::result::Result<(RegistrationRecord, Option<u64>), (CandidateError, Option<u64>)>;

/// Evaluates whether membership inscriptions are registered.
pub struct RegistrationEvaluator {
    settings: EvaluatorSettings,
    inscriptions: Arc<dyn InscriptionSource>,
    txs: Arc<dyn TxSource>,
    provenance: ProvenanceHeightResolver,
    verdicts: TtlCache<RegistrationStatus>,
}

impl RegistrationEvaluator {
    /// Create an evaluator over the given upstreams.
    #[must_use]
    pub fn new(
        settings: EvaluatorSettings,
        inscriptions: Arc<dyn InscriptionSource>,
        txs: Arc<dyn TxSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let provenance = ProvenanceHeightResolver::with_settings(
            settings.cache_capacity,
            settings.cache_ttl,
            Arc::clone(&clock),
        )
        .with_fetch_timeout(settings.fetch_timeout);
        let verdicts = TtlCache::with_capacity(settings.cache_capacity, settings.cache_ttl, clock);

        info!(
            "Registration evaluator initialized (network={}, min_fee={} sats, policy={})",
            settings.network,
            settings.min_fee_sats,
            settings.fee_height_policy.describe()
        );

        Self {
            settings,
            inscriptions,
            txs,
            provenance,
            verdicts,
        }
    }

    /// Evaluate the registration status of `nft_id`.
    ///
    /// Verdicts are cached per inscription for the configured TTL, except
    /// unregistered verdicts that relied on a failed upstream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInscriptionId`] for a malformed id, and
    /// [`Error::Network`] / [`Error::Timeout`] when the verdict cannot be
    /// determined because an upstream is unavailable. Errors are never
    /// cached.
    pub async fn evaluate(&self, nft_id: &str) -> Result<RegistrationStatus> {
        let key = nft_id.parse::<InscriptionId>()?.to_string();

        if let Some(cached) = self.verdicts.get(&key) {
            debug!("Verdict for {} served from cache", key);
            return Ok(cached);
        }

        let status = self.evaluate_uncached(&key).await?;

        info!(
            "Inscription {} registered={} (H_parent={:?}, H_child={:?})",
            key,
            status.is_registered,
            status.debug.provenance.h_parent,
            status.debug.provenance.h_child
        );

        if status.is_cacheable() {
            self.verdicts.insert(key, status.clone());
        } else {
            debug!("Verdict for {} depends on a failed upstream - not cached", key);
        }
        Ok(status)
    }

    /// The provenance resolver, for direct height lookups.
    #[must_use]
    pub fn provenance(&self) -> &ProvenanceHeightResolver {
        &self.provenance
    }

    /// Verdict cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.verdicts.stats()
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &EvaluatorSettings {
        &self.settings
    }

    async fn evaluate_uncached(&self, nft_id: &str) -> Result<RegistrationStatus> {
        let mut integrity = Integrity::onchain();

        // Resolving provenance
        let parent = self
            .provenance
            .last_transfer_height(nft_id, self.inscriptions.as_ref(), self.txs.as_ref())
            .await;
        let child = self
            .provenance
            .latest_child_height(nft_id, self.inscriptions.as_ref())
            .await;

        for (name, derivation) in [("H_parent", &parent), ("H_child", &child)] {
            if let Derivation::Unavailable(reason) = derivation {
                return Err(Error::Network(format!("cannot derive {name} for {nft_id}: {reason}")));
            }
        }

        let mut state = ProvenanceState {
            h_parent: parent.height(),
            h_child: child.height(),
            fee_height: None,
            k: self.settings.fee_height_policy.window(),
        };
        integrity.check("provenance.parent_height", state.h_parent.is_some(), parent.to_string());
        integrity.check("provenance.child_height", state.h_child.is_some(), child.to_string());

        // Gate check
        let h_child = match (state.h_parent, state.h_child) {
            (Some(p), Some(c)) if p == c => {
                integrity.check("provenance.continuity", true, format!("H_parent == H_child == {c}"));
                c
            }
            (p, c) => {
                integrity.check(
                    "provenance.continuity",
                    false,
                    format!("H_parent {p:?} != H_child {c:?}"),
                );
                return Ok(unregistered(nft_id, integrity, state, 0, Vec::new()));
            }
        };

        // Collecting candidates
        let children = with_timeout(
            self.settings.fetch_timeout,
            self.inscriptions.fetch_children(nft_id),
        )
        .await?;
        let child_count = children.len();

        let mut errors = Vec::new();
        let candidates = self.collect_candidates(nft_id, &children, &mut errors).await;

        // Deduping
        let fee_txids: Vec<&str> = candidates.iter().map(|c| c.content.fee_txid.as_str()).collect();
        let unique = dedupe(&fee_txids);
        integrity.check(
            "candidates.collected",
            !unique.is_empty(),
            format!(
                "{} registration children, {} unique fee transactions",
                candidates.len(),
                unique.len()
            ),
        );
        integrity.check(
            "fee.height_policy",
            true,
            self.settings.fee_height_policy.describe(),
        );

        if unique.is_empty() {
            integrity.check("fee.payment", false, "no registration candidates");
            return Ok(unregistered(nft_id, integrity, state, child_count, errors));
        }

        let current_block = with_timeout(self.settings.fetch_timeout, self.txs.tip_height()).await?;

        // Verifying
        for fee_txid in unique.iter().map(String::as_str) {
            let Some(candidate) = candidates.iter().find(|c| c.content.fee_txid == fee_txid) else {
                continue;
            };

            match self
                .check_candidate(nft_id, h_child, current_block, fee_txid, candidate)
                .await
            {
                Ok((record, fee_height)) => {
                    state.fee_height = fee_height;
                    integrity.check(
                        "fee.payment",
                        true,
                        format!(
                            "{} paid {} sats (minimum {})",
                            record.fee_txid, record.amount, self.settings.min_fee_sats
                        ),
                    );
                    return Ok(RegistrationStatus {
                        is_registered: true,
                        last_registration: Some(record),
                        integrity,
                        debug: DebugInfo {
                            provenance: state,
                            nft_id: nft_id.to_string(),
                            child_count,
                        },
                        candidate_errors: errors,
                    });
                }
                Err((error, fee_height)) => {
                    if fee_height.is_some() {
                        state.fee_height = fee_height;
                    }
                    warn!(
                        "Registration candidate {} (fee tx {}) failed: {}",
                        error.child_id, fee_txid, error.reason
                    );
                    errors.push(error);
                }
            }
        }

        integrity.check(
            "fee.payment",
            false,
            format!(
                "none of {} fee transactions paid at least {} sats",
                unique.len(),
                self.settings.min_fee_sats
            ),
        );
        Ok(unregistered(nft_id, integrity, state, child_count, errors))
    }

    /// Registration children of `nft_id`, newest first.
    async fn collect_candidates(
        &self,
        nft_id: &str,
        children: &[ChildInscription],
        errors: &mut Vec<CandidateError>,
    ) -> Vec<Candidate> {
        let mut ordered: Vec<&ChildInscription> = children.iter().rev().collect();
        ordered.sort_by(|a, b| b.height().cmp(&a.height()));

        let mut candidates = Vec::new();
        for child in ordered {
            let body = match with_timeout(
                self.settings.fetch_timeout,
                self.inscriptions.fetch_content(&child.id),
            )
            .await
            {
                Ok(Some(body)) => body,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Fetching content of child {} failed: {}", child.id, e);
                    errors.push(CandidateError {
                        child_id: child.id.clone(),
                        fee_txid: None,
                        reason: format!("content unavailable: {e}"),
                        upstream: e.is_upstream(),
                    });
                    continue;
                }
            };

            let claimed = claims_registration(&body, nft_id);
            match serde_json::from_value::<RegistrationContent>(body) {
                Ok(mut content) if content.registers(nft_id) => {
                    // Txids compare case-insensitively
                    content.fee_txid = content.fee_txid.trim().to_ascii_lowercase();
                    candidates.push(Candidate {
                        child_id: child.id.clone(),
                        content,
                    });
                }
                Ok(_) if claimed => errors.push(CandidateError {
                    child_id: child.id.clone(),
                    fee_txid: None,
                    reason: "registration body has no feeTxid".to_string(),
                    upstream: false,
                }),
                Ok(_) => debug!("Child {} is not a registration for {}", child.id, nft_id),
                Err(e) if claimed => {
                    warn!("Registration child {} has a malformed body: {}", child.id, e);
                    errors.push(CandidateError {
                        child_id: child.id.clone(),
                        fee_txid: None,
                        reason: format!("malformed registration body: {e}"),
                        upstream: false,
                    });
                }
                Err(e) => debug!("Child {} body is not a registration: {}", child.id, e),
            }
        }
        candidates
    }

    /// Verify one candidate's fee transaction.
    async fn check_candidate(
        &self,
        nft_id: &str,
        h_child: u64,
        current_block: u64,
        fee_txid: &str,
        candidate: &Candidate,
    ) -> CandidateOutcome {
        let fail = |reason: String, upstream: bool, fee_height: Option<u64>| -> CandidateOutcome {
            Err((
                CandidateError {
                    child_id: candidate.child_id.clone(),
                    fee_txid: Some(fee_txid.to_string()),
                    reason,
                    upstream,
                },
                fee_height,
            ))
        };

        if !is_txid(fee_txid) {
            return fail("feeTxid is not a txid".to_string(), false, None);
        }

        let record = match with_timeout(self.settings.fetch_timeout, self.txs.fetch_tx(fee_txid)).await {
            Ok(Some(record)) => record,
            Ok(None) => return fail("fee transaction not found".to_string(), false, None),
            Err(e) => return fail(format!("fee transaction unavailable: {e}"), e.is_upstream(), None),
        };
        let fee_height = record.confirmed_height();
        let Some(hex) = record.hex else {
            return fail("fee transaction has no raw hex".to_string(), false, fee_height);
        };

        let mut opts = VerifyPaymentOptions::new(current_block, self.settings.network)
            .with_tx_block_height(fee_height);
        match self.settings.fee_height_policy {
            FeeHeightPolicy::AtOrAfterChild => opts = opts.with_min_block(h_child),
            FeeHeightPolicy::WithinWindow { k } => match fee_height {
                Some(h) if h <= h_child && h_child - h <= k => {}
                other => {
                    return fail(
                        format!(
                            "fee height {other:?} outside window [{}, {h_child}]",
                            h_child.saturating_sub(k)
                        ),
                        false,
                        fee_height,
                    )
                }
            },
        }

        match verify_payment(
            &hex,
            &self.settings.creator_address,
            self.settings.min_fee_sats,
            nft_id,
            &opts,
        )
        .await
        {
            Ok(0) => fail("payment did not verify".to_string(), false, fee_height),
            Ok(amount) => Ok((
                RegistrationRecord::from_content(
                    candidate.content.clone(),
                    amount,
                    Some(candidate.child_id.clone()),
                ),
                fee_height,
            )),
            Err(e) => fail(format!("verification error: {e}"), e.is_upstream(), fee_height),
        }
    }
}

fn unregistered(
    nft_id: &str,
    integrity: Integrity,
    state: ProvenanceState,
    child_count: usize,
    candidate_errors: Vec<CandidateError>,
) -> RegistrationStatus {
    RegistrationStatus {
        is_registered: false,
        last_registration: None,
        integrity,
        debug: DebugInfo {
            provenance: state,
            nft_id: nft_id.to_string(),
            child_count,
        },
        candidate_errors,
    }
}
