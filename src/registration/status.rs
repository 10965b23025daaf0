//! The auditable verdict returned by an evaluation.

use crate::registration::record::RegistrationRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gating snapshot surfaced to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceState {
    /// Height of the parent's last transfer.
    #[serde(rename = "H_parent")]
    pub h_parent: Option<u64>,
    /// Greatest genesis height among the children.
    #[serde(rename = "H_child")]
    pub h_child: Option<u64>,
    /// Confirmation height of the deciding fee transaction.
    #[serde(rename = "feeHeight")]
    pub fee_height: Option<u64>,
    /// Fee-height window, zero when no window applies.
    #[serde(rename = "K")]
    pub k: u64,
}

impl ProvenanceState {
    /// Returns true if both heights are known and equal.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        matches!((self.h_parent, self.h_child), (Some(p), Some(c)) if p == c)
    }
}

/// Debug section of a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Heights the verdict was gated on.
    #[serde(flatten)]
    pub provenance: ProvenanceState,
    /// Evaluated inscription.
    #[serde(rename = "nftId")]
    pub nft_id: String,
    /// Children returned by the upstream, registrations or not.
    #[serde(rename = "childCount")]
    pub child_count: usize,
}

/// One named step of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityCheck {
    /// Check name.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// What was observed.
    pub detail: String,
}

/// Provenance of the verdict itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integrity {
    /// Where the evidence came from.
    pub source: String,
    /// Checks in the order they ran.
    pub checks: Vec<IntegrityCheck>,
    /// When the verdict was computed.
    pub evaluated_at: DateTime<Utc>,
}

impl Integrity {
    /// Start an on-chain integrity report.
    #[must_use]
    pub fn onchain() -> Self {
        Self {
            source: "onchain".to_string(),
            checks: Vec::new(),
            evaluated_at: Utc::now(),
        }
    }

    /// Record a check.
    pub fn check(&mut self, name: &str, passed: bool, detail: impl Into<String>) {
        self.checks.push(IntegrityCheck {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        });
    }

    /// Look up a check by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&IntegrityCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// A registration candidate that did not verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateError {
    /// Registration child the candidate came from.
    pub child_id: String,
    /// Fee transaction, when one was named.
    pub fee_txid: Option<String>,
    /// Why the candidate failed.
    pub reason: String,
    /// Set when the failure was upstream unavailability.
    pub upstream: bool,
}

/// Outcome of evaluating one inscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatus {
    /// Whether a valid registration was found.
    pub is_registered: bool,
    /// The registration that verified.
    pub last_registration: Option<RegistrationRecord>,
    /// How the verdict was reached.
    pub integrity: Integrity,
    /// Gating heights and counters.
    pub debug: DebugInfo,
    /// Candidates that were tried and failed.
    #[serde(default)]
    pub candidate_errors: Vec<CandidateError>,
}

impl RegistrationStatus {
    /// Returns true unless the verdict may flip once the upstream recovers.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.is_registered || !self.candidate_errors.iter().any(|e| e.upstream)
    }
}
