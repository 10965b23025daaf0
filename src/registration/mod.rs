//! Registration verdicts for membership inscriptions.
//!
//! # Evaluation
//!
//! ```text
//! evaluate(nftId)
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ Check verdict cache │──── HIT ───▶ cached verdict
//! └─────────┬───────────┘
//!          MISS
//!           ▼
//!   resolve H_parent, H_child ──── upstream down ───▶ Err (not cached)
//!           │
//!           ▼
//!   H_parent == H_child ? ──── no ───▶ UNREGISTERED
//!           │
//!           ▼
//!   collect buyer_registration.v1 children, dedupe fee txids
//!           │
//!           ▼
//!   verify each fee tx in turn ──── first >= minFee ───▶ REGISTERED
//!           │
//!           ▼
//!      UNREGISTERED
//! ```

mod evaluator;
mod record;
mod status;

pub use evaluator::{EvaluatorSettings, RegistrationEvaluator};
pub use record::{claims_registration, RegistrationContent, RegistrationRecord, REGISTRATION_SCHEMA};
pub use status::{
    CandidateError, DebugInfo, Integrity, IntegrityCheck, ProvenanceState, RegistrationStatus,
};
