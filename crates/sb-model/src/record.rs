// record.rs — Audit record and service health types.
//
// An AuditRecord is the canonical representation of one policy-evaluated
// request. The signature fields are attached after signing; the payload used
// as signing input always has signature, signature_algorithm, and
// verification_url set to null so verification can recover identical bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionRequest;
use crate::decision::{ApprovalDecision, PolicyDecision};

/// One signed, externally-anchored audit entry.
///
/// A request produces exactly one record on first evaluation; the same
/// record travels through the approval store when the policy requires a
/// human decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub request: ActionRequest,
    pub policy_decision: PolicyDecision,
    #[serde(default)]
    pub approval: Option<ApprovalDecision>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub signature_algorithm: Option<String>,
    #[serde(default)]
    pub verification_url: Option<String>,
}

impl AuditRecord {
    /// Create an unsigned record for a freshly evaluated request.
    pub fn new(request: ActionRequest, policy_decision: PolicyDecision) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            request,
            policy_decision,
            approval: None,
            signature: None,
            signature_algorithm: None,
            verification_url: None,
        }
    }
}

/// Liveness payload for `GET /healthz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub service: String,
    pub status: String,
    #[serde(default)]
    pub detail: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    pub fn ok(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            status: "ok".to_string(),
            detail: None,
            checked_at: Utc::now(),
        }
    }
}
