// schemas.rs — Request/response shapes for the HTTP surface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use sb_model::{ActionRequest, ApprovalStatus, AuditRecord, PolicyDecision};

#[derive(Debug, Deserialize)]
pub struct RouteBody {
    pub request: ActionRequest,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub result: &'static str,
    pub success: bool,
    pub detail: String,
    pub adapter: String,
    pub policy: PolicyDecision,
    pub response: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
    pub approval_id: Uuid,
    pub status: ApprovalStatus,
    pub decided_by: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolicyCheckBody {
    pub request: ActionRequest,
}

#[derive(Debug, Serialize)]
pub struct PolicyCheckResponse {
    pub policy: PolicyDecision,
}

#[derive(Debug, Deserialize)]
pub struct AuditVerifyBody {
    pub record: AuditRecord,
    #[serde(default = "default_verify_rekor")]
    pub verify_rekor: bool,
}

fn default_verify_rekor() -> bool {
    true
}

/// One row of `GET /approvals/pending`.
#[derive(Debug, Serialize)]
pub struct PendingApproval {
    pub approval_id: Uuid,
    pub request: ActionRequest,
    pub policy: PolicyDecision,
    pub adapter: String,
    pub audit: AuditRecord,
}
