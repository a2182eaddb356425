// decision.rs — Policy, routing, and approval decision types.
//
// A PolicyDecision classifies a request; a RouteDecision binds that
// classification to a target adapter and an audit event; an ApprovalDecision
// tracks the human-in-the-loop gate. Approval status only ever moves
// pending → approved or pending → denied; terminal states are final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionContext;

/// Risk annotation on a policy decision, ordered by escalation.
///
/// Deriving `Ord` over the variant order lets callers express
/// "at least high" as `risk.max(RiskLevel::High)`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// The policy engine's verdict on a single request.
///
/// Invariant: `requires_approval` implies `allowed` — a denied request is
/// never queued for approval, it is blocked outright.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyDecision {
    pub allowed: bool,
    #[serde(default)]
    pub requires_approval: bool,
    pub reason: String,
    #[serde(default)]
    pub policy_ids: Vec<String>,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PolicyDecision {
    /// An unconditional allow with the given reason.
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            requires_approval: false,
            reason: reason.into(),
            policy_ids: Vec::new(),
            risk_level: RiskLevel::Medium,
            expires_at: None,
        }
    }
}

/// Where the router decided a request should go, and under which audit event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteDecision {
    pub context: ActionContext,
    pub policy: PolicyDecision,
    pub target_adapter: String,
    pub audit_event_id: Uuid,
}

/// Lifecycle state of a human approval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
}

impl ApprovalStatus {
    /// Whether this state ends the approval lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApprovalStatus::Approved | ApprovalStatus::Denied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Denied => "denied",
        }
    }
}

/// The human-in-the-loop gate attached to an audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalDecision {
    pub approval_id: Uuid,
    pub status: ApprovalStatus,
    #[serde(default)]
    pub decided_by: Option<String>,
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ApprovalDecision {
    /// A fresh pending approval with a random ID.
    pub fn pending() -> Self {
        Self {
            approval_id: Uuid::new_v4(),
            status: ApprovalStatus::Pending,
            decided_by: None,
            decided_at: None,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_orders_by_escalation() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert_eq!(RiskLevel::High.max(RiskLevel::Critical), RiskLevel::Critical);
        assert_eq!(RiskLevel::High.max(RiskLevel::Medium), RiskLevel::High);
    }

    #[test]
    fn risk_level_serializes_lowercase() {
        let json = serde_json::to_string(&RiskLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn approval_status_terminality() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Denied.is_terminal());
    }

    #[test]
    fn pending_approval_has_unique_ids() {
        let a = ApprovalDecision::pending();
        let b = ApprovalDecision::pending();
        assert_ne!(a.approval_id, b.approval_id);
        assert_eq!(a.status, ApprovalStatus::Pending);
        assert!(a.decided_by.is_none());
    }

    #[test]
    fn policy_decision_defaults_fill_on_deserialize() {
        let decision: PolicyDecision =
            serde_json::from_str(r#"{"allowed": true, "reason": "allowed"}"#).unwrap();
        assert!(!decision.requires_approval);
        assert!(decision.policy_ids.is_empty());
        assert_eq!(decision.risk_level, RiskLevel::Medium);
        assert!(decision.expires_at.is_none());
    }
}
