// router.rs — The action router.
//
// Flow per request: evaluate policy, persist the signed audit record, log
// the route decision with redacted arguments, then branch: blocked requests
// stop, approval-gated requests are parked in the approval store, everything
// else dispatches to its target adapter. Dispatch to the same adapter key
// is strictly serialized; different adapters proceed in parallel.
//
// The audit record always lands before any outcome is visible — a request
// that was never recorded is never acted on.

use uuid::Uuid;

use sb_adapters::{AdapterRegistry, AdapterResult};
use sb_approvals::ApprovalStore;
use sb_audit::AuditService;
use sb_model::{
    ActionRequest, ApprovalStatus, AuditRecord, PolicyDecision, RouteDecision,
};
use sb_policy::PolicyEngine;

use crate::error::RouterError;

/// Pick the adapter key for a tool name. Pure function of the prefix.
pub fn target_adapter(tool_name: &str) -> &'static str {
    if tool_name.starts_with("partner:") {
        "acp"
    } else if tool_name.starts_with("bedrock:") {
        "bedrock"
    } else if tool_name.starts_with("vertex:") {
        "vertex"
    } else {
        "mcp"
    }
}

/// How a `route()` call ended.
#[derive(Debug)]
pub enum RouteOutcome {
    /// Policy allowed the request and the adapter ran.
    Executed {
        result: AdapterResult,
        policy: PolicyDecision,
    },
    /// Policy demands a human decision; the request is parked.
    Pending {
        decision: RouteDecision,
        approval_id: Uuid,
    },
    /// Policy denied the request outright.
    Blocked { decision: RouteDecision },
}

/// How resolving a pending approval ended.
#[derive(Debug)]
pub enum ResolutionOutcome {
    Executed {
        approval_id: Uuid,
        adapter: String,
        result: AdapterResult,
    },
    Denied { approval_id: Uuid },
}

/// Process-scoped router object: owns the policy engine, audit service,
/// adapter registry, and approval store, and is passed explicitly to the
/// HTTP layer. No hidden singletons.
pub struct ActionRouter {
    policy: PolicyEngine,
    audit: AuditService,
    registry: AdapterRegistry,
    approvals: ApprovalStore,
}

impl ActionRouter {
    pub fn new(
        policy: PolicyEngine,
        audit: AuditService,
        registry: AdapterRegistry,
        approvals: ApprovalStore,
    ) -> Self {
        Self {
            policy,
            audit,
            registry,
            approvals,
        }
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub fn audit(&self) -> &AuditService {
        &self.audit
    }

    pub fn approvals(&self) -> &ApprovalStore {
        &self.approvals
    }

    /// Evaluate, record, and route one request.
    pub async fn route(&self, request: ActionRequest) -> Result<RouteOutcome, RouterError> {
        let policy = self.policy.evaluate(&request).await;
        let mut record = AuditRecord::new(request, policy.clone());
        self.audit.record(&mut record).await?;

        let decision = RouteDecision {
            context: record.request.context.clone(),
            policy: policy.clone(),
            target_adapter: target_adapter(&record.request.tool_name).to_string(),
            audit_event_id: record.event_id,
        };

        let redacted = record.request.arguments.redacted();
        tracing::info!(
            request_id = %decision.context.request_id,
            adapter = %decision.target_adapter,
            allowed = policy.allowed,
            requires_approval = policy.requires_approval,
            policy_ids = ?policy.policy_ids,
            args = %serde_json::Value::Object(redacted),
            "route_decision"
        );

        if !policy.allowed {
            return Ok(RouteOutcome::Blocked { decision });
        }

        if policy.requires_approval {
            let approval_id = self
                .approvals
                .create_pending(&mut record, &decision)
                .await?;
            return Ok(RouteOutcome::Pending {
                decision,
                approval_id,
            });
        }

        let result = self
            .execute_adapter(&decision.target_adapter, &record.request)
            .await?;
        Ok(RouteOutcome::Executed { result, policy })
    }

    /// Resolve a pending approval and, when approved, dispatch the stored
    /// request to its target adapter.
    pub async fn resolve(
        &self,
        approval_id: Uuid,
        status: ApprovalStatus,
        decided_by: &str,
        notes: Option<String>,
    ) -> Result<ResolutionOutcome, RouterError> {
        let (record, decision) = self
            .approvals
            .resolve(approval_id, status, decided_by, notes)
            .await?;

        tracing::info!(
            approval_id = %approval_id,
            status = status.as_str(),
            decided_by,
            adapter = %decision.target_adapter,
            "approval_resolved"
        );

        if status == ApprovalStatus::Denied {
            return Ok(ResolutionOutcome::Denied { approval_id });
        }

        let result = self
            .execute_adapter(&decision.target_adapter, &record.request)
            .await?;
        Ok(ResolutionOutcome::Executed {
            approval_id,
            adapter: decision.target_adapter,
            result,
        })
    }

    /// Run an adapter under its dispatch lock: same-key invocations are
    /// strictly serialized in lock-acquisition order.
    pub async fn execute_adapter(
        &self,
        key: &str,
        request: &ActionRequest,
    ) -> Result<AdapterResult, RouterError> {
        let adapter = self.registry.get(key)?;
        let lock = self.registry.lock_for(key);
        let _guard = lock.lock().await;
        Ok(adapter.execute(request).await?)
    }
}
