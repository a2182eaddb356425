// local.rs — Built-in policy ruleset.
//
// One evaluation pass accumulates decisions: any rule may deny (deny wins),
// any rule may demand approval (approval sticks), and the rate-limit window
// is only advanced when the request is still allowed at the end of the pass.
//
// Windows are keyed by (tenant, tool, severity). Concurrent updates to the
// same key must be serialized for the count to be correct, so the whole
// window map sits behind one mutex; the critical section never blocks on I/O.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use sb_model::{ActionRequest, ActionSeverity, PolicyDecision, RiskLevel};

use crate::config::PolicyConfig;

pub const POLICY_SEGREGATION: &str = "policy:segregation-of-duties";
pub const POLICY_P0_SENSITIVE: &str = "policy:p0-sensitive-block";
pub const POLICY_PROD_ROLE: &str = "policy:prod-role";
pub const POLICY_PII_APPROVAL: &str = "policy:pii-approval";
pub const POLICY_RATE_LIMIT: &str = "policy:rate-limit";

type WindowKey = (String, String, &'static str);

/// The local ruleset: segregation of duties, P0 handling, prod role gate,
/// PII/tag approval, and per-key sliding-window rate limits.
pub struct LocalPolicyEngine {
    config: PolicyConfig,
    windows: Mutex<HashMap<WindowKey, VecDeque<Instant>>>,
}

impl LocalPolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Classify a request. Never fails — worst case is a deny.
    pub fn evaluate(&self, request: &ActionRequest) -> PolicyDecision {
        let context = &request.context;
        let severity = context.severity;
        let roles = extract_roles(&context.metadata);
        let rate = self.config.rate_limit_for(severity.as_str());
        let now = Instant::now();

        let mut allowed = true;
        let mut requires_approval = false;
        let mut reasons: Vec<String> = Vec::new();
        let mut policy_ids: Vec<String> = Vec::new();
        let mut risk_level = if severity == ActionSeverity::P0 {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };

        let mut windows = self.windows.lock().expect("policy window lock poisoned");
        let key: WindowKey = (
            context.tenant_id.clone(),
            request.tool_name.clone(),
            severity.as_str(),
        );
        let window = windows.entry(key).or_default();
        let width = Duration::from_secs(rate.window_seconds);
        while window
            .front()
            .is_some_and(|first| now.duration_since(*first) > width)
        {
            window.pop_front();
        }

        // Segregation of duties: the requester must not also be the approver.
        if let Some(approver) = context.metadata.get("approver").and_then(Value::as_str) {
            let approver = approver.trim();
            if !approver.is_empty()
                && approver.to_lowercase() == context.principal_id.to_lowercase()
            {
                allowed = false;
                push_reason(
                    &mut reasons,
                    "Segregation of duties: requester cannot approve",
                );
                push_id(&mut policy_ids, POLICY_SEGREGATION);
            }
        }

        // P0 actions never proceed while carrying sensitivity tags.
        if severity == ActionSeverity::P0 && !context.sensitivity_tags.is_empty() {
            allowed = false;
            push_reason(&mut reasons, "p0 action with sensitive tags denied");
            push_id(&mut policy_ids, POLICY_P0_SENSITIVE);
            risk_level = RiskLevel::Critical;
        }

        // Prod scope requires the ops role.
        if context.resource_scope.as_deref() == Some("prod") && !roles.contains("ops") {
            allowed = false;
            push_reason(&mut reasons, "role=ops required for prod scope");
            push_id(&mut policy_ids, POLICY_PROD_ROLE);
        }

        // Every P0 action goes through the approval gate.
        if severity == ActionSeverity::P0 {
            requires_approval = true;
            risk_level = risk_level.max(RiskLevel::High);
            push_id(&mut policy_ids, POLICY_PII_APPROVAL);
        }

        // PII or a configured sensitivity tag also triggers approval.
        if context.pii
            || context
                .sensitivity_tags
                .iter()
                .any(|tag| self.config.is_approval_tag(tag))
        {
            requires_approval = true;
            push_id(&mut policy_ids, POLICY_PII_APPROVAL);
            if severity == ActionSeverity::P0 {
                risk_level = RiskLevel::Critical;
            }
        }

        // Rate limit last, so a denied request never consumes window capacity.
        if window.len() >= rate.limit {
            allowed = false;
            push_reason(&mut reasons, "rate limit exceeded");
            push_id(&mut policy_ids, POLICY_RATE_LIMIT);
        }

        if allowed {
            window.push_back(now);
        }
        drop(windows);

        let reason = if reasons.is_empty() {
            "allowed".to_string()
        } else {
            reasons.join("; ")
        };

        PolicyDecision {
            allowed,
            // A denied request is never queued for approval.
            requires_approval: allowed && requires_approval,
            reason,
            policy_ids,
            risk_level,
            expires_at: None,
        }
    }
}

/// Roles from `metadata.role` (string) and `metadata.roles` (list of
/// strings), lowercased and trimmed. Anything else is ignored.
fn extract_roles(metadata: &Map<String, Value>) -> HashSet<String> {
    let mut roles = HashSet::new();
    if let Some(role) = metadata.get("role").and_then(Value::as_str) {
        roles.insert(role.trim().to_lowercase());
    }
    if let Some(multi) = metadata.get("roles").and_then(Value::as_array) {
        for value in multi {
            if let Some(role) = value.as_str() {
                roles.insert(role.trim().to_lowercase());
            }
        }
    }
    roles.retain(|role| !role.is_empty());
    roles
}

fn push_id(policy_ids: &mut Vec<String>, id: &str) {
    if !policy_ids.iter().any(|existing| existing == id) {
        policy_ids.push(id.to_string());
    }
}

fn push_reason(reasons: &mut Vec<String>, reason: &str) {
    if !reasons.iter().any(|existing| existing == reason) {
        reasons.push(reason.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_model::{ActionArguments, ActionContext};
    use serde_json::json;

    struct RequestSpec {
        severity: ActionSeverity,
        tool_name: &'static str,
        pii: bool,
        tags: Vec<&'static str>,
        scope: Option<&'static str>,
        metadata: Map<String, Value>,
    }

    impl Default for RequestSpec {
        fn default() -> Self {
            let mut metadata = Map::new();
            metadata.insert("role".to_string(), json!("ops"));
            Self {
                severity: ActionSeverity::P1,
                tool_name: "jira",
                pii: false,
                tags: Vec::new(),
                scope: None,
                metadata,
            }
        }
    }

    fn build_request(spec: RequestSpec) -> ActionRequest {
        let mut context = ActionContext::new("agent", "user", "tenant")
            .unwrap()
            .with_severity(spec.severity)
            .with_pii(spec.pii)
            .with_sensitivity_tags(spec.tags.into_iter().map(str::to_string).collect())
            .with_metadata(spec.metadata);
        if let Some(scope) = spec.scope {
            context = context.with_resource_scope(scope);
        }
        ActionRequest::new(context, spec.tool_name, "create_issue", ActionArguments::default())
            .unwrap()
    }

    fn engine() -> LocalPolicyEngine {
        LocalPolicyEngine::new(PolicyConfig::default())
    }

    #[test]
    fn allows_normal_action() {
        let decision = engine().evaluate(&build_request(RequestSpec::default()));
        assert!(decision.allowed);
        assert!(!decision.requires_approval);
        assert_eq!(decision.reason, "allowed");
        assert!(decision.policy_ids.is_empty());
    }

    #[test]
    fn pii_requires_approval() {
        let decision = engine().evaluate(&build_request(RequestSpec {
            pii: true,
            tags: vec!["financial"],
            ..RequestSpec::default()
        }));
        assert!(decision.allowed);
        assert!(decision.requires_approval);
        assert!(decision.policy_ids.contains(&POLICY_PII_APPROVAL.to_string()));
    }

    #[test]
    fn approval_sticks_for_any_tag_set_when_pii() {
        // Non-empty or empty tag lists alike: pii=true alone is enough.
        for tags in [vec![], vec!["internal"], vec!["financial", "misc"]] {
            let decision = engine().evaluate(&build_request(RequestSpec {
                pii: true,
                tags,
                ..RequestSpec::default()
            }));
            assert!(decision.allowed);
            assert!(decision.requires_approval);
        }
    }

    #[test]
    fn prod_scope_requires_ops_role() {
        for role in ["analyst", "dev", "viewer", "OPS-ADJACENT"] {
            let mut metadata = Map::new();
            metadata.insert("role".to_string(), json!(role));
            let decision = engine().evaluate(&build_request(RequestSpec {
                scope: Some("prod"),
                metadata,
                ..RequestSpec::default()
            }));
            assert!(!decision.allowed, "role {role} must be denied");
            assert!(decision.policy_ids.contains(&POLICY_PROD_ROLE.to_string()));
        }
    }

    #[test]
    fn ops_in_roles_list_passes_prod_gate() {
        let mut metadata = Map::new();
        metadata.insert("roles".to_string(), json!(["dev", "ops"]));
        metadata.insert("approver".to_string(), json!("other"));
        let decision = engine().evaluate(&build_request(RequestSpec {
            scope: Some("prod"),
            metadata,
            ..RequestSpec::default()
        }));
        assert!(decision.allowed);
        assert!(!decision.requires_approval);
    }

    #[test]
    fn blocks_self_approval_case_insensitively() {
        let mut metadata = Map::new();
        metadata.insert("role".to_string(), json!("ops"));
        metadata.insert("approver".to_string(), json!("  User "));
        let decision = engine().evaluate(&build_request(RequestSpec {
            metadata,
            ..RequestSpec::default()
        }));
        assert!(!decision.allowed);
        assert!(decision
            .policy_ids
            .contains(&POLICY_SEGREGATION.to_string()));
        assert_eq!(
            decision.reason,
            "Segregation of duties: requester cannot approve"
        );
    }

    #[test]
    fn blocks_sensitive_p0_actions() {
        let decision = engine().evaluate(&build_request(RequestSpec {
            severity: ActionSeverity::P0,
            tags: vec!["secret"],
            ..RequestSpec::default()
        }));
        assert!(!decision.allowed);
        assert!(decision
            .policy_ids
            .contains(&POLICY_P0_SENSITIVE.to_string()));
        assert_eq!(decision.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn p0_requires_approval_and_then_rate_limits() {
        let engine = engine();
        let request = build_request(RequestSpec {
            severity: ActionSeverity::P0,
            ..RequestSpec::default()
        });

        let first = engine.evaluate(&request);
        assert!(first.allowed);
        assert!(first.requires_approval);
        assert!(first.policy_ids.contains(&POLICY_PII_APPROVAL.to_string()));
        assert!(first.risk_level >= RiskLevel::High);

        let second = engine.evaluate(&request);
        assert!(!second.allowed);
        assert!(second.policy_ids.contains(&POLICY_RATE_LIMIT.to_string()));
        assert_eq!(second.reason, "rate limit exceeded");
    }

    #[test]
    fn rate_limit_denies_after_capacity() {
        // Capacity-N window: N allowed requests, the (N+1)th is denied.
        let engine = engine();
        let request = build_request(RequestSpec::default());
        let limit = PolicyConfig::default().rate_limit_for("p1").limit;

        for i in 0..limit {
            let decision = engine.evaluate(&request);
            assert!(decision.allowed, "request {i} should pass");
        }
        let over = engine.evaluate(&request);
        assert!(!over.allowed);
        assert!(over.policy_ids.contains(&POLICY_RATE_LIMIT.to_string()));
    }

    #[test]
    fn windows_are_independent_per_tool() {
        let engine = engine();
        let a = build_request(RequestSpec {
            severity: ActionSeverity::P0,
            tool_name: "jira",
            ..RequestSpec::default()
        });
        let b = build_request(RequestSpec {
            severity: ActionSeverity::P0,
            tool_name: "pagerduty",
            ..RequestSpec::default()
        });
        assert!(engine.evaluate(&a).allowed);
        assert!(engine.evaluate(&b).allowed, "distinct tool key has its own window");
    }

    #[test]
    fn deny_wins_over_approval() {
        // Segregation denial plus a PII approval trigger: the deny wins and
        // the approval flag is dropped (a denied request is never queued),
        // though both rule IDs stay on the decision.
        let mut metadata = Map::new();
        metadata.insert("role".to_string(), json!("ops"));
        metadata.insert("approver".to_string(), json!("user"));
        let decision = engine().evaluate(&build_request(RequestSpec {
            pii: true,
            metadata,
            ..RequestSpec::default()
        }));
        assert!(!decision.allowed);
        assert!(!decision.requires_approval);
        assert!(decision
            .policy_ids
            .contains(&POLICY_SEGREGATION.to_string()));
        assert!(decision.policy_ids.contains(&POLICY_PII_APPROVAL.to_string()));
    }

    #[test]
    fn reasons_join_with_semicolons_deduplicated() {
        let mut metadata = Map::new();
        metadata.insert("role".to_string(), json!("analyst"));
        metadata.insert("approver".to_string(), json!("user"));
        let decision = engine().evaluate(&build_request(RequestSpec {
            scope: Some("prod"),
            metadata,
            ..RequestSpec::default()
        }));
        assert_eq!(
            decision.reason,
            "Segregation of duties: requester cannot approve; role=ops required for prod scope"
        );
        assert_eq!(
            decision.policy_ids,
            vec![
                POLICY_SEGREGATION.to_string(),
                POLICY_PROD_ROLE.to_string()
            ]
        );
    }

    #[test]
    fn denied_requests_do_not_consume_window_capacity() {
        let engine = engine();
        let mut metadata = Map::new();
        metadata.insert("role".to_string(), json!("analyst"));
        let blocked = build_request(RequestSpec {
            severity: ActionSeverity::P0,
            scope: Some("prod"),
            metadata,
            ..RequestSpec::default()
        });
        assert!(!engine.evaluate(&blocked).allowed);

        // The p0 window (limit 1) is still empty for the same (tenant, tool).
        let allowed = build_request(RequestSpec {
            severity: ActionSeverity::P0,
            ..RequestSpec::default()
        });
        assert!(engine.evaluate(&allowed).allowed);
    }
}
