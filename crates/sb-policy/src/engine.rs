// engine.rs — Remote-first, local-fallback policy engine.
//
// Not dynamic dispatch: the engine owns both evaluators and chooses per
// call. A reachable remote evaluator wins; any failure on that path falls
// straight through to the local ruleset. No request is ever failed because
// policy was unreachable.

use sb_model::{ActionRequest, PolicyDecision};

use crate::config::PolicyConfig;
use crate::error::PolicyError;
use crate::local::LocalPolicyEngine;
use crate::remote::OpaClient;

/// Environment variable gating the remote evaluator (default on).
pub const USE_OPA_ENV: &str = "SWITCHBOARD_USE_OPA";

pub struct PolicyEngine {
    local: LocalPolicyEngine,
    remote: Option<OpaClient>,
}

impl PolicyEngine {
    /// A purely local engine with the given config.
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            local: LocalPolicyEngine::new(config),
            remote: None,
        }
    }

    /// Attach a remote evaluator consulted before the local ruleset.
    pub fn with_remote(mut self, remote: OpaClient) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Build from environment: config via `SWITCHBOARD_POLICY_CONFIG`,
    /// remote evaluator unless `SWITCHBOARD_USE_OPA=false`.
    pub fn from_env() -> Result<Self, PolicyError> {
        let mut engine = Self::new(PolicyConfig::from_env()?);
        let use_remote = std::env::var(USE_OPA_ENV)
            .map(|value| value.to_lowercase() != "false")
            .unwrap_or(true);
        if use_remote {
            engine.remote = Some(OpaClient::from_env()?);
        }
        Ok(engine)
    }

    /// Classify a request, preferring the remote evaluator when present.
    pub async fn evaluate(&self, request: &ActionRequest) -> PolicyDecision {
        if let Some(remote) = &self.remote {
            match remote.evaluate(request).await {
                Ok(decision) => return decision,
                Err(error) => {
                    tracing::debug!(
                        error = %error,
                        request_id = %request.context.request_id,
                        "remote policy unavailable, falling back to local ruleset"
                    );
                }
            }
        }
        self.local.evaluate(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_model::{ActionArguments, ActionContext};
    use serde_json::{json, Map};

    fn ops_request() -> ActionRequest {
        let mut metadata = Map::new();
        metadata.insert("role".to_string(), json!("ops"));
        let context = ActionContext::new("agent", "user", "tenant")
            .unwrap()
            .with_metadata(metadata);
        ActionRequest::new(context, "jira", "create_issue", ActionArguments::default()).unwrap()
    }

    #[tokio::test]
    async fn local_only_engine_evaluates() {
        let engine = PolicyEngine::new(PolicyConfig::default());
        let decision = engine.evaluate(&ops_request()).await;
        assert!(decision.allowed);
        assert!(!decision.requires_approval);
    }

    #[tokio::test]
    async fn unreachable_remote_falls_back_to_local() {
        // Nothing listens on this port; the connection fails immediately and
        // the local ruleset must still produce a decision.
        let remote = OpaClient::new("http://127.0.0.1:9/v1/data/switchboard/authz").unwrap();
        let engine = PolicyEngine::new(PolicyConfig::default()).with_remote(remote);
        let decision = engine.evaluate(&ops_request()).await;
        assert!(decision.allowed);
        assert_eq!(decision.reason, "allowed");
    }
}
