// remote.rs — Remote policy evaluator client (OPA).
//
// The remote evaluator is consulted through a narrow query contract: POST
// the request as OPA "input", read back `result.{allow, requires_approval,
// reason, policy_ids, risk_level}`. Anything that goes wrong — transport,
// non-2xx status, missing or malformed result — is a RemotePolicyError and
// the caller falls back to the local ruleset.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

use sb_model::{ActionRequest, PolicyDecision, RiskLevel};

/// Default OPA decision endpoint.
pub const DEFAULT_OPA_URL: &str = "http://localhost:8181/v1/data/switchboard/authz";

/// Environment variable overriding the OPA endpoint.
pub const OPA_URL_ENV: &str = "OPA_URL";

const REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the remote policy path. These never fail a request — they
/// only trigger the local fallback.
#[derive(Debug, Error)]
pub enum RemotePolicyError {
    #[error("remote policy transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote policy returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote policy response is missing the result document")]
    MissingResult,
}

/// HTTP client for the remote evaluator.
pub struct OpaClient {
    url: String,
    client: reqwest::Client,
}

impl OpaClient {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            url: url.into(),
            client: reqwest::Client::builder().timeout(REMOTE_TIMEOUT).build()?,
        })
    }

    /// Construct against `OPA_URL`, defaulting to the local OPA sidecar.
    pub fn from_env() -> Result<Self, reqwest::Error> {
        let url = std::env::var(OPA_URL_ENV).unwrap_or_else(|_| DEFAULT_OPA_URL.to_string());
        Self::new(url)
    }

    /// Evaluate the request remotely. The structured response is used
    /// verbatim as the policy decision.
    pub async fn evaluate(
        &self,
        request: &ActionRequest,
    ) -> Result<PolicyDecision, RemotePolicyError> {
        let payload = json!({
            "input": {
                "context": request.context,
                "request": {
                    "tool_name": request.tool_name,
                    "tool_action": request.tool_action,
                    "arguments": request.arguments.data,
                },
                "activity": {"window_count": 0},
                "policy": {"rate_limit": 0},
            }
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemotePolicyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document: Value = response.json().await?;
        let result = document
            .get("result")
            .filter(|value| !value.is_null())
            .ok_or(RemotePolicyError::MissingResult)?;

        Ok(decision_from_result(result))
    }
}

fn decision_from_result(result: &Value) -> PolicyDecision {
    let allowed = result
        .get("allow")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let requires_approval = result
        .get("requires_approval")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let reason = result
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| if allowed { "allowed" } else { "denied" }.to_string());
    let policy_ids = result
        .get("policy_ids")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let risk_level = result
        .get("risk_level")
        .cloned()
        .and_then(|value| serde_json::from_value::<RiskLevel>(value).ok())
        .unwrap_or_default();

    PolicyDecision {
        allowed,
        requires_approval,
        reason,
        policy_ids,
        risk_level,
        expires_at: None,
    }
}
