// bedrock.rs — AWS Bedrock AgentCore adapter.
//
// Two modes, selected by SWITCHBOARD_AWS_MODE:
// - dry-run (default): echo the arguments back as a successful mock
//   invocation, for demos and tests.
// - live: would require the AWS runtime SDK and credentials, which this
//   build does not link. Requesting it fails at construction so the
//   misconfiguration is caught at startup, not mid-request.

use serde_json::{json, Map, Value};

use sb_model::ActionRequest;

use crate::adapter::{Adapter, AdapterResult};
use crate::error::AdapterError;

pub const AWS_MODE_ENV: &str = "SWITCHBOARD_AWS_MODE";
pub const BEDROCK_AGENT_ID_ENV: &str = "AWS_BEDROCK_AGENT_ID";

const DEFAULT_AGENT_ID: &str = "bedrock-demo-agent";

#[derive(Debug)]
pub struct BedrockAdapter {
    mode: String,
    default_agent_id: String,
}

impl BedrockAdapter {
    pub fn new(mode: &str, default_agent_id: impl Into<String>) -> Result<Self, AdapterError> {
        let mode = mode.to_lowercase();
        if mode == "live" {
            return Err(AdapterError::Config {
                reason: "bedrock live mode requires the AWS agent runtime SDK and credentials; \
                         unset SWITCHBOARD_AWS_MODE to use dry-run"
                    .to_string(),
            });
        }
        Ok(Self {
            mode,
            default_agent_id: default_agent_id.into(),
        })
    }

    pub fn from_env() -> Result<Self, AdapterError> {
        let mode = std::env::var(AWS_MODE_ENV).unwrap_or_else(|_| "dry-run".to_string());
        let agent_id = std::env::var(BEDROCK_AGENT_ID_ENV)
            .unwrap_or_else(|_| DEFAULT_AGENT_ID.to_string());
        Self::new(&mode, agent_id)
    }

    fn dry_run_response(&self, request: &ActionRequest) -> Map<String, Value> {
        let agent_id = request
            .arguments
            .data
            .get("agent_id")
            .and_then(Value::as_str)
            .unwrap_or(&self.default_agent_id);
        let mut response = Map::new();
        response.insert("echo".to_string(), Value::Object(request.arguments.data.clone()));
        response.insert("agent_id".to_string(), json!(agent_id));
        response.insert("mode".to_string(), json!(self.mode));
        response
    }
}

#[async_trait::async_trait]
impl Adapter for BedrockAdapter {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn execute(&self, request: &ActionRequest) -> Result<AdapterResult, AdapterError> {
        Ok(AdapterResult::ok(
            "bedrock dry-run",
            self.dry_run_response(request),
        ))
    }
}
