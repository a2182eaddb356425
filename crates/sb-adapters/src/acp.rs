// acp.rs — Partner agent (ACP) adapter.
//
// Handles `partner:`-prefixed tools by forwarding the action to a peer
// agent endpoint. The peer answers {accepted, detail, data}.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use sb_model::ActionRequest;

use crate::adapter::{Adapter, AdapterResult};
use crate::error::AdapterError;

pub const ACP_ENDPOINT_ENV: &str = "ACP_ENDPOINT";

const DEFAULT_ACP_ENDPOINT: &str = "http://localhost:8082";
const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct AcpResponse {
    accepted: bool,
    detail: String,
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Debug)]
pub struct AcpAdapter {
    endpoint: String,
    client: reqwest::Client,
}

impl AcpAdapter {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AdapterError> {
        Ok(Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(ADAPTER_TIMEOUT)
                .build()?,
        })
    }

    pub fn from_env() -> Result<Self, AdapterError> {
        let endpoint =
            std::env::var(ACP_ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_ACP_ENDPOINT.to_string());
        Self::new(endpoint)
    }
}

#[async_trait::async_trait]
impl Adapter for AcpAdapter {
    fn name(&self) -> &str {
        "acp"
    }

    async fn execute(&self, request: &ActionRequest) -> Result<AdapterResult, AdapterError> {
        let payload = json!({
            "request_id": request.context.request_id,
            "from_agent": request.context.agent_id,
            "tool": request.tool_name,
            "action": request.tool_action,
            "arguments": request.arguments.data,
            "metadata": request.context.metadata,
        });
        let response = self
            .client
            .post(format!("{}/forward", self.endpoint.trim_end_matches('/')))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let parsed: AcpResponse =
            response
                .json()
                .await
                .map_err(|error| AdapterError::InvalidResponse {
                    adapter: "acp".to_string(),
                    reason: error.to_string(),
                })?;
        Ok(AdapterResult {
            success: parsed.accepted,
            detail: parsed.detail,
            response: parsed.data,
        })
    }
}
