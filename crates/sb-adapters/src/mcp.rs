// mcp.rs — MCP tool-server adapter.
//
// The default execution surface: forwards the action to an MCP server's
// /actions endpoint and maps its {ok, detail, data} answer into an
// AdapterResult.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use sb_model::ActionRequest;

use crate::adapter::{Adapter, AdapterResult};
use crate::error::AdapterError;

pub const MCP_SERVER_URL_ENV: &str = "MCP_SERVER_URL";

const DEFAULT_MCP_URL: &str = "http://localhost:8081";
const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct McpResponse {
    ok: bool,
    detail: String,
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Debug)]
pub struct McpAdapter {
    base_url: String,
    client: reqwest::Client,
}

impl McpAdapter {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AdapterError> {
        Ok(Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(ADAPTER_TIMEOUT)
                .build()?,
        })
    }

    pub fn from_env() -> Result<Self, AdapterError> {
        let base_url =
            std::env::var(MCP_SERVER_URL_ENV).unwrap_or_else(|_| DEFAULT_MCP_URL.to_string());
        Self::new(base_url)
    }
}

#[async_trait::async_trait]
impl Adapter for McpAdapter {
    fn name(&self) -> &str {
        "mcp"
    }

    async fn execute(&self, request: &ActionRequest) -> Result<AdapterResult, AdapterError> {
        let payload = json!({
            "request_id": request.context.request_id,
            "tool": request.tool_name,
            "action": request.tool_action,
            "arguments": request.arguments.data,
            "context": request.context,
        });
        let response = self
            .client
            .post(format!("{}/actions", self.base_url.trim_end_matches('/')))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let parsed: McpResponse =
            response
                .json()
                .await
                .map_err(|error| AdapterError::InvalidResponse {
                    adapter: "mcp".to_string(),
                    reason: error.to_string(),
                })?;
        Ok(AdapterResult {
            success: parsed.ok,
            detail: parsed.detail,
            response: parsed.data,
        })
    }
}
