// vertex.rs — Google Vertex AI Agent Engine adapter.
//
// Mirrors the bedrock adapter's mode split: dry-run (default) echoes the
// arguments, live mode needs Google application-default credentials this
// build does not resolve, so requesting it fails at construction. Live mode
// additionally insists on GOOGLE_CLOUD_PROJECT and VERTEX_AGENT_ID being
// set, matching what a real invocation would need.

use serde_json::{json, Map, Value};

use sb_model::ActionRequest;

use crate::adapter::{Adapter, AdapterResult};
use crate::error::AdapterError;

pub const GCP_MODE_ENV: &str = "SWITCHBOARD_GCP_MODE";
pub const GCP_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
pub const VERTEX_AGENT_ENV: &str = "VERTEX_AGENT_ID";

#[derive(Debug)]
pub struct VertexAdapter {
    mode: String,
    project: Option<String>,
    agent: Option<String>,
}

impl VertexAdapter {
    pub fn new(
        mode: &str,
        project: Option<String>,
        agent: Option<String>,
    ) -> Result<Self, AdapterError> {
        let mode = mode.to_lowercase();
        if mode == "live" {
            if project.is_none() || agent.is_none() {
                return Err(AdapterError::Config {
                    reason: "vertex live mode requires GOOGLE_CLOUD_PROJECT and VERTEX_AGENT_ID"
                        .to_string(),
                });
            }
            return Err(AdapterError::Config {
                reason: "vertex live mode requires Google application-default credentials; \
                         unset SWITCHBOARD_GCP_MODE to use dry-run"
                    .to_string(),
            });
        }
        Ok(Self {
            mode,
            project,
            agent,
        })
    }

    pub fn from_env() -> Result<Self, AdapterError> {
        let mode = std::env::var(GCP_MODE_ENV).unwrap_or_else(|_| "dry-run".to_string());
        Self::new(
            &mode,
            std::env::var(GCP_PROJECT_ENV).ok(),
            std::env::var(VERTEX_AGENT_ENV).ok(),
        )
    }

    fn dry_run_response(&self, request: &ActionRequest) -> Map<String, Value> {
        let agent = request
            .arguments
            .data
            .get("agent")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.agent.clone());
        let mut response = Map::new();
        response.insert("echo".to_string(), Value::Object(request.arguments.data.clone()));
        response.insert(
            "project".to_string(),
            json!(self.project.as_deref().unwrap_or("vertex-demo")),
        );
        response.insert("agent".to_string(), json!(agent));
        response.insert("mode".to_string(), json!(self.mode));
        response
    }
}

#[async_trait::async_trait]
impl Adapter for VertexAdapter {
    fn name(&self) -> &str {
        "vertex"
    }

    async fn execute(&self, request: &ActionRequest) -> Result<AdapterResult, AdapterError> {
        Ok(AdapterResult::ok(
            "vertex dry-run",
            self.dry_run_response(request),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_model::{ActionArguments, ActionContext};

    fn build_request() -> ActionRequest {
        let context = ActionContext::new("agent", "user", "tenant").unwrap();
        let mut data = Map::new();
        data.insert("input_text".to_string(), json!("hey"));
        ActionRequest::new(context, "vertex:demo", "invoke", ActionArguments::new(data)).unwrap()
    }

    #[test]
    fn live_mode_without_project_names_the_missing_vars() {
        let err = VertexAdapter::new("live", None, None).unwrap_err();
        let AdapterError::Config { reason } = err else {
            panic!("expected a config error");
        };
        assert!(reason.contains("GOOGLE_CLOUD_PROJECT"));
    }

    #[test]
    fn live_mode_is_unsupported_even_when_configured() {
        let err = VertexAdapter::new(
            "live",
            Some("proj".to_string()),
            Some("agent-1".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::Config { .. }));
    }

    #[tokio::test]
    async fn dry_run_succeeds() {
        let adapter = VertexAdapter::new("dry-run", None, None).unwrap();
        let result = adapter.execute(&build_request()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.response["mode"], json!("dry-run"));
        assert_eq!(result.response["project"], json!("vertex-demo"));
        assert_eq!(result.response["echo"]["input_text"], json!("hey"));
    }
}
