// adapter.rs — The adapter contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sb_model::ActionRequest;

use crate::error::AdapterError;

/// What came back from a downstream execution.
///
/// `success=false` means the downstream returned an error shape — the
/// request itself still completed, so this is data, not an `AdapterError`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdapterResult {
    pub success: bool,
    pub detail: String,
    #[serde(default)]
    pub response: Map<String, Value>,
}

impl AdapterResult {
    pub fn ok(detail: impl Into<String>, response: Map<String, Value>) -> Self {
        Self {
            success: true,
            detail: detail.into(),
            response,
        }
    }
}

/// One downstream execution surface.
///
/// `#[async_trait]` makes the trait object-safe with async methods, so the
/// registry can hold `Arc<dyn Adapter>` values.
#[async_trait]
pub trait Adapter: std::fmt::Debug + Send + Sync {
    /// The registry key this adapter answers to.
    fn name(&self) -> &str;

    /// Execute the action against the downstream system.
    async fn execute(&self, request: &ActionRequest) -> Result<AdapterResult, AdapterError>;
}
