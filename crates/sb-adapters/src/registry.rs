// registry.rs — Named adapter set with per-adapter dispatch locks.
//
// Downstream tool APIs frequently require ordered calls per session, so the
// router serializes dispatch per adapter key. The locks live here, created
// lazily under the registry mutex; requests to different adapters proceed
// in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::acp::AcpAdapter;
use crate::adapter::Adapter;
use crate::bedrock::BedrockAdapter;
use crate::error::AdapterError;
use crate::mcp::McpAdapter;
use crate::vertex::VertexAdapter;

/// Enablement flags for the optional cloud adapters.
pub const ENABLE_BEDROCK_ENV: &str = "SWITCHBOARD_ENABLE_BEDROCK";
pub const ENABLE_VERTEX_ENV: &str = "SWITCHBOARD_ENABLE_VERTEX";

#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default adapter set: `mcp` and `acp` always, the cloud adapters
    /// behind their enablement flags.
    pub fn from_env() -> Result<Self, AdapterError> {
        let mut registry = Self::new();
        registry.register(Arc::new(McpAdapter::from_env()?));
        registry.register(Arc::new(AcpAdapter::from_env()?));
        if env_flag(ENABLE_BEDROCK_ENV) {
            registry.register(Arc::new(BedrockAdapter::from_env()?));
        }
        if env_flag(ENABLE_VERTEX_ENV) {
            registry.register(Arc::new(VertexAdapter::from_env()?));
        }
        Ok(registry)
    }

    /// Register an adapter under its own name, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    pub fn get(&self, key: &str) -> Result<Arc<dyn Adapter>, AdapterError> {
        self.adapters
            .get(key)
            .cloned()
            .ok_or_else(|| AdapterError::NotRegistered {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.adapters.contains_key(key)
    }

    /// The dispatch lock for an adapter key, created on first use.
    ///
    /// Same key → same lock instance, so concurrent same-adapter requests
    /// serialize while different adapters overlap.
    pub fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("adapter lock map poisoned");
        Arc::clone(
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| value.to_lowercase() == "true")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterResult;
    use async_trait::async_trait;
    use sb_model::ActionRequest;

    #[derive(Debug)]
    struct StubAdapter(&'static str);

    #[async_trait]
    impl Adapter for StubAdapter {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(
            &self,
            _request: &ActionRequest,
        ) -> Result<AdapterResult, AdapterError> {
            Ok(AdapterResult::ok("stub", serde_json::Map::new()))
        }
    }

    #[test]
    fn get_unknown_key_fails() {
        let registry = AdapterRegistry::new();
        let err = registry.get("mcp").unwrap_err();
        assert!(matches!(err, AdapterError::NotRegistered { key } if key == "mcp"));
    }

    #[test]
    fn register_and_get() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(StubAdapter("mcp")));
        assert!(registry.contains("mcp"));
        assert_eq!(registry.get("mcp").unwrap().name(), "mcp");
    }

    #[test]
    fn lock_instances_are_per_key() {
        let registry = AdapterRegistry::new();
        let a1 = registry.lock_for("mcp");
        let a2 = registry.lock_for("mcp");
        let b = registry.lock_for("acp");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }
}
