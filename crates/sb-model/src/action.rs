// action.rs — Inbound request model.
//
// An ActionRequest is what an agent submits to the router: who is asking
// (ActionContext), which tool and action, and the arguments to pass through.
// Identifier fields are trimmed on construction and must be non-empty;
// deserialized payloads go through `normalize()` at the HTTP boundary so the
// router never sees an unvalidated request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ModelError;

/// Operational severity of an action, P0 being the most sensitive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionSeverity {
    P0,
    P1,
    P2,
}

impl ActionSeverity {
    /// The lowercase wire name, also used as a rate-limit config key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionSeverity::P0 => "p0",
            ActionSeverity::P1 => "p1",
            ActionSeverity::P2 => "p2",
        }
    }
}

/// Who is acting, on whose behalf, and under which tenant.
///
/// `request_id` is assigned at construction and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionContext {
    /// Assigned when the payload omits it; immutable afterwards.
    #[serde(default = "Uuid::new_v4")]
    pub request_id: Uuid,
    #[serde(default = "Utc::now")]
    pub initiated_at: DateTime<Utc>,
    pub agent_id: String,
    pub principal_id: String,
    pub tenant_id: String,
    #[serde(default = "ActionContext::default_severity")]
    pub severity: ActionSeverity,
    #[serde(default)]
    pub sensitivity_tags: Vec<String>,
    #[serde(default)]
    pub pii: bool,
    #[serde(default)]
    pub resource_scope: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ActionContext {
    fn default_severity() -> ActionSeverity {
        ActionSeverity::P1
    }

    /// Create a context with a fresh request ID and the current timestamp.
    ///
    /// Identifier arguments are trimmed; empty identifiers are rejected.
    pub fn new(
        agent_id: impl Into<String>,
        principal_id: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let mut context = Self {
            request_id: Uuid::new_v4(),
            initiated_at: Utc::now(),
            agent_id: agent_id.into(),
            principal_id: principal_id.into(),
            tenant_id: tenant_id.into(),
            severity: ActionSeverity::P1,
            sensitivity_tags: Vec::new(),
            pii: false,
            resource_scope: None,
            metadata: Map::new(),
        };
        context.normalize()?;
        Ok(context)
    }

    /// Set the severity and return self (builder pattern).
    pub fn with_severity(mut self, severity: ActionSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the sensitivity tags and return self.
    pub fn with_sensitivity_tags(mut self, tags: Vec<String>) -> Self {
        self.sensitivity_tags = tags;
        self
    }

    /// Mark the request as touching personally identifiable information.
    pub fn with_pii(mut self, pii: bool) -> Self {
        self.pii = pii;
        self
    }

    /// Set the resource scope (e.g. "prod") and return self.
    pub fn with_resource_scope(mut self, scope: impl Into<String>) -> Self {
        self.resource_scope = Some(scope.into());
        self
    }

    /// Set arbitrary metadata and return self.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Trim identifier fields in place, rejecting any that end up empty.
    ///
    /// Called from `new()` and at the HTTP boundary for deserialized payloads.
    pub fn normalize(&mut self) -> Result<(), ModelError> {
        trim_required(&mut self.agent_id, "agent_id")?;
        trim_required(&mut self.principal_id, "principal_id")?;
        trim_required(&mut self.tenant_id, "tenant_id")?;
        Ok(())
    }
}

/// Tool arguments plus the set of keys to hide from logs.
///
/// `redacted_fields` may name keys that are not present in `data`; those are
/// simply ignored. Redaction produces a new map and never mutates `data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionArguments {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub redacted_fields: Vec<String>,
}

impl ActionArguments {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            redacted_fields: Vec::new(),
        }
    }

    /// Mark the given keys as sensitive and return self.
    pub fn with_redacted_fields(mut self, fields: Vec<String>) -> Self {
        self.redacted_fields = fields;
        self
    }

    /// Return the arguments with sensitive fields replaced by `"***"`.
    pub fn redacted(&self) -> Map<String, Value> {
        let mut sanitized = Map::new();
        for (key, value) in &self.data {
            if self.redacted_fields.iter().any(|field| field == key) {
                sanitized.insert(key.clone(), Value::String("***".to_string()));
            } else {
                sanitized.insert(key.clone(), value.clone());
            }
        }
        sanitized
    }
}

/// A request to invoke `tool_name`/`tool_action` on behalf of a principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionRequest {
    pub context: ActionContext,
    pub tool_name: String,
    pub tool_action: String,
    pub arguments: ActionArguments,
}

impl ActionRequest {
    /// Create a request, trimming and validating the tool identifiers.
    pub fn new(
        context: ActionContext,
        tool_name: impl Into<String>,
        tool_action: impl Into<String>,
        arguments: ActionArguments,
    ) -> Result<Self, ModelError> {
        let mut request = Self {
            context,
            tool_name: tool_name.into(),
            tool_action: tool_action.into(),
            arguments,
        };
        request.normalize()?;
        Ok(request)
    }

    /// Trim identifier and tool fields in place, rejecting empties.
    pub fn normalize(&mut self) -> Result<(), ModelError> {
        self.context.normalize()?;
        trim_required(&mut self.tool_name, "tool_name")?;
        trim_required(&mut self.tool_action, "tool_action")?;
        Ok(())
    }
}

fn trim_required(value: &mut String, field: &'static str) -> Result<(), ModelError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyIdentifier { field });
    }
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn context_trims_identifiers() {
        let context = ActionContext::new("  agent-1  ", "alice", " acme ").unwrap();
        assert_eq!(context.agent_id, "agent-1");
        assert_eq!(context.tenant_id, "acme");
    }

    #[test]
    fn context_rejects_empty_identifier() {
        let err = ActionContext::new("agent", "   ", "acme").unwrap_err();
        assert!(matches!(
            err,
            ModelError::EmptyIdentifier {
                field: "principal_id"
            }
        ));
    }

    #[test]
    fn request_ids_are_unique() {
        let a = ActionContext::new("agent", "alice", "acme").unwrap();
        let b = ActionContext::new("agent", "alice", "acme").unwrap();
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn request_rejects_blank_tool_name() {
        let context = ActionContext::new("agent", "alice", "acme").unwrap();
        let err =
            ActionRequest::new(context, "  ", "create_issue", ActionArguments::default())
                .unwrap_err();
        assert!(matches!(
            err,
            ModelError::EmptyIdentifier { field: "tool_name" }
        ));
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&ActionSeverity::P0).unwrap();
        assert_eq!(json, "\"p0\"");
        assert_eq!(ActionSeverity::P2.as_str(), "p2");
    }

    #[test]
    fn redaction_masks_only_listed_keys() {
        let arguments = ActionArguments::new(args(&[
            ("channel", json!("#ops")),
            ("token", json!("s3cr3t")),
        ]))
        .with_redacted_fields(vec!["token".to_string(), "absent".to_string()]);

        let redacted = arguments.redacted();
        assert_eq!(redacted["channel"], json!("#ops"));
        assert_eq!(redacted["token"], json!("***"));
        assert!(!redacted.contains_key("absent"));
        // The stored data is untouched.
        assert_eq!(arguments.data["token"], json!("s3cr3t"));
    }

    #[test]
    fn redaction_preserves_non_secret_keys() {
        // For every key not named in redacted_fields the redacted view must
        // agree with the original arguments.
        let arguments = ActionArguments::new(args(&[
            ("a", json!(1)),
            ("b", json!({"nested": true})),
            ("c", json!("keep")),
            ("secret", json!("hide")),
        ]))
        .with_redacted_fields(vec!["secret".to_string()]);

        let redacted = arguments.redacted();
        for (key, value) in &arguments.data {
            if key != "secret" {
                assert_eq!(&redacted[key], value, "key {key} must be unchanged");
            }
        }
        assert_eq!(redacted["secret"], json!("***"));
    }

    #[test]
    fn normalize_roundtrips_deserialized_payload() {
        // request_id and initiated_at are filled in when omitted.
        let raw = json!({
            "context": {
                "agent_id": " agent ",
                "principal_id": "alice",
                "tenant_id": "acme"
            },
            "tool_name": "jira",
            "tool_action": "create_issue",
            "arguments": {"data": {}, "redacted_fields": []}
        });
        let mut request: ActionRequest = serde_json::from_value(raw).unwrap();
        request.normalize().unwrap();
        assert_eq!(request.context.agent_id, "agent");
        assert_eq!(request.context.severity, ActionSeverity::P1);
    }
}
