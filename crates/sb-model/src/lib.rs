//! # sb-model
//!
//! Shared data model for the Switchboard action router.
//!
//! Every subsystem (policy, audit, approvals, adapters, router) speaks in
//! terms of these value types: an [`ActionRequest`] describing what an agent
//! wants to do, the [`PolicyDecision`] the policy engine produced for it,
//! the [`RouteDecision`] the router derived, and the signed [`AuditRecord`]
//! that ties all of them together.
//!
//! ## Quick Example
//!
//! ```rust
//! use sb_model::{ActionArguments, ActionContext, ActionRequest};
//!
//! let context = ActionContext::new("agent-1", "alice", "acme").unwrap();
//! let request = ActionRequest::new(
//!     context,
//!     "jira",
//!     "create_issue",
//!     ActionArguments::default(),
//! )
//! .unwrap();
//! assert_eq!(request.tool_name, "jira");
//! ```

// Module declarations — each `mod foo;` tells Rust to look for `foo.rs`
// in the same directory and include it as a submodule.
pub mod action;
pub mod decision;
pub mod error;
pub mod record;

// Re-export the main types at the crate root for convenience.
// Users can write `use sb_model::ActionRequest` instead of
// `use sb_model::action::ActionRequest`.
pub use action::{ActionArguments, ActionContext, ActionRequest, ActionSeverity};
pub use decision::{ApprovalDecision, ApprovalStatus, PolicyDecision, RiskLevel, RouteDecision};
pub use error::ModelError;
pub use record::{AuditRecord, HealthStatus};
