//! # sb-policy
//!
//! Policy evaluation for the Switchboard action router.
//!
//! Every inbound [`sb_model::ActionRequest`] is classified as
//! allow / deny / requires-approval before anything is dispatched. The
//! [`PolicyEngine`] consults a remote evaluator (OPA) when one is configured
//! and falls back to the built-in [`LocalPolicyEngine`] ruleset on any
//! transport or decode failure — availability always wins over the remote
//! evaluator, and the local ruleset is the source of truth for the safety
//! properties (segregation of duties, prod role gate, P0 handling, rate
//! limits).

pub mod config;
pub mod engine;
pub mod error;
pub mod local;
pub mod remote;

pub use config::{PolicyConfig, RateLimit};
pub use engine::PolicyEngine;
pub use error::PolicyError;
pub use local::LocalPolicyEngine;
pub use remote::{OpaClient, RemotePolicyError};
