//! # sb-router
//!
//! The switchboard core: policy → audit → approval → dispatch.
//!
//! [`ActionRouter`] glues the subsystems together. Every request is policy
//! evaluated, recorded as a signed audit entry, and then either blocked,
//! parked for human approval, or dispatched to its target adapter under a
//! per-adapter lock. Blocked and pending are ordinary outcomes
//! ([`RouteOutcome`]), not errors — only audit, storage, and adapter
//! transport failures surface as [`RouterError`].

pub mod error;
pub mod router;

pub use error::RouterError;
pub use router::{target_adapter, ActionRouter, ResolutionOutcome, RouteOutcome};
