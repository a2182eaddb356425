//! # sb-api
//!
//! HTTP surface for the Switchboard action router.
//!
//! Thin by design: handlers deserialize, normalize, call the
//! [`sb_router::ActionRouter`], and pattern-match its outcomes into status
//! codes (200 executed, 202 pending approval, 403 blocked). The router and
//! its collaborators are created once at startup and passed in as
//! [`server::AppState`].

pub mod error;
pub mod schemas;
pub mod server;

pub use server::{app, AppState};
