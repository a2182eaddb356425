//! # sb-adapters
//!
//! Downstream execution adapters for the Switchboard action router.
//!
//! An [`Adapter`] executes an approved action against an external system —
//! an MCP tool server, a partner agent endpoint, or a cloud agent runtime.
//! The router treats adapters as opaque handlers behind a single `execute`
//! method; the [`AdapterRegistry`] maps adapter keys (`mcp`, `acp`,
//! `bedrock`, `vertex`) to implementations and hands out the per-adapter
//! locks that serialize same-adapter dispatch.

pub mod acp;
pub mod adapter;
pub mod bedrock;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod vertex;

pub use acp::AcpAdapter;
pub use adapter::{Adapter, AdapterResult};
pub use bedrock::BedrockAdapter;
pub use error::AdapterError;
pub use mcp::McpAdapter;
pub use registry::AdapterRegistry;
pub use vertex::VertexAdapter;
