// error.rs — Error types for the adapter layer.
//
// Transport errors are the adapter failing to reach its backend at all.
// A downstream *business* failure is not an error here — it comes back as
// an AdapterResult with success=false.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// No adapter registered under this key.
    #[error("no adapter registered for key '{key}'")]
    NotRegistered { key: String },

    /// The adapter could not reach its backend.
    #[error("adapter transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with something we cannot decode.
    #[error("invalid response from {adapter}: {reason}")]
    InvalidResponse { adapter: String, reason: String },

    /// The adapter is misconfigured (missing env, unsupported mode).
    #[error("adapter configuration error: {reason}")]
    Config { reason: String },
}
