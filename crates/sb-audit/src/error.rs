// error.rs — Error types for the audit subsystem.
//
// Signing failures are fatal for the request path: an unsigned record must
// never be persisted silently. Transparency failures are not errors at this
// level — the service downgrades them to an offline reference.

use std::path::PathBuf;
use thiserror::Error;

use crate::signer::SigningError;

/// Errors that can occur while recording audit entries.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The record could not be canonicalized or signed.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Failed to create or append to the local audit log.
    #[error("failed to write audit log at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to construct the transparency-log HTTP client.
    #[error("failed to build transparency client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
