// error.rs — Error types for the approval store.

use thiserror::Error;
use uuid::Uuid;

use sb_model::ApprovalStatus;

/// Errors from the database seam. Dialect-specific driver errors are kept
/// behind these variants so callers never match on a driver type.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database URL has a dialect prefix we do not speak.
    #[error("unsupported database URL: {url}")]
    UnsupportedUrl { url: String },

    /// Operation attempted before `connect()`.
    #[error("database is not connected")]
    NotConnected,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A blocking sqlite task was cancelled or panicked.
    #[error("database task failed: {0}")]
    Task(String),

    /// Failed to create the directory for a sqlite database file.
    #[error("failed to prepare database path {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Errors from approval-store operations.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No pending entry under this ID — never created, or already resolved.
    #[error("approval {approval_id} not found")]
    NotFound { approval_id: Uuid },

    /// `resolve` only accepts terminal states.
    #[error("cannot transition an approval to {status:?}")]
    InvalidTransition { status: ApprovalStatus },

    /// A stored record failed to round-trip through JSON.
    #[error("stored approval payload is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
