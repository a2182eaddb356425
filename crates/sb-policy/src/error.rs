// error.rs — Error types for the policy subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading policy configuration or wiring the
/// remote evaluator. Evaluation itself never fails — the engine always
/// produces a decision.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Failed to read the policy config file.
    #[error("failed to read policy config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The policy config file is not valid YAML (or has the wrong shape).
    #[error("failed to parse policy config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// The config must always carry a `default` rate limit to fall back on.
    #[error("policy config at {path} is missing the 'default' rate limit")]
    MissingDefaultRateLimit { path: PathBuf },

    /// Failed to construct the HTTP client for the remote evaluator.
    #[error("failed to build remote policy client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
