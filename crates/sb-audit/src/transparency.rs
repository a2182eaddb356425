// transparency.rs — Append-only transparency log client.
//
// Remote mode talks to a Rekor-style log over HTTP. When no log is
// configured the client degrades to an offline JSONL file and hands back a
// reference of the form `offline://<path>`, which verifies by file
// existence. The audit service treats every failure here as best-effort.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Environment variable naming the transparency log endpoint. Empty or
/// unset means offline mode.
pub const REKOR_URL_ENV: &str = "REKOR_URL";

const DEFAULT_OFFLINE_LOG: &str = "data/audit-log.jsonl";
const TRANSPARENCY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TransparencyError {
    /// Remote verification was requested but no endpoint is configured.
    #[error("transparency log URL is not configured")]
    NotConfigured,

    #[error("transparency log transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("transparency log returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to append offline transparency entry at {path}: {source}")]
    OfflineIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Client for the transparency log, with offline fallback.
pub struct RekorClient {
    url: Option<String>,
    offline_log: PathBuf,
    offline_lock: Mutex<()>,
    client: reqwest::Client,
}

impl RekorClient {
    /// `url: None` selects offline mode.
    pub fn new(url: Option<String>, offline_log: impl Into<PathBuf>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            url: url.filter(|value| !value.trim().is_empty()),
            offline_log: offline_log.into(),
            offline_lock: Mutex::new(()),
            client: reqwest::Client::builder()
                .timeout(TRANSPARENCY_TIMEOUT)
                .build()?,
        })
    }

    pub fn from_env() -> Result<Self, reqwest::Error> {
        Self::new(std::env::var(REKOR_URL_ENV).ok(), DEFAULT_OFFLINE_LOG)
    }

    /// Whether a remote log endpoint is configured.
    pub fn is_remote(&self) -> bool {
        self.url.is_some()
    }

    /// Append an entry, returning the remote entry identifier or an
    /// `offline://<path>` sentinel.
    pub async fn log_entry(&self, entry: &Value) -> Result<String, TransparencyError> {
        let Some(url) = &self.url else {
            self.append_offline(entry)?;
            return Ok(format!("offline://{}", self.offline_log.display()));
        };

        let response = self
            .client
            .post(format!("{}/api/v1/log/entries", url.trim_end_matches('/')))
            .json(entry)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransparencyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let document: Value = response.json().await?;
        Ok(document
            .get("uuid")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    /// Check that a reference resolves: file existence for offline
    /// references, a successful fetch for remote ones.
    pub async fn verify_entry(&self, reference: &str) -> Result<bool, TransparencyError> {
        if let Some(path) = reference.strip_prefix("offline://") {
            return Ok(Path::new(path).exists());
        }
        let url = self.url.as_ref().ok_or(TransparencyError::NotConfigured)?;
        let response = self
            .client
            .get(format!(
                "{}/api/v1/log/entries/{}",
                url.trim_end_matches('/'),
                reference
            ))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    fn append_offline(&self, entry: &Value) -> Result<(), TransparencyError> {
        let _guard = self.offline_lock.lock().expect("offline log lock poisoned");
        if let Some(parent) = self.offline_log.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| TransparencyError::OfflineIo {
                    path: self.offline_log.clone(),
                    source,
                })?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.offline_log)
            .map_err(|source| TransparencyError::OfflineIo {
                path: self.offline_log.clone(),
                source,
            })?;
        writeln!(file, "{}", entry).map_err(|source| TransparencyError::OfflineIo {
            path: self.offline_log.clone(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn offline_mode_appends_and_returns_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("transparency.jsonl");
        let client = RekorClient::new(None, &log_path).unwrap();
        assert!(!client.is_remote());

        let reference = client.log_entry(&json!({"record": 1})).await.unwrap();
        assert_eq!(reference, format!("offline://{}", log_path.display()));

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("\"record\":1"));
    }

    #[tokio::test]
    async fn offline_reference_verifies_by_file_existence() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("transparency.jsonl");
        let client = RekorClient::new(None, &log_path).unwrap();

        let reference = client.log_entry(&json!({"record": 1})).await.unwrap();
        assert!(client.verify_entry(&reference).await.unwrap());

        let missing = format!("offline://{}", dir.path().join("gone.jsonl").display());
        assert!(!client.verify_entry(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn remote_verification_without_url_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = RekorClient::new(None, dir.path().join("t.jsonl")).unwrap();
        let err = client.verify_entry("some-uuid").await.unwrap_err();
        assert!(matches!(err, TransparencyError::NotConfigured));
    }

    #[test]
    fn blank_url_means_offline() {
        let client = RekorClient::new(Some("   ".to_string()), "t.jsonl").unwrap();
        assert!(!client.is_remote());
    }
}
