// service.rs — Sign, anchor, and persist audit records.
//
// Record path: build the canonical payload (signature fields nulled), sign
// it, submit the signed entry to the transparency log, and append
// {signature, algorithm, record, verification_reference} to the local JSONL
// file. The file is append-only and never rewritten; a transparency failure
// downgrades the reference to the "offline" sentinel instead of failing the
// request.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::{json, Value};

use sb_model::AuditRecord;

use crate::error::AuditError;
use crate::signer::{AuditSigner, SigningError};
use crate::transparency::RekorClient;

/// Sentinel reference recorded when the transparency log was unreachable.
pub const OFFLINE_REFERENCE: &str = "offline";

const DEFAULT_OUTPUT_PATH: &str = "data/audit-log.jsonl";

const MISSING_SIGNATURE_REASON: &str = "Audit record is missing signature metadata";
const SIGNATURE_MISMATCH_REASON: &str = "Signature does not match the canonical payload";
const MISSING_REFERENCE_REASON: &str = "Audit record has no transparency log reference";
const NOT_INCLUDED_REASON: &str = "Transparency log entry not found";
const LOOKUP_FAILED_REASON: &str = "Transparency log lookup failed";

/// Outcome of verifying an audit record.
///
/// `verified` is true iff the signature is valid, the inclusion check did
/// not come back negative, and no failure reason was recorded.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditVerification {
    pub verified: bool,
    pub signature_valid: bool,
    pub rekor_included: Option<bool>,
    pub failure_reason: Option<String>,
}

impl AuditVerification {
    fn conclude(
        signature_valid: bool,
        rekor_included: Option<bool>,
        failure_reason: Option<String>,
    ) -> Self {
        let verified =
            signature_valid && rekor_included != Some(false) && failure_reason.is_none();
        Self {
            verified,
            signature_valid,
            rekor_included,
            failure_reason,
        }
    }
}

/// Records signed audit entries and verifies them later.
pub struct AuditService {
    signer: AuditSigner,
    rekor: RekorClient,
    output_path: PathBuf,
    log_lock: Mutex<()>,
}

impl AuditService {
    pub fn new(
        signer: AuditSigner,
        rekor: RekorClient,
        output_path: impl Into<PathBuf>,
    ) -> Result<Self, AuditError> {
        let output_path = output_path.into();
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| AuditError::Io {
                    path: output_path.clone(),
                    source,
                })?;
            }
        }
        Ok(Self {
            signer,
            rekor,
            output_path,
            log_lock: Mutex::new(()),
        })
    }

    pub fn from_env() -> Result<Self, AuditError> {
        Self::new(
            AuditSigner::from_env(),
            RekorClient::from_env()?,
            DEFAULT_OUTPUT_PATH,
        )
    }

    /// Sign the record, anchor it, append it to the local log, and fill in
    /// the signature and verification fields.
    pub async fn record(&self, record: &mut AuditRecord) -> Result<(), AuditError> {
        let canonical = Self::canonical_payload(record)?;
        let signature = self.signer.sign(&canonical)?;
        record.signature = Some(signature.signature.clone());
        record.signature_algorithm = Some(signature.algorithm.clone());

        let mut entry = json!({
            "signature": signature.signature,
            "algorithm": signature.algorithm,
            "record": canonical,
        });
        let reference = match self.rekor.log_entry(&entry).await {
            Ok(reference) => reference,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    event_id = %record.event_id,
                    "transparency log unavailable, recording offline reference"
                );
                OFFLINE_REFERENCE.to_string()
            }
        };
        entry["verification_reference"] = json!(reference);
        self.append_line(&entry)?;

        record.verification_url = Some(reference);
        Ok(())
    }

    /// The deterministic signing input: the record as a JSON value with
    /// `signature`, `signature_algorithm`, and `verification_url` nulled.
    pub fn canonical_payload(record: &AuditRecord) -> Result<Value, SigningError> {
        let mut payload = serde_json::to_value(record)?;
        payload["signature"] = Value::Null;
        payload["signature_algorithm"] = Value::Null;
        payload["verification_url"] = Value::Null;
        Ok(payload)
    }

    /// Check signature validity and, when `verify_rekor` is set,
    /// transparency-log inclusion.
    pub async fn verify(&self, record: &AuditRecord, verify_rekor: bool) -> AuditVerification {
        let (Some(signature), Some(_algorithm)) =
            (&record.signature, &record.signature_algorithm)
        else {
            return AuditVerification::conclude(
                false,
                None,
                Some(MISSING_SIGNATURE_REASON.to_string()),
            );
        };

        let mut failure_reason = None;
        let signature_valid = match Self::canonical_payload(record)
            .and_then(|canonical| self.signer.verify(&canonical, signature))
        {
            Ok(valid) => valid,
            Err(error) => {
                failure_reason = Some(error.to_string());
                false
            }
        };
        if !signature_valid && failure_reason.is_none() {
            failure_reason = Some(SIGNATURE_MISMATCH_REASON.to_string());
        }

        let rekor_included = if verify_rekor {
            Some(self.check_inclusion(record, &mut failure_reason).await)
        } else {
            None
        };

        AuditVerification::conclude(signature_valid, rekor_included, failure_reason)
    }

    async fn check_inclusion(
        &self,
        record: &AuditRecord,
        failure_reason: &mut Option<String>,
    ) -> bool {
        let reference = match record.verification_url.as_deref() {
            None | Some(OFFLINE_REFERENCE) => {
                if failure_reason.is_none() {
                    *failure_reason = Some(MISSING_REFERENCE_REASON.to_string());
                }
                return false;
            }
            Some(reference) => reference,
        };
        match self.rekor.verify_entry(reference).await {
            Ok(true) => true,
            Ok(false) => {
                if failure_reason.is_none() {
                    *failure_reason = Some(NOT_INCLUDED_REASON.to_string());
                }
                false
            }
            Err(error) => {
                tracing::warn!(error = %error, "transparency inclusion check failed");
                if failure_reason.is_none() {
                    *failure_reason = Some(LOOKUP_FAILED_REASON.to_string());
                }
                false
            }
        }
    }

    fn append_line(&self, entry: &Value) -> Result<(), AuditError> {
        let _guard = self.log_lock.lock().expect("audit log lock poisoned");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)
            .map_err(|source| AuditError::Io {
                path: self.output_path.clone(),
                source,
            })?;
        writeln!(file, "{}", entry).map_err(|source| AuditError::Io {
            path: self.output_path.clone(),
            source,
        })
    }
}
