//! # sb-audit
//!
//! Signed audit trail for the Switchboard action router.
//!
//! Every policy-evaluated request is recorded as an [`sb_model::AuditRecord`]
//! in a JSONL (JSON Lines) log file. Each entry carries an HMAC-SHA256
//! signature over a deterministic canonical encoding of the record, and a
//! reference into an append-only transparency log (or an offline sentinel
//! when no log is reachable).
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use sb_audit::{AuditService, AuditSigner, RekorClient};
//!
//! # async fn demo(mut record: sb_model::AuditRecord) {
//! let service = AuditService::from_env().unwrap();
//! service.record(&mut record).await.unwrap();
//! let result = service.verify(&record, false).await;
//! assert!(result.signature_valid);
//! # }
//! ```

pub mod error;
pub mod receipt;
pub mod service;
pub mod signer;
pub mod transparency;

pub use error::AuditError;
pub use receipt::{build_receipt, receipt_to_json};
pub use service::{AuditService, AuditVerification, OFFLINE_REFERENCE};
pub use signer::{AuditSignature, AuditSigner, SigningError};
pub use transparency::{RekorClient, TransparencyError};
