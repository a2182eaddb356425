// receipt.rs — Compact verification receipts.
//
// A receipt is the small, shareable summary of a verification run: which
// audit event was checked and what the outcome was. Rendered as compact
// JSON with sorted keys so two receipts for the same result compare equal
// byte-for-byte.

use serde_json::{json, Value};

use sb_model::AuditRecord;

use crate::service::AuditVerification;

/// Build a receipt document for a verified (or failed) record.
pub fn build_receipt(
    record: &AuditRecord,
    result: &AuditVerification,
    include_reference: bool,
) -> Value {
    let mut receipt = json!({
        "audit_event": record.event_id.to_string(),
        "verified": result.verified,
        "signature_valid": result.signature_valid,
        "rekor_included": result.rekor_included,
        "failure_reason": result.failure_reason,
    });
    if include_reference {
        receipt["verification_reference"] = json!(record.verification_url);
    }
    receipt
}

/// Compact JSON rendering. Object keys come out sorted because
/// `serde_json::Value` stores maps as BTreeMaps.
pub fn receipt_to_json(receipt: &Value) -> String {
    receipt.to_string()
}
