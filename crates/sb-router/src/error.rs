// error.rs — Error types for the router.
//
// Safety outcomes (blocked, pending) are not errors — they are RouteOutcome
// variants. What remains here is operational: a record that could not be
// signed or persisted, a broken approval store, or an adapter that could
// not be reached.

use thiserror::Error;

use sb_adapters::AdapterError;
use sb_approvals::ApprovalError;
use sb_audit::AuditError;

#[derive(Debug, Error)]
pub enum RouterError {
    /// The audit record could not be signed or persisted. Fatal for the
    /// request — nothing is dispatched without an audit trail.
    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
