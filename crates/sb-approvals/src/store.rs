// store.rs — Approval store facade.
//
// The memory backend holds pending (record, route) tuples in a map behind a
// mutex; the persistent backend delegates to the database-backed store.
// Either way the store owns a pending record exclusively until `resolve`
// hands it back to the caller.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use sb_model::{ApprovalDecision, ApprovalStatus, AuditRecord, RouteDecision};

use crate::error::ApprovalError;
use crate::persistent::PersistentApprovalStore;

/// Environment variable selecting the backend: `memory` (default) or
/// `persistent`.
pub const APPROVAL_BACKEND_ENV: &str = "SWITCHBOARD_APPROVAL_BACKEND";

/// Attach a fresh pending approval when the record has none, returning the
/// approval ID either way.
pub(crate) fn ensure_pending_approval(record: &mut AuditRecord) -> Uuid {
    record
        .approval
        .get_or_insert_with(ApprovalDecision::pending)
        .approval_id
}

enum Inner {
    Memory(tokio::sync::Mutex<HashMap<Uuid, (AuditRecord, RouteDecision)>>),
    Persistent(PersistentApprovalStore),
}

pub struct ApprovalStore {
    inner: Inner,
}

impl ApprovalStore {
    /// Single-process in-memory store.
    pub fn memory() -> Self {
        Self {
            inner: Inner::Memory(tokio::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Database-backed store shared across API instances.
    pub fn persistent(store: PersistentApprovalStore) -> Self {
        Self {
            inner: Inner::Persistent(store),
        }
    }

    /// Backend from `SWITCHBOARD_APPROVAL_BACKEND` (default `memory`).
    pub fn from_env() -> Self {
        let backend = std::env::var(APPROVAL_BACKEND_ENV)
            .map(|value| value.to_lowercase())
            .unwrap_or_else(|_| "memory".to_string());
        if backend == "persistent" {
            Self::persistent(PersistentApprovalStore::from_env())
        } else {
            Self::memory()
        }
    }

    /// Park a record pending approval; attaches the pending decision when
    /// the record has none yet.
    pub async fn create_pending(
        &self,
        record: &mut AuditRecord,
        route: &RouteDecision,
    ) -> Result<Uuid, ApprovalError> {
        match &self.inner {
            Inner::Memory(pending) => {
                let approval_id = ensure_pending_approval(record);
                pending
                    .lock()
                    .await
                    .insert(approval_id, (record.clone(), route.clone()));
                Ok(approval_id)
            }
            Inner::Persistent(store) => store.create_pending(record, route).await,
        }
    }

    /// Move a pending approval to a terminal state and hand the record
    /// back. Unknown (or already-resolved) IDs fail with `NotFound`;
    /// `Pending` is not a valid target state.
    pub async fn resolve(
        &self,
        approval_id: Uuid,
        status: ApprovalStatus,
        decided_by: &str,
        notes: Option<String>,
    ) -> Result<(AuditRecord, RouteDecision), ApprovalError> {
        if !status.is_terminal() {
            return Err(ApprovalError::InvalidTransition { status });
        }
        match &self.inner {
            Inner::Memory(pending) => {
                let (mut record, route) = pending
                    .lock()
                    .await
                    .remove(&approval_id)
                    .ok_or(ApprovalError::NotFound { approval_id })?;
                record.approval = Some(ApprovalDecision {
                    approval_id,
                    status,
                    decided_by: Some(decided_by.to_string()),
                    decided_at: Some(Utc::now()),
                    notes,
                });
                Ok((record, route))
            }
            Inner::Persistent(store) => {
                store.resolve(approval_id, status, decided_by, notes).await
            }
        }
    }

    pub async fn get(&self, approval_id: Uuid) -> Result<Option<AuditRecord>, ApprovalError> {
        match &self.inner {
            Inner::Memory(pending) => Ok(pending
                .lock()
                .await
                .get(&approval_id)
                .map(|(record, _)| record.clone())),
            Inner::Persistent(store) => store.get(approval_id).await,
        }
    }

    /// Snapshot of everything still pending.
    pub async fn pending_details(
        &self,
    ) -> Result<HashMap<Uuid, (AuditRecord, RouteDecision)>, ApprovalError> {
        match &self.inner {
            Inner::Memory(pending) => Ok(pending.lock().await.clone()),
            Inner::Persistent(store) => store.pending_details().await,
        }
    }

    /// Connect and migrate the persistent backend; no-op for memory.
    pub async fn warmup(&self) -> Result<(), ApprovalError> {
        if let Inner::Persistent(store) = &self.inner {
            store.ensure_ready().await?;
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        if let Inner::Persistent(store) = &self.inner {
            store.disconnect().await;
        }
    }
}
