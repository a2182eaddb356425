// persistent.rs — Database-backed approval store.
//
// Keeps pending approvals in the `approvals` table and the full audit
// record in `audit_cache` (upserted on conflict), so multiple API instances
// can share one approvals queue. Resolution is a guarded UPDATE: only rows
// still in 'pending' transition, which makes a second resolve of the same
// ID fail instead of being observed twice.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use sb_model::{ApprovalStatus, AuditRecord, RouteDecision};

use crate::database::{Database, Dialect, Row};
use crate::error::ApprovalError;
use crate::sql;
use crate::store::ensure_pending_approval;

pub struct PersistentApprovalStore {
    database: Database,
    ready: tokio::sync::Mutex<bool>,
}

impl PersistentApprovalStore {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            ready: tokio::sync::Mutex::new(false),
        }
    }

    pub fn from_env() -> Self {
        Self::new(Database::from_env())
    }

    /// Connect and create the schema once, on first use or at warmup.
    pub async fn ensure_ready(&self) -> Result<(), ApprovalError> {
        let mut ready = self.ready.lock().await;
        if !*ready {
            self.database.connect().await?;
            self.database.ensure_schema().await?;
            *ready = true;
        }
        Ok(())
    }

    pub async fn disconnect(&self) {
        let mut ready = self.ready.lock().await;
        if *ready {
            self.database.disconnect().await;
            *ready = false;
        }
    }

    fn dialect(&self) -> Result<Dialect, ApprovalError> {
        Ok(self.database.dialect()?)
    }

    pub async fn create_pending(
        &self,
        record: &mut AuditRecord,
        route: &RouteDecision,
    ) -> Result<Uuid, ApprovalError> {
        self.ensure_ready().await?;
        let dialect = self.dialect()?;
        let approval_id = ensure_pending_approval(record);
        let now = Utc::now().to_rfc3339();

        self.database
            .execute(
                &sql::insert_approval(dialect),
                vec![
                    Some(approval_id.to_string()),
                    Some(serde_json::to_string(&record.request)?),
                    Some(serde_json::to_string(&record.policy_decision)?),
                    Some(route.target_adapter.clone()),
                    Some(ApprovalStatus::Pending.as_str().to_string()),
                    Some(now.clone()),
                    Some(now.clone()),
                ],
            )
            .await?;
        self.database
            .execute(
                &sql::upsert_audit_cache(dialect),
                vec![
                    Some(record.event_id.to_string()),
                    Some(approval_id.to_string()),
                    Some(serde_json::to_string(record)?),
                    Some(now),
                ],
            )
            .await?;
        Ok(approval_id)
    }

    pub async fn resolve(
        &self,
        approval_id: Uuid,
        status: ApprovalStatus,
        decided_by: &str,
        notes: Option<String>,
    ) -> Result<(AuditRecord, RouteDecision), ApprovalError> {
        self.ensure_ready().await?;
        let dialect = self.dialect()?;
        let decided_at = Utc::now();

        let affected = self
            .database
            .execute(
                &sql::resolve_pending_approval(dialect),
                vec![
                    Some(status.as_str().to_string()),
                    Some(decided_by.to_string()),
                    Some(decided_at.to_rfc3339()),
                    notes.clone(),
                    Some(decided_at.to_rfc3339()),
                    Some(approval_id.to_string()),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(ApprovalError::NotFound { approval_id });
        }

        let approval_row = self
            .database
            .fetch_one(
                &sql::select_approval(dialect),
                vec![Some(approval_id.to_string())],
            )
            .await?
            .ok_or(ApprovalError::NotFound { approval_id })?;
        let mut record = self
            .record_for(approval_id)
            .await?
            .ok_or(ApprovalError::NotFound { approval_id })?;

        let approval = record
            .approval
            .get_or_insert_with(sb_model::ApprovalDecision::pending);
        approval.approval_id = approval_id;
        approval.status = status;
        approval.decided_by = Some(decided_by.to_string());
        approval.decided_at = Some(decided_at);
        approval.notes = notes;

        let route = route_from_row(&record, &approval_row);
        Ok((record, route))
    }

    pub async fn get(&self, approval_id: Uuid) -> Result<Option<AuditRecord>, ApprovalError> {
        self.ensure_ready().await?;
        self.record_for(approval_id).await
    }

    pub async fn pending_details(
        &self,
    ) -> Result<HashMap<Uuid, (AuditRecord, RouteDecision)>, ApprovalError> {
        self.ensure_ready().await?;
        let dialect = self.dialect()?;
        let rows = self
            .database
            .fetch_all(
                &sql::select_pending_approvals(dialect),
                vec![Some(ApprovalStatus::Pending.as_str().to_string())],
            )
            .await?;

        let mut pending = HashMap::new();
        for row in rows {
            let Some(Some(id_text)) = row.get("approval_id").cloned() else {
                continue;
            };
            let Ok(approval_id) = id_text.parse::<Uuid>() else {
                tracing::warn!(approval_id = %id_text, "skipping malformed approval row");
                continue;
            };
            let Some(record) = self.record_for(approval_id).await? else {
                continue;
            };
            let route = route_from_row(&record, &row);
            pending.insert(approval_id, (record, route));
        }
        Ok(pending)
    }

    async fn record_for(&self, approval_id: Uuid) -> Result<Option<AuditRecord>, ApprovalError> {
        let dialect = self.dialect()?;
        let row = self
            .database
            .fetch_one(
                &sql::select_record_by_approval(dialect),
                vec![Some(approval_id.to_string())],
            )
            .await?;
        match row.and_then(|row| row.get("record_json").cloned().flatten()) {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}

fn route_from_row(record: &AuditRecord, row: &Row) -> RouteDecision {
    RouteDecision {
        context: record.request.context.clone(),
        policy: record.policy_decision.clone(),
        target_adapter: row
            .get("adapter")
            .cloned()
            .flatten()
            .unwrap_or_else(|| "mcp".to_string()),
        audit_event_id: record.event_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_model::{
        ActionArguments, ActionContext, ActionRequest, PolicyDecision, RiskLevel,
    };
    use crate::database::DatabaseConfig;

    fn build_record() -> AuditRecord {
        let context = ActionContext::new("agent", "user", "tenant").unwrap();
        let request =
            ActionRequest::new(context, "jira", "create_issue", ActionArguments::default())
                .unwrap();
        let policy = PolicyDecision {
            allowed: true,
            requires_approval: true,
            reason: "needs approval".to_string(),
            policy_ids: vec!["policy:pii-approval".to_string()],
            risk_level: RiskLevel::High,
            expires_at: None,
        };
        AuditRecord::new(request, policy)
    }

    fn route_for(record: &AuditRecord) -> RouteDecision {
        RouteDecision {
            context: record.request.context.clone(),
            policy: record.policy_decision.clone(),
            target_adapter: "mcp".to_string(),
            audit_event_id: record.event_id,
        }
    }

    fn sqlite_store(dir: &std::path::Path) -> PersistentApprovalStore {
        let url = format!("sqlite://{}", dir.join("approvals.db").display());
        PersistentApprovalStore::new(Database::new(DatabaseConfig::new(url)))
    }

    #[tokio::test]
    async fn lifecycle_create_get_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let store = sqlite_store(dir.path());
        let mut record = build_record();
        let route = route_for(&record);

        let approval_id = store.create_pending(&mut record, &route).await.unwrap();
        assert_eq!(
            record.approval.as_ref().unwrap().status,
            ApprovalStatus::Pending
        );

        let pending = store.pending_details().await.unwrap();
        assert!(pending.contains_key(&approval_id));

        let fetched = store.get(approval_id).await.unwrap().unwrap();
        assert_eq!(fetched.request.tool_name, "jira");

        let (resolved, resolved_route) = store
            .resolve(approval_id, ApprovalStatus::Approved, "reviewer", None)
            .await
            .unwrap();
        let approval = resolved.approval.unwrap();
        assert_eq!(approval.status, ApprovalStatus::Approved);
        assert_eq!(approval.decided_by.as_deref(), Some("reviewer"));
        assert_eq!(resolved_route.target_adapter, "mcp");

        assert!(store.pending_details().await.unwrap().is_empty());
        store.disconnect().await;
    }

    #[tokio::test]
    async fn second_resolve_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let store = sqlite_store(dir.path());
        let mut record = build_record();
        let route = route_for(&record);
        let approval_id = store.create_pending(&mut record, &route).await.unwrap();

        store
            .resolve(approval_id, ApprovalStatus::Approved, "reviewer", None)
            .await
            .unwrap();
        let err = store
            .resolve(approval_id, ApprovalStatus::Denied, "reviewer", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_approval_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = sqlite_store(dir.path());
        let err = store
            .resolve(Uuid::new_v4(), ApprovalStatus::Approved, "reviewer", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::NotFound { .. }));
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolution_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let approval_id = {
            let store = sqlite_store(dir.path());
            let mut record = build_record();
            let route = route_for(&record);
            let id = store.create_pending(&mut record, &route).await.unwrap();
            store.disconnect().await;
            id
        };

        let store = sqlite_store(dir.path());
        let pending = store.pending_details().await.unwrap();
        assert!(pending.contains_key(&approval_id));
        let (record, _) = store
            .resolve(approval_id, ApprovalStatus::Denied, "reviewer", Some("no".to_string()))
            .await
            .unwrap();
        assert_eq!(
            record.approval.unwrap().notes.as_deref(),
            Some("no")
        );
    }
}
