// sql.rs — Dialect-aware query text.
//
// The only differences between the SQLite and Postgres flavors of the
// approvals schema are placeholder syntax (`?` vs `$n`) and the upsert
// clause. Every query the persistent store runs is rendered here so the
// business code never branches on dialect.

use crate::database::Dialect;

/// `?, ?, ?` or `$1, $2, $3`.
fn placeholders(dialect: Dialect, count: usize) -> String {
    match dialect {
        Dialect::Sqlite => vec!["?"; count].join(", "),
        Dialect::Postgres => (1..=count)
            .map(|index| format!("${index}"))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// A single positional placeholder (1-based position for Postgres).
fn placeholder(dialect: Dialect, position: usize) -> String {
    match dialect {
        Dialect::Sqlite => "?".to_string(),
        Dialect::Postgres => format!("${position}"),
    }
}

pub fn insert_approval(dialect: Dialect) -> String {
    format!(
        "INSERT INTO approvals (
            approval_id, request_json, policy_json, adapter, status,
            created_at, updated_at
        ) VALUES ({})",
        placeholders(dialect, 7)
    )
}

pub fn upsert_audit_cache(dialect: Dialect) -> String {
    match dialect {
        Dialect::Sqlite => format!(
            "INSERT OR REPLACE INTO audit_cache (event_id, approval_id, record_json, created_at)
             VALUES ({})",
            placeholders(dialect, 4)
        ),
        Dialect::Postgres => format!(
            "INSERT INTO audit_cache (event_id, approval_id, record_json, created_at)
             VALUES ({})
             ON CONFLICT (event_id) DO UPDATE SET
                approval_id = EXCLUDED.approval_id,
                record_json = EXCLUDED.record_json,
                created_at = EXCLUDED.created_at",
            placeholders(dialect, 4)
        ),
    }
}

/// Resolves a pending approval. The `status = 'pending'` guard makes the
/// transition single-shot: a second resolve affects zero rows.
pub fn resolve_pending_approval(dialect: Dialect) -> String {
    format!(
        "UPDATE approvals
         SET status = {}, decided_by = {}, decided_at = {}, notes = {}, updated_at = {}
         WHERE approval_id = {} AND status = 'pending'",
        placeholder(dialect, 1),
        placeholder(dialect, 2),
        placeholder(dialect, 3),
        placeholder(dialect, 4),
        placeholder(dialect, 5),
        placeholder(dialect, 6),
    )
}

pub fn select_approval(dialect: Dialect) -> String {
    format!(
        "SELECT request_json, policy_json, adapter FROM approvals WHERE approval_id = {}",
        placeholder(dialect, 1)
    )
}

pub fn select_record_by_approval(dialect: Dialect) -> String {
    format!(
        "SELECT record_json FROM audit_cache WHERE approval_id = {}",
        placeholder(dialect, 1)
    )
}

pub fn select_pending_approvals(dialect: Dialect) -> String {
    format!(
        "SELECT approval_id, adapter FROM approvals WHERE status = {}",
        placeholder(dialect, 1)
    )
}
