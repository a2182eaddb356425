// database.rs — Thin async facade over SQLite and Postgres.
//
// Both dialects store the same logical shape (all TEXT columns), so the
// seam is narrow: execute / fetch with string parameters and string rows.
// SQLite calls run on the blocking pool via spawn_blocking with the
// connection behind a mutex; Postgres uses tokio-postgres with its
// connection driver spawned as a background task.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::params_from_iter;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

use crate::error::DatabaseError;

/// Environment variable carrying the database URL.
pub const DATABASE_URL_ENV: &str = "SWITCHBOARD_DATABASE_URL";

const DEFAULT_DATABASE_URL: &str = "sqlite://data/switchboard.db";

/// Which SQL dialect a URL selects. Placeholder and upsert rendering in
/// the `sql` module are the only places allowed to branch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// `SWITCHBOARD_DATABASE_URL`, defaulting to a local sqlite file.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(DATABASE_URL_ENV)
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        )
    }

    pub fn dialect(&self) -> Result<Dialect, DatabaseError> {
        if self.url.starts_with("postgres") {
            Ok(Dialect::Postgres)
        } else if self.url.starts_with("sqlite") {
            Ok(Dialect::Sqlite)
        } else {
            Err(DatabaseError::UnsupportedUrl {
                url: self.url.clone(),
            })
        }
    }

    /// The filesystem path of a sqlite URL (`sqlite://switchboard.db`,
    /// `sqlite://:memory:`).
    fn sqlite_path(&self) -> String {
        self.url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:")
            .to_string()
    }
}

/// One result row: column name → text value.
pub type Row = HashMap<String, Option<String>>;

enum Backend {
    Sqlite(Arc<Mutex<rusqlite::Connection>>),
    Postgres(tokio_postgres::Client),
}

pub struct Database {
    config: DatabaseConfig,
    backend: tokio::sync::Mutex<Option<Backend>>,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            backend: tokio::sync::Mutex::new(None),
        }
    }

    pub fn from_env() -> Self {
        Self::new(DatabaseConfig::from_env())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn dialect(&self) -> Result<Dialect, DatabaseError> {
        self.config.dialect()
    }

    pub async fn connect(&self) -> Result<(), DatabaseError> {
        let mut backend = self.backend.lock().await;
        if backend.is_some() {
            return Ok(());
        }
        *backend = Some(match self.config.dialect()? {
            Dialect::Sqlite => {
                let path = self.config.sqlite_path();
                if path != ":memory:" {
                    if let Some(parent) = Path::new(&path).parent() {
                        if !parent.as_os_str().is_empty() {
                            std::fs::create_dir_all(parent).map_err(|source| {
                                DatabaseError::Io {
                                    path: path.clone(),
                                    source,
                                }
                            })?;
                        }
                    }
                }
                let connection = tokio::task::spawn_blocking(move || {
                    let connection = rusqlite::Connection::open(path)?;
                    connection.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
                    Ok::<_, rusqlite::Error>(connection)
                })
                .await
                .map_err(|error| DatabaseError::Task(error.to_string()))??;
                Backend::Sqlite(Arc::new(Mutex::new(connection)))
            }
            Dialect::Postgres => {
                let (client, connection) =
                    tokio_postgres::connect(&self.config.url, NoTls).await?;
                tokio::spawn(async move {
                    if let Err(error) = connection.await {
                        tracing::warn!(error = %error, "postgres connection terminated");
                    }
                });
                Backend::Postgres(client)
            }
        });
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.backend.lock().await.take();
    }

    /// Run a statement, returning the number of affected rows.
    pub async fn execute(
        &self,
        sql: &str,
        params: Vec<Option<String>>,
    ) -> Result<u64, DatabaseError> {
        let backend = self.backend.lock().await;
        match backend.as_ref().ok_or(DatabaseError::NotConnected)? {
            Backend::Sqlite(connection) => {
                let connection = Arc::clone(connection);
                let sql = sql.to_string();
                let affected = tokio::task::spawn_blocking(move || {
                    let connection = connection.lock().expect("sqlite lock poisoned");
                    connection.execute(&sql, params_from_iter(params.iter()))
                })
                .await
                .map_err(|error| DatabaseError::Task(error.to_string()))??;
                Ok(affected as u64)
            }
            Backend::Postgres(client) => {
                let refs: Vec<&(dyn ToSql + Sync)> =
                    params.iter().map(|param| param as &(dyn ToSql + Sync)).collect();
                Ok(client.execute(sql, &refs).await?)
            }
        }
    }

    /// Run multiple semicolon-separated statements (schema setup).
    pub async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        let backend = self.backend.lock().await;
        match backend.as_ref().ok_or(DatabaseError::NotConnected)? {
            Backend::Sqlite(connection) => {
                let connection = Arc::clone(connection);
                let sql = sql.to_string();
                tokio::task::spawn_blocking(move || {
                    let connection = connection.lock().expect("sqlite lock poisoned");
                    connection.execute_batch(&sql)
                })
                .await
                .map_err(|error| DatabaseError::Task(error.to_string()))??;
                Ok(())
            }
            Backend::Postgres(client) => {
                client.batch_execute(sql).await?;
                Ok(())
            }
        }
    }

    pub async fn fetch_all(
        &self,
        sql: &str,
        params: Vec<Option<String>>,
    ) -> Result<Vec<Row>, DatabaseError> {
        let backend = self.backend.lock().await;
        match backend.as_ref().ok_or(DatabaseError::NotConnected)? {
            Backend::Sqlite(connection) => {
                let connection = Arc::clone(connection);
                let sql = sql.to_string();
                let rows = tokio::task::spawn_blocking(move || {
                    let connection = connection.lock().expect("sqlite lock poisoned");
                    let mut statement = connection.prepare(&sql)?;
                    let names: Vec<String> = statement
                        .column_names()
                        .iter()
                        .map(|name| name.to_string())
                        .collect();
                    let mut rows = statement.query(params_from_iter(params.iter()))?;
                    let mut out = Vec::new();
                    while let Some(row) = rows.next()? {
                        let mut record: Row = HashMap::new();
                        for (index, name) in names.iter().enumerate() {
                            record.insert(name.clone(), row.get::<_, Option<String>>(index)?);
                        }
                        out.push(record);
                    }
                    Ok::<_, rusqlite::Error>(out)
                })
                .await
                .map_err(|error| DatabaseError::Task(error.to_string()))??;
                Ok(rows)
            }
            Backend::Postgres(client) => {
                let refs: Vec<&(dyn ToSql + Sync)> =
                    params.iter().map(|param| param as &(dyn ToSql + Sync)).collect();
                let rows = client.query(sql, &refs).await?;
                let mut out = Vec::new();
                for row in rows {
                    let mut record: Row = HashMap::new();
                    for (index, column) in row.columns().iter().enumerate() {
                        record.insert(
                            column.name().to_string(),
                            row.try_get::<_, Option<String>>(index)?,
                        );
                    }
                    out.push(record);
                }
                Ok(out)
            }
        }
    }

    pub async fn fetch_one(
        &self,
        sql: &str,
        params: Vec<Option<String>>,
    ) -> Result<Option<Row>, DatabaseError> {
        Ok(self.fetch_all(sql, params).await?.into_iter().next())
    }

    /// Create the approvals schema when missing. The DDL is dialect-neutral:
    /// every column is TEXT and both engines accept IF NOT EXISTS.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.execute_batch(
            "CREATE TABLE IF NOT EXISTS approvals (
                approval_id TEXT PRIMARY KEY,
                request_json TEXT NOT NULL,
                policy_json TEXT NOT NULL,
                adapter TEXT NOT NULL,
                status TEXT NOT NULL,
                decided_by TEXT,
                decided_at TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS audit_cache (
                event_id TEXT PRIMARY KEY,
                approval_id TEXT,
                record_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_detection() {
        assert_eq!(
            DatabaseConfig::new("sqlite://data/app.db").dialect().unwrap(),
            Dialect::Sqlite
        );
        assert_eq!(
            DatabaseConfig::new("postgresql://user@host/db")
                .dialect()
                .unwrap(),
            Dialect::Postgres
        );
        assert_eq!(
            DatabaseConfig::new("postgres://user@host/db")
                .dialect()
                .unwrap(),
            Dialect::Postgres
        );
        assert!(DatabaseConfig::new("mysql://nope").dialect().is_err());
    }

    #[tokio::test]
    async fn sqlite_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let database = Database::new(DatabaseConfig::new(url));
        database.connect().await.unwrap();
        database.ensure_schema().await.unwrap();

        let affected = database
            .execute(
                "INSERT INTO audit_cache (event_id, approval_id, record_json, created_at)
                 VALUES (?, ?, ?, ?)",
                vec![
                    Some("event-1".to_string()),
                    None,
                    Some("{}".to_string()),
                    Some("2026-07-01T00:00:00Z".to_string()),
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let row = database
            .fetch_one(
                "SELECT event_id, approval_id, record_json FROM audit_cache WHERE event_id = ?",
                vec![Some("event-1".to_string())],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["event_id"].as_deref(), Some("event-1"));
        assert_eq!(row["approval_id"], None);
        assert_eq!(row["record_json"].as_deref(), Some("{}"));

        database.disconnect().await;
    }

    #[tokio::test]
    async fn queries_before_connect_fail() {
        let database = Database::new(DatabaseConfig::new("sqlite://:memory:"));
        let err = database.fetch_all("SELECT 1", Vec::new()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotConnected));
    }
}
