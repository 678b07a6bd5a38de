use crate::prelude::*;
use auditlens_core::report::ReportDocument;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS analysis_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_identifier TEXT NOT NULL,
    analysis_timestamp TEXT NOT NULL,
    document TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS analysis_reports_identifier
    ON analysis_reports (contract_identifier);
";

/// A persisted report and its row id.
#[derive(Debug, Clone, Serialize)]
pub struct StoredReport {
    pub id: i64,
    #[serde(flatten)]
    pub document: ReportDocument,
}

/// SQLite-backed document store for vulnerability reports.
///
/// The connection is opened lazily, pinged before every use, and reopened
/// when the ping fails. Clones share the connection. The async methods run
/// the SQLite work on the blocking pool.
#[derive(Clone)]
pub struct ReportStore {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl ReportStore {
    /// Open the store at `path`, creating the database and schema if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let conn = connect(&path)?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against this store on the blocking thread pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ReportStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| Error::Store(f!("Report store task failed: {e}")))?
    }

    fn with_connection<T>(&self, op: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| Error::Store("connection lock poisoned".into()))?;

        let healthy = guard.as_ref().is_some_and(ping);
        if !healthy {
            if guard.is_some() {
                log::warn!("Report store connection lost, reconnecting to {}", self.path.display());
            }
            *guard = Some(connect(&self.path)?);
        }

        let conn = guard
            .as_ref()
            .ok_or_else(|| Error::Store("no connection".into()))?;

        op(conn).map_err(|e| Error::Store(e.to_string()).into())
    }

    fn insert_row(&self, document: &ReportDocument) -> Result<i64> {
        let json = serde_json::to_string(document)
            .map_err(|e| eyre!("Failed to serialize report: {}", e))?;

        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO analysis_reports (contract_identifier, analysis_timestamp, document)
                 VALUES (?1, ?2, ?3)",
                params![
                    document.contract_identifier,
                    document.analysis_timestamp.to_rfc3339(),
                    json
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn select_one(&self, id: i64) -> Result<Option<StoredReport>> {
        let row = self.with_connection(|conn| {
            conn.query_row(
                "SELECT id, document FROM analysis_reports WHERE id = ?1",
                params![id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
        })?;

        row.map(decode).transpose()
    }

    fn select_recent(&self, limit: usize) -> Result<Vec<StoredReport>> {
        let rows = self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, document FROM analysis_reports ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit as i64], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(decode).collect()
    }

    /// Insert a report and return its row id.
    pub async fn insert(&self, document: ReportDocument) -> Result<i64> {
        self.blocking(move |store| store.insert_row(&document)).await
    }

    /// Best-effort insert. Failures are logged and reported as `None`.
    pub async fn save(&self, document: ReportDocument) -> Option<i64> {
        let identifier = document.contract_identifier.clone();

        match self.insert(document).await {
            Ok(id) => {
                log::info!(
                    "Analysis report saved with ID: {} for identifier: {}",
                    id,
                    identifier
                );
                Some(id)
            }
            Err(e) => {
                log::error!(
                    "Error saving analysis report for identifier {}: {}",
                    identifier,
                    e
                );
                None
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<Option<StoredReport>> {
        self.blocking(move |store| store.select_one(id)).await
    }

    /// Most recent reports first.
    pub async fn list(&self, limit: usize) -> Result<Vec<StoredReport>> {
        self.blocking(move |store| store.select_recent(limit)).await
    }

    /// Liveness check used by the HTTP health endpoint.
    pub async fn is_healthy(&self) -> bool {
        self.blocking(|store| {
            store.with_connection(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
        })
        .await
        .is_ok()
    }

    /// Drop the cached connection. The next operation reconnects.
    pub fn close(&self) {
        if let Ok(mut guard) = self.conn.lock() {
            guard.take();
        }
    }
}

fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| Error::Store(f!("Failed to open {}: {e}", path.display())))?;
    conn.execute_batch(SCHEMA)
        .map_err(|e| Error::Store(f!("Failed to create schema: {e}")))?;
    Ok(conn)
}

fn ping(conn: &Connection) -> bool {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .is_ok()
}

fn decode((id, json): (i64, String)) -> Result<StoredReport> {
    let document: ReportDocument = serde_json::from_str(&json)
        .map_err(|e| eyre!("Stored report {} is corrupt: {}", id, e))?;
    Ok(StoredReport { id, document })
}
