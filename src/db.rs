//! Schema layer and the explicit storage handle.
//!
//! `Database` is built once at process start and passed to whatever needs
//! storage. It holds only the file location; every unit of work opens its own
//! connection through [`Database::session`] and releases it on drop.

use crate::constants::{DIAGNOSIS_TABLE, PATIENT_TABLE};
use crate::error::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const CREATE_SCHEMA_SQL: &str = include_str!("../migrations/001_create_patient_and_diagnosis.sql");
const DROP_SCHEMA_SQL: &str = include_str!("../migrations/drop_patient_and_diagnosis.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Database {
    path: Arc<PathBuf>,
}

impl Database {
    /// Create a handle for the SQLite file at `path`, creating its parent
    /// directory when missing. Opens one connection to fail early on a bad path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!(path = %path.display(), "Opening SQLite database");
        let db = Self {
            path: Arc::new(path),
        };
        db.session()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Open a fresh connection for one unit of work
    pub fn session(&self) -> Result<Connection> {
        let conn = Connection::open(self.path.as_path())?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        debug!(path = %self.path.display(), "Session opened");
        Ok(conn)
    }

    /// Create both tables and their indexes if absent. Safe to call on every start.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.session()?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(CREATE_SCHEMA_SQL)?;
        info!(
            journal_mode = %journal_mode,
            patient_table = PATIENT_TABLE,
            diagnosis_table = DIAGNOSIS_TABLE,
            "Schema ready"
        );
        Ok(())
    }

    /// Drop both tables and recreate them empty. Development use only; the
    /// server never calls this.
    pub fn reset_schema(&self) -> Result<()> {
        warn!(path = %self.path.display(), "Dropping all patient and diagnosis records");
        let mut conn = self.session()?;
        let tx = conn.transaction()?;
        tx.execute_batch(DROP_SCHEMA_SQL)?;
        tx.execute_batch(CREATE_SCHEMA_SQL)?;
        tx.commit()?;
        info!("Schema recreated");
        Ok(())
    }
}
