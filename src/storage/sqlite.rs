//! SQLite storage backend.
//!
//! One connection is opened when the backend is created and shared behind a
//! mutex for the life of the process. Each operation is a single statement, so
//! SQLite's own atomicity is all the isolation readers need.

use crate::core::session::{Category, Session, normalize_category, validate_date};
use crate::error::{Error, Result};
use crate::storage::traits::{CategoryRegistry, SessionStore};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OpenFlags, Row, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Database file name inside the storage directory.
pub const DB_FILE: &str = "stint.db";

const SCHEMA: &str = "BEGIN;
     CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        duration INTEGER NOT NULL,
        category TEXT NOT NULL,
        distractions INTEGER NOT NULL DEFAULT 0,
        date TEXT NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);
     CREATE TABLE IF NOT EXISTS custom_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
     );
     COMMIT;";

/// SQLite-backed session store and category registry.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Open (creating if needed) `stint.db` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created.
    pub fn open_in(dir: &Path) -> Result<Self> {
        Self::open(&dir.join(DB_FILE))
    }

    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// applied.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;

        debug!(path = %path.display(), "opened session database");
        Self::with_schema(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_schema(Connection::open_in_memory()?, None)
    }

    fn with_schema(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file, or `None` for an in-memory database.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_connection<T>(&self, op: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::Persistence("database connection lock poisoned".into()))?;
        op(&conn)
    }

    fn query_sessions(&self, sql: &str, date: Option<&str>) -> Result<Vec<Session>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = match date {
                Some(date) => stmt.query_map(params![date], session_from_row)?,
                None => stmt.query_map([], session_from_row)?,
            };
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: Some(row.get(0)?),
        duration_seconds: row.get(1)?,
        category: row.get(2)?,
        distraction_count: row.get(3)?,
        date: row.get(4)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let raw: String = row.get(1)?;
    let created_at = DateTime::parse_from_rfc3339(&raw)
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err))
        })?
        .with_timezone(&Utc);

    Ok(Category {
        name: row.get(0)?,
        created_at,
    })
}

impl SessionStore for SqliteBackend {
    fn insert_session(&self, session: &Session) -> Result<i64> {
        session.validate()?;

        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO sessions (duration, category, distractions, date) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.duration_seconds,
                    session.category,
                    session.distraction_count,
                    session.date
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn fetch_all_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions(
            "SELECT id, duration, category, distractions, date \
             FROM sessions ORDER BY date DESC, id DESC",
            None,
        )
    }

    fn fetch_sessions_by_date(&self, date: &str) -> Result<Vec<Session>> {
        validate_date(date)?;
        self.query_sessions(
            "SELECT id, duration, category, distractions, date \
             FROM sessions WHERE date = ?1 ORDER BY id DESC",
            Some(date),
        )
    }

    fn delete_session(&self, id: i64) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            Ok(())
        })
    }
}

impl CategoryRegistry for SqliteBackend {
    fn add_category(&self, name: &str) -> Result<bool> {
        let name = normalize_category(name)?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.with_connection(|conn| {
            let inserted = conn.execute(
                "INSERT INTO custom_categories (name, created_at) VALUES (?1, ?2) \
                 ON CONFLICT(name) DO NOTHING",
                params![name, created_at],
            )?;
            Ok(inserted > 0)
        })
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, created_at FROM custom_categories \
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map([], category_from_row)?;
            let mut categories = Vec::new();
            for row in rows {
                categories.push(row?);
            }
            Ok(categories)
        })
    }

    fn remove_category(&self, name: &str) -> Result<()> {
        let name = normalize_category(name)?;
        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM custom_categories WHERE name = ?1",
                params![name],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_backend() -> (SqliteBackend, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let backend = SqliteBackend::open_in(temp_dir.path()).expect("open db");
        (backend, temp_dir)
    }

    #[test]
    fn creates_database_file() {
        let (backend, temp_dir) = temp_backend();
        assert!(temp_dir.path().join(DB_FILE).exists());
        assert_eq!(backend.path(), Some(temp_dir.path().join(DB_FILE).as_path()));
    }

    #[test]
    fn schema_has_both_tables() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let tables: Vec<String> = backend
            .with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .unwrap();
        assert_eq!(tables, vec!["custom_categories", "sessions"]);
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let (store, _temp) = temp_backend();
        let session = Session::new(1500, "Study", 2, "2024-03-01");

        let id = store.insert_session(&session).unwrap();
        let all = store.fetch_all_sessions().unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, Some(id));
        assert_eq!(all[0].without_id(), session);
    }

    #[test]
    fn insert_ignores_preset_id() {
        let store = SqliteBackend::open_in_memory().unwrap();
        let mut session = Session::new(60, "Work", 0, "2024-03-01");
        session.id = Some(999);
        let id = store.insert_session(&session).unwrap();
        assert_ne!(id, 999);
    }

    #[test]
    fn insert_rejects_bad_date() {
        let store = SqliteBackend::open_in_memory().unwrap();
        let result = store.insert_session(&Session::new(60, "Work", 0, "2024/03/01"));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn fetch_all_orders_by_date_then_id() {
        let store = SqliteBackend::open_in_memory().unwrap();
        let old = store
            .insert_session(&Session::new(60, "Work", 0, "2024-02-28"))
            .unwrap();
        let first = store
            .insert_session(&Session::new(60, "Work", 0, "2024-03-01"))
            .unwrap();
        let newest_day = store
            .insert_session(&Session::new(60, "Work", 0, "2024-03-02"))
            .unwrap();
        let second = store
            .insert_session(&Session::new(60, "Work", 0, "2024-03-01"))
            .unwrap();

        let ids: Vec<i64> = store
            .fetch_all_sessions()
            .unwrap()
            .iter()
            .filter_map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![newest_day, second, first, old]);
    }

    #[test]
    fn fetch_by_date_returns_only_that_day() {
        let store = SqliteBackend::open_in_memory().unwrap();
        store
            .insert_session(&Session::new(60, "Work", 0, "2024-03-01"))
            .unwrap();
        let later = store
            .insert_session(&Session::new(120, "Study", 1, "2024-03-02"))
            .unwrap();

        let sessions = store.fetch_sessions_by_date("2024-03-02").unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, Some(later));
        assert!(store.fetch_sessions_by_date("2024-03-05").unwrap().is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let store = SqliteBackend::open_in_memory().unwrap();
        let keep = store
            .insert_session(&Session::new(60, "Work", 0, "2024-03-01"))
            .unwrap();
        let gone = store
            .insert_session(&Session::new(60, "Work", 0, "2024-03-01"))
            .unwrap();

        store.delete_session(gone).unwrap();
        store.delete_session(gone).unwrap();

        let ids: Vec<i64> = store
            .fetch_all_sessions()
            .unwrap()
            .iter()
            .filter_map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![keep]);
    }

    #[test]
    fn duplicate_category_keeps_one_row() {
        let store = SqliteBackend::open_in_memory().unwrap();
        assert!(store.add_category("Study").unwrap());
        assert!(!store.add_category("Study ").unwrap());
        let names: Vec<String> = store
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Study"]);
    }

    #[test]
    fn category_names_are_case_sensitive() {
        let store = SqliteBackend::open_in_memory().unwrap();
        store.add_category("study").unwrap();
        store.add_category("Study").unwrap();
        assert_eq!(store.list_categories().unwrap().len(), 2);
    }

    #[test]
    fn blank_category_is_rejected() {
        let store = SqliteBackend::open_in_memory().unwrap();
        assert!(matches!(
            store.add_category("   "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn categories_list_newest_first() {
        let store = SqliteBackend::open_in_memory().unwrap();
        for name in ["one", "two", "three"] {
            store.add_category(name).unwrap();
        }
        let names: Vec<String> = store
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["three", "two", "one"]);
    }

    #[test]
    fn remove_category_is_idempotent() {
        let store = SqliteBackend::open_in_memory().unwrap();
        store.add_category("Chess").unwrap();
        store.remove_category("Chess").unwrap();
        store.remove_category("Chess").unwrap();
        assert!(store.list_categories().unwrap().is_empty());
    }

    #[test]
    fn remove_category_trims_name() {
        let store = SqliteBackend::open_in_memory().unwrap();
        store.add_category("Chess").unwrap();
        store.remove_category("  Chess ").unwrap();
        assert!(store.list_categories().unwrap().is_empty());
        assert!(store.remove_category("   ").is_err());
    }

    #[test]
    fn data_survives_reopen() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        {
            let store = SqliteBackend::open_in(temp_dir.path()).unwrap();
            store
                .insert_session(&Session::new(300, "Work", 1, "2024-03-01"))
                .unwrap();
            store.add_category("Chess").unwrap();
        }

        let store = SqliteBackend::open_in(temp_dir.path()).unwrap();
        assert_eq!(store.fetch_all_sessions().unwrap().len(), 1);
        assert_eq!(store.list_categories().unwrap()[0].name, "Chess");
    }

    #[test]
    fn corrupt_timestamp_surfaces_error() {
        let store = SqliteBackend::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO custom_categories (name, created_at) VALUES ('x', 'yesterday')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        let err = store.list_categories().unwrap_err();
        assert!(err.is_persistence());
    }
}
