//! In-memory storage backend.

use crate::core::session::{Category, Session, normalize_category, validate_date};
use crate::error::{Error, Result};
use crate::storage::traits::{CategoryRegistry, SessionStore};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory backend for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sessions: BTreeMap<i64, Session>,
    last_session_id: i64,
    /// (insertion sequence, category)
    categories: Vec<(u64, Category)>,
    last_category_seq: u64,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.inner
            .read()
            .map_err(|_| Error::Persistence("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.inner
            .write()
            .map_err(|_| Error::Persistence("memory store lock poisoned".into()))
    }
}

/// Sort newest date first, then newest id first.
fn sort_recent_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
}

impl SessionStore for MemoryBackend {
    fn insert_session(&self, session: &Session) -> Result<i64> {
        session.validate()?;

        let mut state = self.write()?;
        state.last_session_id += 1;
        let id = state.last_session_id;
        let mut stored = session.clone();
        stored.id = Some(id);
        state.sessions.insert(id, stored);
        Ok(id)
    }

    fn fetch_all_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self.read()?.sessions.values().cloned().collect();
        sort_recent_first(&mut sessions);
        Ok(sessions)
    }

    fn fetch_sessions_by_date(&self, date: &str) -> Result<Vec<Session>> {
        validate_date(date)?;
        let mut sessions: Vec<Session> = self
            .read()?
            .sessions
            .values()
            .filter(|s| s.date == date)
            .cloned()
            .collect();
        sort_recent_first(&mut sessions);
        Ok(sessions)
    }

    fn delete_session(&self, id: i64) -> Result<()> {
        self.write()?.sessions.remove(&id);
        Ok(())
    }
}

impl CategoryRegistry for MemoryBackend {
    fn add_category(&self, name: &str) -> Result<bool> {
        let name = normalize_category(name)?;

        let mut state = self.write()?;
        if state.categories.iter().any(|(_, c)| c.name == name) {
            return Ok(false);
        }
        state.last_category_seq += 1;
        let seq = state.last_category_seq;
        state.categories.push((
            seq,
            Category {
                name: name.to_string(),
                created_at: Utc::now(),
            },
        ));
        Ok(true)
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let mut entries = self.read()?.categories.clone();
        entries.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        Ok(entries.into_iter().map(|(_, c)| c).collect())
    }

    fn remove_category(&self, name: &str) -> Result<()> {
        let name = normalize_category(name)?;
        self.write()?.categories.retain(|(_, c)| c.name != name);
        Ok(())
    }
}
