//! Storage trait definitions.

use crate::core::session::{Category, DEFAULT_CATEGORIES, Session};
use crate::error::Result;

/// Durable table of finished sessions.
pub trait SessionStore: Send + Sync {
    /// Validate and persist a session, returning the assigned id.
    ///
    /// Any `id` already set on `session` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the record is invalid, or a persistence
    /// error if the write fails.
    fn insert_session(&self, session: &Session) -> Result<i64>;

    /// All sessions, newest date first, then newest id first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn fetch_all_sessions(&self) -> Result<Vec<Session>>;

    /// Sessions recorded on `date` (`YYYY-MM-DD`), newest id first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a malformed date, or an error if the
    /// storage operation fails.
    fn fetch_sessions_by_date(&self, date: &str) -> Result<Vec<Session>>;

    /// Delete a session. Deleting an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_session(&self, id: i64) -> Result<()>;
}

/// Durable set of user-defined category names.
pub trait CategoryRegistry: Send + Sync {
    /// Insert a trimmed name if absent. Returns `true` if a row was added.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank name, or an error if the
    /// storage operation fails.
    fn add_category(&self, name: &str) -> Result<bool>;

    /// All categories, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_categories(&self) -> Result<Vec<Category>>;

    /// Remove a category by name. Removing an unknown name is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn remove_category(&self, name: &str) -> Result<()>;
}

/// Registered categories followed by any built-in ones not already listed.
///
/// # Errors
///
/// Returns an error if the registry cannot be read.
pub fn known_categories(registry: &dyn CategoryRegistry) -> Result<Vec<String>> {
    let mut names: Vec<String> = registry
        .list_categories()?
        .into_iter()
        .map(|c| c.name)
        .collect();

    for default in DEFAULT_CATEGORIES {
        if !names.iter().any(|n| n == default) {
            names.push(default.to_string());
        }
    }
    Ok(names)
}
