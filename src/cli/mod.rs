//! CLI command implementations.

pub mod categories;
pub mod delete;
pub mod list;
pub mod run;
pub mod stats;

use crate::config::Config;
use crate::error::Result;
use crate::storage::SqliteBackend;
use std::sync::Arc;

/// Open the process-wide session database named by `config`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn open_store(config: &Config) -> Result<Arc<SqliteBackend>> {
    Ok(Arc::new(SqliteBackend::open_in(&config.storage.path)?))
}
