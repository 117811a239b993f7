//! `stint delete` command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::storage::SessionStore;

use super::open_store;

/// Run the delete command.
///
/// # Errors
///
/// Returns an error if the storage backend fails.
pub fn run(config: &Config, id: i64) -> Result<()> {
    let store = open_store(config)?;
    if delete_session(store.as_ref(), id)? {
        println!("Deleted session {id}.");
    } else {
        println!("No session with id {id}.");
    }
    Ok(())
}

/// Delete `id`, reporting whether it existed.
fn delete_session(store: &dyn SessionStore, id: i64) -> Result<bool> {
    let existed = store
        .fetch_all_sessions()?
        .iter()
        .any(|s| s.id == Some(id));
    store.delete_session(id)?;
    Ok(existed)
}
