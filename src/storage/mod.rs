//! Storage backends for sessions and categories.

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use traits::{CategoryRegistry, SessionStore, known_categories};
