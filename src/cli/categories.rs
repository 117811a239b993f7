//! `stint categories` command implementation.

use crate::config::Config;
use crate::core::session::{is_default_category, normalize_category};
use crate::error::Result;
use crate::storage::{CategoryRegistry, known_categories};
use clap::Subcommand;

/// Category subcommands.
#[derive(Debug, Subcommand)]
pub enum CategoryAction {
    /// Register a custom category.
    Add {
        /// Category name.
        name: String,
    },

    /// List built-in and custom categories.
    List,

    /// Remove a custom category. Past sessions keep their category.
    Remove {
        /// Category name.
        name: String,
    },
}

/// Run a category subcommand.
///
/// # Errors
///
/// Returns an error if the name is blank or the storage backend fails.
pub fn run(config: &Config, action: &CategoryAction) -> Result<()> {
    let store = super::open_store(config)?;
    let message = apply(store.as_ref(), action)?;
    println!("{message}");
    Ok(())
}

fn apply(registry: &dyn CategoryRegistry, action: &CategoryAction) -> Result<String> {
    match action {
        CategoryAction::Add { name } => {
            let name = normalize_category(name)?;
            if is_default_category(name) {
                return Ok(format!("{name} is a built-in category."));
            }
            if registry.add_category(name)? {
                Ok(format!("Added category {name}."))
            } else {
                Ok(format!("Category {name} already exists."))
            }
        }
        CategoryAction::List => Ok(known_categories(registry)?.join("\n")),
        CategoryAction::Remove { name } => {
            let name = normalize_category(name)?;
            if is_default_category(name) {
                return Ok(format!("{name} is a built-in category and cannot be removed."));
            }
            registry.remove_category(name)?;
            Ok(format!("Removed category {name}."))
        }
    }
}
