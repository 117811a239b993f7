//! `stint list` command implementation.

use crate::config::Config;
use crate::core::Session;
use crate::core::report::format_duration;
use crate::error::Result;
use crate::storage::SessionStore;

use super::open_store;

/// Maximum length for category display.
const CATEGORY_PREVIEW_LEN: usize = 24;

/// Run the list command.
///
/// Shows stored sessions, newest first, optionally for a single day.
///
/// # Errors
///
/// Returns an error if the date is malformed or the storage backend fails.
pub fn run(config: &Config, date: Option<&str>, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let sessions = load_sessions(store.as_ref(), date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions found.");
        println!("\nSessions are stored in: {}", config.storage.path.display());
        return Ok(());
    }

    println!(
        "{:>6}  {:<10}  {:<24}  {:>8}  Distractions",
        "ID", "Date", "Category", "Focused"
    );
    println!("{}", "─".repeat(70));

    for session in &sessions {
        println!("{}", format_row(session));
    }

    println!("{}", "─".repeat(70));
    println!("Showing {} session(s)", sessions.len());

    Ok(())
}

fn load_sessions(store: &dyn SessionStore, date: Option<&str>) -> Result<Vec<Session>> {
    match date {
        Some(date) => store.fetch_sessions_by_date(date),
        None => store.fetch_all_sessions(),
    }
}

fn format_row(session: &Session) -> String {
    format!(
        "{:>6}  {:<10}  {:<24}  {:>8}  {}",
        session.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
        session.date,
        format_category(&session.category),
        format_duration(u64::from(session.duration_seconds)),
        session.distraction_count
    )
}

/// Truncate long category names for the table.
fn format_category(category: &str) -> String {
    if category.chars().count() > CATEGORY_PREVIEW_LEN {
        let cut: String = category.chars().take(CATEGORY_PREVIEW_LEN - 3).collect();
        format!("{cut}...")
    } else {
        category.to_string()
    }
}
