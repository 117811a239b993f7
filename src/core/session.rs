//! Persisted record types.

use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Categories offered without being registered.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Study", "Work", "Sport", "Other"];

/// Date format used for `Session::date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One finished focus interval.
///
/// `id` is `None` until the store assigns one on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Store-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Focused seconds counted for this record.
    pub duration_seconds: u32,

    /// Activity label.
    pub category: String,

    /// Background excursions while running.
    pub distraction_count: u32,

    /// Local day the session ended, `YYYY-MM-DD`.
    pub date: String,
}

impl Session {
    /// Create an unsaved session record.
    #[must_use]
    pub fn new(
        duration_seconds: u32,
        category: &str,
        distraction_count: u32,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            duration_seconds,
            category: category.to_string(),
            distraction_count,
            date: date.into(),
        }
    }

    /// Check the record invariants.
    ///
    /// Durations and counts are unsigned, so only the category and date need
    /// checking here.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank category or a malformed date.
    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(Error::validation("session category must not be empty"));
        }
        validate_date(&self.date)
    }

    /// Same record with the identifier cleared.
    #[must_use]
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }
}

/// A user-defined category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique, case-sensitive name.
    pub name: String,

    /// When the name was first inserted.
    pub created_at: DateTime<Utc>,
}

/// Trim a category name and reject it if nothing is left.
///
/// # Errors
///
/// Returns `Error::Validation` if the trimmed name is empty.
pub fn normalize_category(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("category name must not be empty"));
    }
    Ok(trimmed)
}

/// Whether `name` is one of the built-in categories.
#[must_use]
pub fn is_default_category(name: &str) -> bool {
    DEFAULT_CATEGORIES.contains(&name)
}

/// Check that `date` is a real calendar day in exact `YYYY-MM-DD` form.
///
/// # Errors
///
/// Returns `Error::Validation` otherwise.
pub fn validate_date(date: &str) -> Result<()> {
    static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    let well_shaped = SHAPE
        .get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(date));

    if !well_shaped || NaiveDate::parse_from_str(date, DATE_FORMAT).is_err() {
        return Err(Error::validation(format!(
            "session date must be YYYY-MM-DD, got {date:?}"
        )));
    }
    Ok(())
}

/// Today's local date as a session date string.
#[must_use]
pub fn today() -> String {
    format_date(Local::now().date_naive())
}

/// Format a date the way sessions store it.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
