//! Read-only summaries over stored sessions.

use crate::core::session::{Session, format_date};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

/// Headline totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Focused seconds recorded today.
    pub today_seconds: u64,
    /// Focused seconds across all sessions.
    pub all_time_seconds: u64,
    /// Distractions across all sessions.
    pub total_distractions: u64,
    /// Number of sessions.
    pub session_count: usize,
}

/// Whole minutes focused on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Short weekday name, e.g. `Mon`.
    pub label: String,
    /// Whole minutes, rounded down.
    pub minutes: u64,
}

/// Seconds focused under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// Category name.
    pub category: String,
    /// Total seconds.
    pub seconds: u64,
}

/// Totals for today and all time.
#[must_use]
pub fn summarize(sessions: &[Session], today: &str) -> Summary {
    sessions.iter().fold(Summary::default(), |mut acc, s| {
        let duration = u64::from(s.duration_seconds);
        acc.all_time_seconds += duration;
        if s.date == today {
            acc.today_seconds += duration;
        }
        acc.total_distractions += u64::from(s.distraction_count);
        acc.session_count += 1;
        acc
    })
}

/// The seven days ending on `today`, oldest first.
#[must_use]
pub fn weekly_minutes(sessions: &[Session], today: NaiveDate) -> Vec<DayTotal> {
    (0..7i64)
        .rev()
        .map(|days_back| {
            let day = today - Duration::days(days_back);
            let date = format_date(day);
            let seconds: u64 = sessions
                .iter()
                .filter(|s| s.date == date)
                .map(|s| u64::from(s.duration_seconds))
                .sum();
            DayTotal {
                label: day.format("%a").to_string(),
                date,
                minutes: seconds / 60,
            }
        })
        .collect()
}

/// Seconds per category, largest first. Categories with no time are left out.
#[must_use]
pub fn by_category(sessions: &[Session]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for s in sessions {
        *totals.entry(s.category.as_str()).or_default() += u64::from(s.duration_seconds);
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .filter(|(_, seconds)| *seconds > 0)
        .map(|(category, seconds)| CategoryTotal {
            category: category.to_string(),
            seconds,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.seconds
            .cmp(&a.seconds)
            .then_with(|| a.category.cmp(&b.category))
    });
    totals
}

/// `MM:SS` countdown display.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// `1h 5m` or `5m`.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
