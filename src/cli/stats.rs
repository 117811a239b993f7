//! Stats command: focus totals, the last seven days, and time per category.

use crate::config::Config;
use crate::core::report::{
    CategoryTotal, DayTotal, Summary, by_category, format_duration, summarize, weekly_minutes,
};
use crate::core::session::format_date;
use crate::error::Result;
use crate::storage::SessionStore;
use chrono::{Local, NaiveDate};
use serde::Serialize;

/// Width of the longest weekly bar.
const BAR_WIDTH: u64 = 30;

/// Everything the stats screen shows.
#[derive(Debug, Serialize)]
struct Dashboard {
    summary: Summary,
    week: Vec<DayTotal>,
    categories: Vec<CategoryTotal>,
}

impl Dashboard {
    fn build(store: &dyn SessionStore, today: NaiveDate) -> Result<Self> {
        let sessions = store.fetch_all_sessions()?;
        Ok(Self {
            summary: summarize(&sessions, &format_date(today)),
            week: weekly_minutes(&sessions, today),
            categories: by_category(&sessions),
        })
    }
}

/// Run the stats command.
///
/// # Errors
///
/// Returns an error if storage operations fail.
pub fn run(config: &Config, json: bool) -> Result<()> {
    let store = super::open_store(config)?;
    let dashboard = Dashboard::build(store.as_ref(), Local::now().date_naive())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    if dashboard.summary.session_count == 0 {
        println!("No sessions recorded yet.");
        return Ok(());
    }

    render_summary(&dashboard.summary);
    render_week(&dashboard.week);
    render_categories(&dashboard.categories);

    Ok(())
}

fn render_summary(summary: &Summary) {
    println!("Focus Summary:");
    println!("{}", "─".repeat(40));
    println!("  Today:        {:>10}", format_duration(summary.today_seconds));
    println!(
        "  All time:     {:>10}",
        format_duration(summary.all_time_seconds)
    );
    println!("  Sessions:     {:>10}", summary.session_count);
    println!("  Distractions: {:>10}", summary.total_distractions);
}

fn render_week(week: &[DayTotal]) {
    println!("\nLast 7 Days (minutes):");
    println!("{}", "─".repeat(40));
    let peak = week.iter().map(|d| d.minutes).max().unwrap_or(0);
    for day in week {
        println!(
            "  {} {:>5}  {}",
            day.label,
            day.minutes,
            bar(day.minutes, peak)
        );
    }
}

fn render_categories(categories: &[CategoryTotal]) {
    if categories.is_empty() {
        return;
    }
    println!("\nBy Category:");
    println!("{}", "─".repeat(40));
    for total in categories {
        println!(
            "  {:<20} {:>10}",
            total.category,
            format_duration(total.seconds)
        );
    }
}

/// Bar scaled against the busiest day.
fn bar(minutes: u64, peak: u64) -> String {
    if peak == 0 {
        return String::new();
    }
    let len = usize::try_from(minutes * BAR_WIDTH / peak).unwrap_or(0);
    "█".repeat(len)
}
