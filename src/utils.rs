use chrono::{Days, NaiveDate};
use colored::Colorize;

use crate::error::{PolicyError, Result};
use crate::returns::Decision;

/// Colored one-line verdict for a decision.
pub fn format_decision(decision: &Decision) -> String {
    if decision.is_eligible() {
        decision.summary().green().to_string()
    } else {
        decision.summary().red().to_string()
    }
}

/// The date `days` before `today`, rejecting offsets past the calendar's start.
pub fn days_before(today: NaiveDate, days: u32) -> Result<NaiveDate> {
    today.checked_sub_days(Days::new(u64::from(days))).ok_or_else(|| {
        PolicyError::InvalidRequest(format!("{} days before {} is out of range", days, today))
    })
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Shorten long text for table cells
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&format!("{:<width$}  ", col, width = width));
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("bank transfer", 20), "bank transfer");
        assert_eq!(truncate("3–5 days after bank details received", 10), "3–5 day...");
    }

    #[test]
    fn test_days_before() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        assert_eq!(days_before(today, 9).unwrap(), NaiveDate::from_ymd_opt(2024, 6, 11).unwrap());
        assert!(matches!(days_before(today, u32::MAX), Err(PolicyError::InvalidRequest(_))));
    }
}
