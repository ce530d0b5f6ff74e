//! Reporting-period parsing
//!
//! Exports write the same month as `2024-01`, `202401`, `01/2024`,
//! `January 2024` or `Jan-24`. All forms parse into [`ReportingPeriod`] and
//! render back as one canonical string.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Share of sampled non-null cells that must parse for a column to be a
/// period column
pub const PERIOD_PARSE_RATIO: f64 = 0.8;

/// Maximum number of cells sampled per column
pub const PERIOD_SAMPLE_SIZE: usize = 200;

lazy_static! {
    static ref YEAR_PATTERN: Regex = Regex::new(r"^(\d{4})$").unwrap();
    static ref MONTH_PATTERN: Regex = Regex::new(r"^(\d{4})[-/]?(\d{2})$").unwrap();
    static ref DAY_PATTERN: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:[ T].*)?$").unwrap();
    static ref MONTH_FIRST_PATTERN: Regex = Regex::new(r"^(\d{1,2})[/-](\d{4})$").unwrap();
    static ref QUARTER_PATTERN: Regex = Regex::new(r"(?i)^(\d{4})[- ]?q([1-4])$").unwrap();
    static ref NAMED_MONTH_PATTERN: Regex =
        Regex::new(r"(?i)^([a-z]+)\.?[\s\-/,]*(\d{4}|\d{2})$").unwrap();
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportingPeriod {
    /// A whole year
    Year(i32),
    /// A month: year, month (1-12)
    Month(i32, u32),
    /// A quarter: year, quarter (1-4)
    Quarter(i32, u32),
}

impl ReportingPeriod {
    /// First day of the period
    #[must_use]
    pub fn start_date(&self) -> Option<NaiveDate> {
        match *self {
            Self::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
            Self::Month(year, month) => NaiveDate::from_ymd_opt(year, month, 1),
            Self::Quarter(year, quarter) => NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1),
        }
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Month(year, month) => write!(f, "{year}-{month:02}"),
            Self::Quarter(year, quarter) => write!(f, "{year}-Q{quarter}"),
        }
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let lowered = name.to_lowercase();
    if lowered.len() < 3 {
        return None;
    }
    let position = MONTH_NAMES
        .iter()
        .position(|month| month.starts_with(lowered.as_str()) || lowered.starts_with(month))?;
    u32::try_from(position + 1).ok()
}

fn plausible_year(year: i32) -> bool {
    (1990..=2100).contains(&year)
}

fn month(year: i32, month: u32) -> Option<ReportingPeriod> {
    (plausible_year(year) && (1..=12).contains(&month)).then_some(ReportingPeriod::Month(year, month))
}

impl FromStr for ReportingPeriod {
    type Err = String;

    /// Parse a period string
    ///
    /// Supported formats:
    /// - "2024" - Year
    /// - "2024-01", "202401", "2024/01" - Year and month
    /// - "2024-01-15" - Date (the month is kept)
    /// - "01/2024", "1-2024" - Month and year
    /// - "January 2024", "Jan-2024", "Jan 24" - Named month
    /// - "2024Q1", "2024-Q1" - Quarter
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("Invalid period format: {s}");
        let number = |text: &str| text.parse::<i32>().map_err(|e| e.to_string());

        let parsed = if let Some(caps) = YEAR_PATTERN.captures(s) {
            let year = number(&caps[1])?;
            plausible_year(year).then_some(Self::Year(year))
        } else if let Some(caps) = MONTH_PATTERN.captures(s) {
            month(number(&caps[1])?, number(&caps[2])?.unsigned_abs())
        } else if let Some(caps) = DAY_PATTERN.captures(s) {
            let date = NaiveDate::from_ymd_opt(
                number(&caps[1])?,
                number(&caps[2])?.unsigned_abs(),
                number(&caps[3])?.unsigned_abs(),
            );
            date.and_then(|d| month(d.year(), d.month()))
        } else if let Some(caps) = MONTH_FIRST_PATTERN.captures(s) {
            month(number(&caps[2])?, number(&caps[1])?.unsigned_abs())
        } else if let Some(caps) = QUARTER_PATTERN.captures(s) {
            let year = number(&caps[1])?;
            let quarter = number(&caps[2])?.unsigned_abs();
            plausible_year(year).then_some(Self::Quarter(year, quarter))
        } else if let Some(caps) = NAMED_MONTH_PATTERN.captures(s) {
            let year_text = &caps[2];
            let year = if year_text.len() == 2 {
                2000 + number(year_text)?
            } else {
                number(year_text)?
            };
            month_from_name(&caps[1]).and_then(|m| month(year, m))
        } else {
            None
        };

        parsed.ok_or_else(invalid)
    }
}

/// Whether enough sampled values parse as periods for a column to qualify
///
/// Blank values are ignored. An empty sample never qualifies.
pub fn is_period_like<'a>(values: impl IntoIterator<Item = &'a str>) -> bool {
    let (parsed, total) = values
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .take(PERIOD_SAMPLE_SIZE)
        .fold((0usize, 0usize), |(parsed, total), value| {
            (parsed + usize::from(value.parse::<ReportingPeriod>().is_ok()), total + 1)
        });
    total > 0 && parsed as f64 >= PERIOD_PARSE_RATIO * total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Option<String> {
        s.parse::<ReportingPeriod>().ok().map(|p| p.to_string())
    }

    #[test]
    fn test_month_forms_agree() {
        for form in ["2024-01", "202401", "2024/01", "01/2024", "1-2024", "2024-01-15",
            "January 2024", "Jan-2024", "jan 24", "Jan. 2024"]
        {
            assert_eq!(parse(form).as_deref(), Some("2024-01"), "{form}");
        }
    }

    #[test]
    fn test_year_and_quarter() {
        assert_eq!(parse("2023").as_deref(), Some("2023"));
        assert_eq!(parse("2023-Q3").as_deref(), Some("2023-Q3"));
        assert_eq!(parse("2023q1").as_deref(), Some("2023-Q1"));
    }

    #[test]
    fn test_rejects_non_periods() {
        assert_eq!(parse("2024-13"), None);
        assert_eq!(parse("Jimeta"), None);
        assert_eq!(parse("150"), None);
        assert_eq!(parse("Ma 2024"), None);
        assert_eq!(parse("12345"), None);
    }

    #[test]
    fn test_period_column_threshold() {
        assert!(is_period_like(["2024-01", "2024-02", "2024-03", "2024-04", "n/a"]));
        assert!(!is_period_like(["2024-01", "2024-02", "x", "y"]));
        assert!(!is_period_like(Vec::<&str>::new()));
        assert!(is_period_like(["Jan 2024", "", "  ", "Feb 2024"]));
    }

    #[test]
    fn test_start_date() {
        let q = ReportingPeriod::Quarter(2024, 2);
        assert_eq!(q.start_date(), NaiveDate::from_ymd_opt(2024, 4, 1));
    }
}
