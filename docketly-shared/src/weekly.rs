/// ISO week date ranges
///
/// Timesheets and invoices are grouped by ISO 8601 week: Monday to Sunday,
/// with week 1 being the week that contains the year's first Thursday. A
/// week that straddles New Year belongs to the ISO year of its Thursday, so
/// 2025-12-29 starts `2026-W01`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use docketly_shared::weekly::WeekRange;
///
/// let week = WeekRange::parse("2026-W42").unwrap();
/// assert_eq!(week.start, NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
/// assert_eq!(week.end, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
/// assert_eq!(week.label(), "2026-W42");
/// ```

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when a week specifier cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeekParseError {
    /// Not `YYYY-Www` or `YYYY-MM-DD`
    #[error("Unrecognised week format: {0} (expected YYYY-Www or YYYY-MM-DD)")]
    Format(String),

    /// Week number does not exist in that ISO year
    #[error("Week {week} does not exist in ISO year {year}")]
    NoSuchWeek { year: i32, week: u32 },
}

/// A Monday-to-Sunday ISO week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    /// Monday
    pub start: NaiveDate,

    /// Sunday
    pub end: NaiveDate,

    /// ISO week-numbering year
    pub iso_year: i32,

    /// ISO week number (1..=53)
    pub iso_week: u32,
}

impl WeekRange {
    /// Returns the ISO week containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        let iso = date.iso_week();

        Self {
            start,
            end: start + Duration::days(6),
            iso_year: iso.year(),
            iso_week: iso.week(),
        }
    }

    /// Returns the current ISO week (UTC)
    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    /// Builds the week from its ISO year and number
    pub fn from_iso(iso_year: i32, iso_week: u32) -> Result<Self, WeekParseError> {
        let start = NaiveDate::from_isoywd_opt(iso_year, iso_week, Weekday::Mon).ok_or(
            WeekParseError::NoSuchWeek {
                year: iso_year,
                week: iso_week,
            },
        )?;

        Ok(Self::containing(start))
    }

    /// Parses `YYYY-Www` (case-insensitive) or any `YYYY-MM-DD` inside the week
    pub fn parse(input: &str) -> Result<Self, WeekParseError> {
        let trimmed = input.trim();
        let upper = trimmed.to_ascii_uppercase();

        if let Some((year, week)) = upper.split_once("-W") {
            let year: i32 = year
                .parse()
                .map_err(|_| WeekParseError::Format(trimmed.to_string()))?;
            let week: u32 = week
                .parse()
                .map_err(|_| WeekParseError::Format(trimmed.to_string()))?;
            return Self::from_iso(year, week);
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self::containing)
            .map_err(|_| WeekParseError::Format(trimmed.to_string()))
    }

    /// Parses an optional specifier, falling back to the current week
    pub fn parse_or_current(input: Option<&str>) -> Result<Self, WeekParseError> {
        match input {
            Some(s) if !s.trim().is_empty() => Self::parse(s),
            _ => Ok(Self::current()),
        }
    }

    /// The week before this one
    pub fn previous(&self) -> Self {
        Self::containing(self.start - Duration::days(7))
    }

    /// The week after this one
    pub fn next(&self) -> Self {
        Self::containing(self.start + Duration::days(7))
    }

    /// Monday through Sunday
    pub fn days(&self) -> [NaiveDate; 7] {
        let mut days = [self.start; 7];
        for (offset, day) in days.iter_mut().enumerate() {
            *day = self.start + Duration::days(offset as i64);
        }
        days
    }

    /// Whether `date` falls inside the week
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// `YYYY-Www`
    pub fn label(&self) -> String {
        format!("{}-W{:02}", self.iso_year, self.iso_week)
    }

    /// Compact form used in invoice numbers: `YYYYWww`
    pub fn compact_label(&self) -> String {
        format!("{}W{:02}", self.iso_year, self.iso_week)
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} to {})", self.label(), self.start, self.end)
    }
}

/// The `n` weeks ending with the week that contains `anchor`, newest first
pub fn last_n_weeks(anchor: NaiveDate, n: usize) -> Vec<WeekRange> {
    let mut weeks = Vec::with_capacity(n);
    let mut week = WeekRange::containing(anchor);
    for _ in 0..n {
        weeks.push(week);
        week = week.previous();
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_containing_midweek() {
        let week = WeekRange::containing(date(2026, 10, 16));
        assert_eq!(week.start, date(2026, 10, 12));
        assert_eq!(week.end, date(2026, 10, 18));
        assert_eq!(week.iso_year, 2026);
        assert_eq!(week.iso_week, 42);
    }

    #[test]
    fn test_monday_and_sunday_map_to_same_week() {
        assert_eq!(
            WeekRange::containing(date(2026, 10, 12)),
            WeekRange::containing(date(2026, 10, 18))
        );
    }

    #[test]
    fn test_year_boundary_week_one() {
        // 2026-01-01 is a Thursday, so week 1 starts on Monday 2025-12-29
        let week = WeekRange::containing(date(2025, 12, 30));
        assert_eq!(week.iso_year, 2026);
        assert_eq!(week.iso_week, 1);
        assert_eq!(week.start, date(2025, 12, 29));
        assert_eq!(week.label(), "2026-W01");
    }

    #[test]
    fn test_week_53() {
        let week = WeekRange::containing(date(2021, 1, 1));
        assert_eq!(week.iso_year, 2020);
        assert_eq!(week.iso_week, 53);
        assert_eq!(week.start, date(2020, 12, 28));
        assert_eq!(week.end, date(2021, 1, 3));

        assert!(WeekRange::from_iso(2020, 53).is_ok());
        assert_eq!(
            WeekRange::from_iso(2021, 53),
            Err(WeekParseError::NoSuchWeek { year: 2021, week: 53 })
        );
    }

    #[test]
    fn test_parse_iso_label() {
        let week = WeekRange::parse("2026-w01").unwrap();
        assert_eq!(week.start, date(2025, 12, 29));
        assert_eq!(week.label(), "2026-W01");
        assert_eq!(week.compact_label(), "2026W01");
    }

    #[test]
    fn test_parse_date() {
        let week = WeekRange::parse(" 2026-10-14 ").unwrap();
        assert_eq!(week.start, date(2026, 10, 12));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(WeekRange::parse("next week"), Err(WeekParseError::Format(_))));
        assert!(matches!(WeekRange::parse("2026-Wxx"), Err(WeekParseError::Format(_))));
        assert!(matches!(
            WeekRange::parse("2026-W00"),
            Err(WeekParseError::NoSuchWeek { .. })
        ));
    }

    #[test]
    fn test_previous_and_next_cross_years() {
        let week = WeekRange::parse("2026-W01").unwrap();
        let previous = week.previous();
        assert_eq!(previous.iso_year, 2025);
        assert_eq!(previous.iso_week, 52);
        assert_eq!(previous.next(), week);
    }

    #[test]
    fn test_days_and_contains() {
        let week = WeekRange::parse("2026-W42").unwrap();
        let days = week.days();
        assert_eq!(days[0], date(2026, 10, 12));
        assert_eq!(days[6], date(2026, 10, 18));
        assert_eq!(days[0].weekday(), Weekday::Mon);
        assert_eq!(days[6].weekday(), Weekday::Sun);
        assert!(week.contains(date(2026, 10, 15)));
        assert!(!week.contains(date(2026, 10, 19)));
    }

    #[test]
    fn test_last_n_weeks() {
        let weeks = last_n_weeks(date(2026, 1, 7), 3);
        assert_eq!(weeks.len(), 3);
        assert_eq!(weeks[0].label(), "2026-W02");
        assert_eq!(weeks[1].label(), "2026-W01");
        assert_eq!(weeks[2].label(), "2025-W52");
    }
}
