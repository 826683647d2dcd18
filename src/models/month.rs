//! Calendar month used for budgets, summaries and trends

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month (e.g. "2025-03")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

/// Years a `Month` may name
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

impl Month {
    pub const MIN: Month = Month {
        year: MIN_YEAR,
        month: 1,
    };
    pub const MAX: Month = Month {
        year: MAX_YEAR,
        month: 12,
    };

    /// Create a month, returning `None` when `month` is not in 1..=12 or
    /// `year` is outside `MIN_YEAR..=MAX_YEAR`
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (MIN_YEAR..=MAX_YEAR).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing today's local date
    pub fn current() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Year and month pulled into the supported range
    fn clamped(&self) -> (i32, u32) {
        (
            self.year.clamp(MIN_YEAR, MAX_YEAR),
            self.month.clamp(1, 12),
        )
    }

    /// First day of the month
    pub fn start_date(&self) -> NaiveDate {
        let (year, month) = self.clamped();
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        let (year, month) = self.clamped();
        (28..=31)
            .rev()
            .find_map(|day| NaiveDate::from_ymd_opt(year, month, day))
            .unwrap_or_else(|| self.start_date())
    }

    pub fn days(&self) -> u32 {
        self.end_date().day()
    }

    /// Check if a date falls within this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year.saturating_add(1),
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year.saturating_sub(1),
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Months since year zero
    fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_index(index: i64) -> Option<Self> {
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
        Self::new(year, month)
    }

    /// The month `n` months before this one, `None` before `MIN_YEAR`
    pub fn checked_minus(&self, n: u32) -> Option<Self> {
        Self::from_index(self.index() - i64::from(n))
    }

    /// The month `n` months after this one, `None` past `MAX_YEAR`
    pub fn checked_plus(&self, n: u32) -> Option<Self> {
        Self::from_index(self.index() + i64::from(n))
    }

    /// The month `n` months before this one, stopping at [`Month::MIN`]
    pub fn minus(&self, n: u32) -> Self {
        self.checked_minus(n).unwrap_or(Self::MIN)
    }

    /// The month `n` months after this one, stopping at [`Month::MAX`]
    pub fn plus(&self, n: u32) -> Self {
        self.checked_plus(n).unwrap_or(Self::MAX)
    }

    /// Number of whole months from `self` to `other` (negative if `other` is earlier)
    pub fn months_until(&self, other: Month) -> i32 {
        let diff = other.index() - self.index();
        i32::try_from(diff).unwrap_or(if diff < 0 { i32::MIN } else { i32::MAX })
    }

    /// The last `n` months ending at (and including) this one, oldest first
    pub fn range_back(&self, n: u32) -> Vec<Month> {
        (0..n).rev().map(|i| self.minus(i)).collect()
    }

    /// Parse a month in `YYYY-MM` form
    pub fn parse(s: &str) -> Result<Self, MonthParseError> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| MonthParseError::InvalidFormat(s.to_string()))?;

        let year: i32 = year
            .parse()
            .map_err(|_| MonthParseError::InvalidFormat(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthParseError::InvalidFormat(s.to_string()))?;

        if !(1..=12).contains(&month) {
            return Err(MonthParseError::InvalidMonth(month));
        }
        Self::new(year, month).ok_or(MonthParseError::YearOutOfRange(year))
    }
}

impl Default for Month {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:04}-{:02}", self.year, self.month))
    }
}

impl FromStr for Month {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error type for month parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthParseError {
    InvalidFormat(String),
    InvalidMonth(u32),
    YearOutOfRange(i32),
}

impl fmt::Display for MonthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthParseError::InvalidFormat(s) => {
                write!(f, "Invalid month format (expected YYYY-MM): {}", s)
            }
            MonthParseError::InvalidMonth(m) => write!(f, "Invalid month: {}", m),
            MonthParseError::YearOutOfRange(y) => write!(
                f,
                "Year {} is outside {}..={}",
                y, MIN_YEAR, MAX_YEAR
            ),
        }
    }
}

impl std::error::Error for MonthParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    #[test]
    fn test_bounds() {
        let feb = month(2024, 2);
        assert_eq!(feb.start_date(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.end_date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb.days(), 29);
        assert_eq!(month(2025, 12).end_date(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_navigation() {
        assert_eq!(month(2024, 12).next(), month(2025, 1));
        assert_eq!(month(2025, 1).prev(), month(2024, 12));
        assert_eq!(month(2025, 3).minus(3), month(2024, 12));
        assert_eq!(month(2025, 3).minus(0), month(2025, 3));
        assert_eq!(month(2025, 3).minus(27), month(2022, 12));
        assert_eq!(month(2025, 11).plus(3), month(2026, 2));
        assert_eq!(month(2024, 11).months_until(month(2025, 2)), 3);
    }

    #[test]
    fn test_range_back() {
        let range = month(2025, 2).range_back(3);
        assert_eq!(range, vec![month(2024, 12), month(2025, 1), month(2025, 2)]);
        assert!(month(2025, 2).range_back(0).is_empty());
    }

    #[test]
    fn test_contains() {
        let jan = month(2025, 1);
        assert!(jan.contains(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()));
        assert!(!jan.contains(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Month::parse("2025-03").unwrap(), month(2025, 3));
        assert_eq!(" 2025-3 ".parse::<Month>().unwrap(), month(2025, 3));
        assert_eq!(Month::parse("2025-13"), Err(MonthParseError::InvalidMonth(13)));
        assert!(Month::parse("March").is_err());
        assert_eq!(month(2025, 3).to_string(), "2025-03");
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(
            Month::parse("300000-01"),
            Err(MonthParseError::YearOutOfRange(300000))
        );
        assert!(Month::parse("0-06").is_err());
        assert!(Month::new(10_000, 1).is_none());
        assert_eq!(Month::parse("9999-12").unwrap(), Month::MAX);

        assert_eq!(Month::MAX.checked_plus(1), None);
        assert_eq!(Month::MIN.checked_minus(1), None);
        assert_eq!(Month::MAX.plus(u32::MAX), Month::MAX);
        assert_eq!(month(2025, 3).minus(u32::MAX), Month::MIN);
        assert_eq!(month(2025, 3).checked_plus(u32::MAX), None);
    }

    #[test]
    fn test_dates_are_total_for_any_fields() {
        // Fields are public and deserialized as-is
        let far = Month {
            year: 300_000,
            month: 1,
        };
        assert_eq!(far.start_date(), NaiveDate::from_ymd_opt(9999, 1, 1).unwrap());
        assert_eq!(far.end_date(), NaiveDate::from_ymd_opt(9999, 1, 31).unwrap());
        assert_eq!(Month::MAX.end_date(), NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());

        let odd = Month {
            year: i32::MAX,
            month: 12,
        };
        assert_eq!(odd.next().year, i32::MAX);
        assert_eq!(odd.days(), 31);
    }

    #[test]
    fn test_ordering() {
        assert!(month(2024, 12) < month(2025, 1));
        assert!(month(2025, 2) > month(2025, 1));
    }
}
