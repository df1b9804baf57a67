//! Calendar months and day stamps.
//!
//! Every conversion between month indexings goes through [`MonthKey`]:
//! views that count months from zero use [`MonthKey::from_zero_based`], the
//! availability endpoint receives [`MonthKey::wire_month`]. Every day string
//! that is compared against another one is built by [`DayStamp::from_date`].

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::constants::DAY_FORMAT;
use crate::error::{DaymarkError, DaymarkResult};

/// A calendar month. Stored as its first day, so a `MonthKey` is always a
/// valid month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    first: NaiveDate,
}

impl MonthKey {
    /// Build from a one-based month (1 = January).
    pub fn new(year: i32, month: u32) -> DaymarkResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(DaymarkError::InvalidMonth {
                month,
                expected: "1-12",
            });
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| MonthKey { first })
            .ok_or(DaymarkError::InvalidMonth {
                month,
                expected: "a representable year",
            })
    }

    /// Build from a zero-based month index (0 = January), the indexing most
    /// calendar views keep in memory.
    pub fn from_zero_based(year: i32, index: u32) -> DaymarkResult<Self> {
        if index > 11 {
            return Err(DaymarkError::InvalidMonth {
                month: index,
                expected: "0-11",
            });
        }
        Self::new(year, index + 1)
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// One-based month.
    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn zero_based_month(&self) -> u32 {
        self.first.month0()
    }

    /// Month as sent on the wire: one-based.
    pub fn wire_month(&self) -> u32 {
        self.month()
    }

    /// Query parameters for `GET /availability`.
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("year", self.year().to_string()),
            ("month", format!("{:02}", self.wire_month())),
        ]
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn days_in_month(&self) -> u32 {
        match self.first.checked_add_months(Months::new(1)) {
            Some(next) => (next - self.first).num_days() as u32,
            // Last representable month; chrono's calendar ends on Dec 31.
            None => 31,
        }
    }

    /// Day `day` of this month, if it exists.
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        self.first.with_day(day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// The following month. Saturates at the end of the representable range.
    pub fn next(&self) -> Self {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| MonthKey { first })
            .unwrap_or(*self)
    }

    /// The preceding month. Saturates at the start of the representable range.
    pub fn prev(&self) -> Self {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| MonthKey { first })
            .unwrap_or(*self)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = DaymarkError;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DaymarkError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month)
    }
}

/// A day in canonical `YYYY-MM-DD` form. Equality is string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DayStamp(String);

impl DayStamp {
    pub fn from_date(date: NaiveDate) -> Self {
        DayStamp(date.format(DAY_FORMAT).to_string())
    }

    /// Parse a day string from the outside world and re-render it in
    /// canonical form, so `2025-8-1` and `2025-08-01` end up equal.
    pub fn parse(s: &str) -> DaymarkResult<Self> {
        NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
            .map(Self::from_date)
            .map_err(|_| DaymarkError::InvalidDay(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, DAY_FORMAT).ok()
    }
}

impl fmt::Display for DayStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NaiveDate> for DayStamp {
    fn from(date: NaiveDate) -> Self {
        DayStamp::from_date(date)
    }
}
